use clap::Args;
use miette::Result;
use nx_byml::{Node, NodeType};
use owo_colors::OwoColorize;
use std::{collections::HashMap, path::PathBuf};

#[derive(Args)]
pub struct InfoArgs {
    /// An input BYML file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// The input carries a path table
    #[arg(long, default_value_t = false)]
    support_paths: bool,
}

#[derive(Debug, Default)]
struct Summary {
    counts: HashMap<NodeType, usize>,
    depth: usize,
}

impl Summary {
    fn collect(root: &Node) -> Summary {
        let mut summary = Summary::default();
        let mut stack = vec![(root, 1)];
        while let Some((node, depth)) = stack.pop() {
            *summary.counts.entry(node.node_type()).or_default() += 1;
            summary.depth = summary.depth.max(depth);

            match node {
                Node::Array(items) => stack.extend(items.iter().map(|n| (n, depth + 1))),
                Node::Dictionary(map) => stack.extend(map.values().map(|n| (n, depth + 1))),
                _ => {}
            }
        }
        summary
    }
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let document = super::read_document(&self.file, self.support_paths)?;
        let summary = Summary::collect(document.root());

        println!("{}", self.file.display().bold());
        println!("  {:<12} {}", "version", document.version());
        println!("  {:<12} {}", "byte order", document.endianness());
        println!("  {:<12} {}", "paths", document.supports_paths());
        println!("  {:<12} {}", "root", document.root().node_type());
        println!("  {:<12} {}", "depth", summary.depth);

        let mut counts = summary.counts.into_iter().collect::<Vec<_>>();
        counts.sort_by_key(|(node_type, _)| node_type.to_string());

        println!("{}", "nodes".bold());
        for (node_type, count) in counts {
            println!("  {:<12} {}", node_type.to_string(), count.cyan());
        }
        Ok(())
    }
}
