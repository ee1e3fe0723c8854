use clap::{Args, ValueEnum};
use miette::Result;
use nx_byml::{Document, Node};
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use std::{fmt::Display, path::PathBuf};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    /// Compare the trees value by value
    #[default]
    Semantic,
    /// Also compare format metadata and show a line diff of the JSON form
    Full,
}

#[derive(Debug, PartialEq)]
enum Change {
    Added(String, String),
    Removed(String, String),
    Modified(String, String, String),
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Added(path, v) => writeln!(f, "✅ {}: {}", path, v.green()),
            Change::Removed(path, v) => writeln!(f, "❌ {}: {}", path, v.red()),
            Change::Modified(path, old, new) => {
                writeln!(f, "🔃 {}: {} vs {}", path, old.red(), new.green())
            }
        }
    }
}

/// Short, single line rendering of a node
fn describe(node: &Node) -> String {
    match node {
        Node::String(v) => format!("{v:?}"),
        Node::Bool(v) => v.to_string(),
        Node::Int32(v) => format!("{v} ({})", node.node_type()),
        Node::UInt32(v) => format!("{v} ({})", node.node_type()),
        Node::Float32(v) => format!("{v} ({})", node.node_type()),
        Node::Int64(v) => format!("{v} ({})", node.node_type()),
        Node::UInt64(v) => format!("{v} ({})", node.node_type()),
        Node::Double(v) => format!("{v} ({})", node.node_type()),
        Node::Null => "null".into(),
        Node::Binary(v) => format!("{} bytes of binary", v.len()),
        Node::Path(v) => format!("path of {} points", v.len()),
        Node::Array(v) => format!("array of {}", v.len()),
        Node::Dictionary(v) => format!("dictionary of {}", v.len()),
    }
}

fn compare(path: &str, left: &Node, right: &Node, changes: &mut Vec<Change>) {
    match (left, right) {
        (Node::Dictionary(l), Node::Dictionary(r)) => {
            let mut keys = l
                .keys()
                .chain(r.keys().filter(|k| !l.contains_key(*k)))
                .collect::<Vec<_>>();
            keys.sort();

            for key in keys {
                let child = format!("{path}/{key}");
                match (l.get(key), r.get(key)) {
                    (Some(a), Some(b)) => compare(&child, a, b, changes),
                    (None, Some(b)) => changes.push(Change::Added(child, describe(b))),
                    (Some(a), None) => changes.push(Change::Removed(child, describe(a))),
                    (None, None) => {}
                }
            }
        }
        (Node::Array(l), Node::Array(r)) => {
            for i in 0..l.len().max(r.len()) {
                let child = format!("{path}/{i}");
                match (l.get(i), r.get(i)) {
                    (Some(a), Some(b)) => compare(&child, a, b, changes),
                    (None, Some(b)) => changes.push(Change::Added(child, describe(b))),
                    (Some(a), None) => changes.push(Change::Removed(child, describe(a))),
                    (None, None) => {}
                }
            }
        }
        _ if left != right => changes.push(Change::Modified(
            path.to_string(),
            describe(left),
            describe(right),
        )),
        _ => {}
    }
}

#[derive(Args)]
pub struct DiffArgs {
    /// An input BYML file
    #[arg(short, long, value_name = "FILE")]
    left: PathBuf,

    /// An input BYML file
    #[arg(short, long, value_name = "FILE")]
    right: PathBuf,

    /// Both inputs carry a path table
    #[arg(long, default_value_t = false)]
    support_paths: bool,

    /// Comparison mode
    #[arg(short, long, value_enum, default_value_t=Mode::Semantic)]
    mode: Mode,
}

impl DiffArgs {
    fn metadata(&self, left: &Document, right: &Document) -> Vec<Change> {
        let mut changes = Vec::new();
        if left.version() != right.version() {
            changes.push(Change::Modified(
                "version".into(),
                left.version().to_string(),
                right.version().to_string(),
            ));
        }
        if left.endianness() != right.endianness() {
            changes.push(Change::Modified(
                "byte order".into(),
                left.endianness().to_string(),
                right.endianness().to_string(),
            ));
        }
        changes
    }

    fn json_diff(&self, left: &Document, right: &Document) -> Result<Vec<String>> {
        let old = left.to_json()?;
        let new = right.to_json()?;

        let diff = TextDiff::from_lines(&old, &new);
        let mut lines = Vec::new();
        for group in diff.grouped_ops(2) {
            for op in group {
                for change in diff.iter_inline_changes(&op) {
                    let mut line = match change.tag() {
                        ChangeTag::Delete => format!("{}", "-".red()),
                        ChangeTag::Insert => format!("{}", "+".green()),
                        ChangeTag::Equal => " ".to_string(),
                    };
                    for (emphasized, value) in change.iter_strings_lossy() {
                        let value = value.trim_end_matches('\n');
                        if emphasized {
                            if change.tag() == ChangeTag::Insert {
                                line.push_str(&format!("{}", value.green().underline()));
                            } else {
                                line.push_str(&format!("{}", value.red().underline()));
                            }
                        } else {
                            line.push_str(&format!("{}", value.dimmed()));
                        }
                    }
                    lines.push(line);
                }
            }
        }
        Ok(lines)
    }

    pub fn handle(&self) -> Result<()> {
        let left = super::read_document(&self.left, self.support_paths)?;
        let right = super::read_document(&self.right, self.support_paths)?;

        let mut changes = Vec::new();
        if self.mode == Mode::Full {
            changes.extend(self.metadata(&left, &right));
        }
        compare("", left.root(), right.root(), &mut changes);

        for change in &changes {
            print!("{}", change);
        }

        if self.mode == Mode::Full {
            for line in self.json_diff(&left, &right)? {
                println!("{}", line);
            }
        }
        Ok(())
    }
}
