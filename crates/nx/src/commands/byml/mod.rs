use std::{fs::File, path::Path};

use miette::{Context, IntoDiagnostic, Result};
use nx_byml::{Document, ReaderOptions};
use tracing::info;

pub mod convert;
pub mod diff;
pub mod from_json;
pub mod info;
pub mod to_json;

#[derive(clap::Subcommand)]
pub enum BymlCommands {
    /// Compare two BYML files
    Diff(diff::DiffArgs),
    /// Rewrite a BYML file with another version or byte order
    Convert(convert::ConvertArgs),
    /// Create a BYML file from its JSON form
    FromJson(from_json::FromJsonArgs),
    /// Summarize the contents of a BYML file
    Info(info::InfoArgs),
    /// Dump a BYML file as JSON
    ToJson(to_json::ToJsonArgs),
}

impl BymlCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            BymlCommands::Diff(diff) => diff.handle(),
            BymlCommands::Convert(convert) => convert.handle(),
            BymlCommands::FromJson(from_json) => from_json.handle(),
            BymlCommands::Info(info) => info.handle(),
            BymlCommands::ToJson(to_json) => to_json.handle(),
        }
    }
}

fn read_document(path: &Path, support_paths: bool) -> Result<Document> {
    let f = File::open(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))?;

    let document = Document::from_reader(
        f,
        ReaderOptions::builder().support_paths(support_paths).build(),
    )
    .context(format!("reading {}", path.display()))?;
    Ok(document)
}

fn create_output(path: &Path, overwrite: bool) -> Result<File> {
    info!("writing {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .context(format!("creating {}", parent.display()))?;
    }

    if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    }
}
