use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use nx_byml::Document;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct FromJsonArgs {
    /// An input JSON file, as written by `to-json`
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target BYML file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl FromJsonArgs {
    pub fn handle(&self) -> Result<()> {
        let json = std::fs::read_to_string(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let document = Document::from_json(&json)?;
        info!(
            version = document.version(),
            endianness = %document.endianness(),
            "parsed document"
        );

        let out = super::create_output(&self.output, self.overwrite)?;
        document.write_to(out)?;
        Ok(())
    }
}
