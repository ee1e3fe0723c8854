use clap::Args;
use miette::{IntoDiagnostic, Result};
use std::{io::Write, path::PathBuf};

#[derive(Args)]
pub struct ToJsonArgs {
    /// An input BYML file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Where to write the JSON, standard output if omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// The input carries a path table
    #[arg(long, default_value_t = false)]
    support_paths: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ToJsonArgs {
    pub fn handle(&self) -> Result<()> {
        let document = super::read_document(&self.file, self.support_paths)?;
        let json = document.to_json()?;

        match &self.output {
            Some(path) => {
                let mut out = super::create_output(path, self.overwrite)?;
                writeln!(out, "{}", json).into_diagnostic()?;
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}
