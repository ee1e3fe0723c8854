use clap::{Args, ValueEnum};
use miette::{IntoDiagnostic, Result};
use nx_byml::Endianness;
use std::{io::Write, path::PathBuf};
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ByteOrder {
    Big,
    Little,
}

impl From<ByteOrder> for Endianness {
    fn from(value: ByteOrder) -> Self {
        match value {
            ByteOrder::Big => Endianness::Big,
            ByteOrder::Little => Endianness::Little,
        }
    }
}

#[derive(Args)]
pub struct ConvertArgs {
    /// An input BYML file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target BYML file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Version to write, the input version if omitted
    #[arg(long, value_name = "VERSION")]
    version: Option<u16>,

    /// Byte order to write, the input byte order if omitted
    #[arg(long, value_enum)]
    endianness: Option<ByteOrder>,

    /// The input carries a path table
    #[arg(long, default_value_t = false)]
    support_paths: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ConvertArgs {
    pub fn handle(&self) -> Result<()> {
        let mut document = super::read_document(&self.file, self.support_paths)?;

        if let Some(version) = self.version {
            document.set_version(version)?;
        }
        if let Some(endianness) = self.endianness {
            document.set_endianness(endianness.into());
        }
        info!(
            version = document.version(),
            endianness = %document.endianness(),
            "converting"
        );

        let bytes = document.to_binary()?;
        let mut out = super::create_output(&self.output, self.overwrite)?;
        out.write_all(&bytes).into_diagnostic()?;
        Ok(())
    }
}
