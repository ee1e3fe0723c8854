pub mod byml;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle BYML files
    Byml {
        #[command(subcommand)]
        command: byml::BymlCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Byml { command } => command.handle(),
        }
    }
}
