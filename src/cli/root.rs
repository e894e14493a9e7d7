use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::{SchemaCommand, SimulateCommand};

/// Modals - single-active dialog orchestration
#[derive(Parser)]
#[command(
    name = "modals",
    version,
    about = "Replay dialog interactions against markup and settings",
    long_about = r#"Modals keeps at most one markup-declared dialog visible and sequences
open/close transitions, scroll suppression and focus containment around
configurable delays.

Examples:
  modals simulate -m page.html script.json          # Replay on virtual time
  modals simulate -m page.html -s modals.json s.json
  modals schema --pretty                            # Print the settings schema
  modals schema validate modals.json"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scripted sequence of clicks, keys and programmatic calls
    Simulate(SimulateCommand),
    /// Generate or validate the settings schema
    Schema(SchemaCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        match self.command {
            Commands::Simulate(cmd) => cmd.execute().await,
            Commands::Schema(cmd) => cmd.execute().await,
        }
    }
}
