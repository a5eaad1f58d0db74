//! Command-line argument definitions for deployhook.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for deployhook.
#[derive(Debug, Parser)]
#[command(name = "deployhook")]
#[command(
    author,
    version,
    about = "Deployment webhook that pulls private-registry images and restarts containers"
)]
pub struct Cli {
    /// Subcommand to execute. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine socket path or URL.
    #[arg(long, global = true)]
    pub engine_socket: Option<String>,

    /// Registry hostname images must come from.
    #[arg(long, global = true)]
    pub registry: Option<String>,

    /// Address the webhook listens on.
    #[arg(long, global = true)]
    pub listen: Option<String>,
}

impl Cli {
    /// The requested subcommand, `serve` when none was given.
    #[must_use]
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Available subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the deploy webhook HTTP server.
    Serve,

    /// Deploy once from a JSON request file and exit.
    Deploy(DeployArgs),
}

/// Arguments for the `deploy` subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
pub struct DeployArgs {
    /// JSON file in the webhook request format.
    #[arg(long, required = true)]
    pub spec: Utf8PathBuf,
}
