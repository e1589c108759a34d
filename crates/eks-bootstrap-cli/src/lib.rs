//! eks-bootstrap CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// eks-bootstrap - Synthesize an EKS cluster topology from environment config
#[derive(Parser, Debug)]
#[command(name = "eks-bootstrap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "EKS_BOOTSTRAP_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an environment and emit the resource assembly
    Synth(commands::synth::SynthArgs),
    /// List environments in a context file
    Envs(commands::envs::EnvsArgs),
    /// Print the JSON schema of an environment entry
    Schema,
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Synth(args) => commands::synth::run(args).await,
            Commands::Envs(args) => commands::envs::run(args),
            Commands::Schema => commands::schema::run(),
        }
    }
}
