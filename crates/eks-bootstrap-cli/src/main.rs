//! eks-bootstrap CLI
//!
//! Synthesizes the EKS bootstrap topology for one environment.

use clap::Parser;
use tracing::error;

use eks_bootstrap_cli::{Cli, Result};
use eks_bootstrap_common::telemetry::{init_telemetry, TelemetryConfig};

/// Exit status when no environment was selected
const EXIT_CONFIGURATION_MISSING: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_telemetry(TelemetryConfig {
        json: cli.log_json,
        ..Default::default()
    }) {
        eprintln!("failed to initialize logging: {e}");
    }

    match cli.run().await {
        Err(e) if e.is_configuration_missing() => {
            eprintln!("error: {e}");
            std::process::exit(EXIT_CONFIGURATION_MISSING);
        }
        Err(e) => {
            error!(error = %e, "command failed");
            Err(e)
        }
        Ok(()) => Ok(()),
    }
}
