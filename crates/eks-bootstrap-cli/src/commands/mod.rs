//! CLI commands

use clap::ValueEnum;

pub mod envs;
pub mod schema;
pub mod synth;

/// Context file read when `--context` is not given
pub const DEFAULT_CONTEXT_FILE: &str = "cdk.context.json";

/// Output format for rendered documents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// YAML
    Yaml,
}
