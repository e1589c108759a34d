//! Common types for eks-bootstrap: configuration, errors, and telemetry

#![deny(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;

pub use config::{
    ContextDocument, EnvironmentConfig, NetworkSource, RawEnvironment, VersionValue,
};
pub use context::{SynthContext, APP_TAG, ENVIRONMENT_TAG, STACK_NAME};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
