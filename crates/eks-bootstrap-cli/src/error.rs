//! Error types for the CLI

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Bootstrap(#[from] eks_bootstrap_common::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the environment selector was missing
    pub fn is_configuration_missing(&self) -> bool {
        matches!(self, Error::Bootstrap(e) if e.is_configuration_missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_missing_is_detected_through_wrapper() {
        let err: Error = eks_bootstrap_common::Error::configuration_missing("no env").into();
        assert!(err.is_configuration_missing());

        let err: Error = eks_bootstrap_common::Error::environment_not_found("qa").into();
        assert!(!err.is_configuration_missing());
        assert_eq!(
            err.to_string(),
            "environment 'qa' not found in configuration source"
        );
    }
}
