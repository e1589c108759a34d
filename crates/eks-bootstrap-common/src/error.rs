//! Error types for topology synthesis
//!
//! Errors are structured with fields to aid diagnosis. Each variant carries
//! the context needed to fix the input (environment name, field path, lookup
//! keys). No variant is recovered locally: any error invalidates the whole
//! resource graph and aborts synthesis before anything is provisioned.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for eks-bootstrap operations
#[derive(Debug, Error)]
pub enum Error {
    /// No environment was selected
    #[error("configuration missing: {message}")]
    ConfigurationMissing {
        /// What was expected and how to provide it
        message: String,
    },

    /// The selected environment has no entry in the configuration source
    #[error("environment '{environment}' not found in configuration source")]
    EnvironmentNotFound {
        /// Name of the environment that was requested
        environment: String,
    },

    /// Configuration or builder input violates an invariant
    #[error("validation error for {environment}: {message}")]
    Validation {
        /// Environment being resolved
        environment: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field (e.g., "vpcCidr")
        field: Option<String>,
    },

    /// Existing network could not be resolved by the provisioning engine
    #[error("network '{vpc_id}' not found in region {region}")]
    NetworkNotFound {
        /// Region the lookup was keyed on
        region: String,
        /// Network identifier that failed to resolve
        vpc_id: String,
    },

    /// Admin principal could not be resolved by the identity collaborator
    #[error("principal '{principal}' not found")]
    PrincipalNotFound {
        /// Principal name that failed to resolve
        principal: String,
    },

    /// Configuration or lookup file could not be read or parsed
    #[error("failed to load {path}: {message}")]
    ConfigSource {
        /// Path of the file
        path: String,
        /// Underlying cause
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The document kind being serialized (if known)
        kind: Option<String>,
    },

    /// The provisioning engine rejected a declaration
    #[error("engine error [{resource}]: {message}")]
    Engine {
        /// Logical id of the resource being declared
        resource: String,
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a configuration-missing error
    pub fn configuration_missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            message: msg.into(),
        }
    }

    /// Create an environment-not-found error
    pub fn environment_not_found(environment: impl Into<String>) -> Self {
        Self::EnvironmentNotFound {
            environment: environment.into(),
        }
    }

    /// Create a validation error with the given message
    ///
    /// For validation errors raised outside environment resolution.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            environment: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with environment context and field path
    pub fn validation_for_field(
        environment: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            environment: environment.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a network-not-found error
    pub fn network_not_found(region: impl Into<String>, vpc_id: impl Into<String>) -> Self {
        Self::NetworkNotFound {
            region: region.into(),
            vpc_id: vpc_id.into(),
        }
    }

    /// Create a principal-not-found error
    pub fn principal_not_found(principal: impl Into<String>) -> Self {
        Self::PrincipalNotFound {
            principal: principal.into(),
        }
    }

    /// Create a config-source error
    pub fn config_source(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ConfigSource {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error for a specific document kind
    pub fn serialization_for(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an engine error for a resource
    pub fn engine(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Engine {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Whether this error means no environment was selected
    pub fn is_configuration_missing(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }

    /// The field path attached to a validation error, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_field_path() {
        let err = Error::validation_for_field("dev", "vpcCidr", "required when createVpc is true");
        assert_eq!(err.field(), Some("vpcCidr"));
        assert_eq!(
            err.to_string(),
            "validation error for dev: required when createVpc is true"
        );
    }

    #[test]
    fn plain_validation_uses_unknown_context() {
        let err = Error::validation("bad input");
        assert!(err.to_string().contains(UNKNOWN_CONTEXT));
        assert!(err.field().is_none());
    }

    #[test]
    fn network_not_found_names_lookup_keys() {
        let err = Error::network_not_found("us-east-1", "vpc-123");
        let msg = err.to_string();
        assert!(msg.contains("vpc-123"));
        assert!(msg.contains("us-east-1"));
    }

    #[test]
    fn only_missing_selector_reports_configuration_missing() {
        assert!(Error::configuration_missing("x").is_configuration_missing());
        assert!(!Error::environment_not_found("x").is_configuration_missing());
    }

    #[test]
    fn json_errors_convert_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization { kind: None, .. }));
    }
}
