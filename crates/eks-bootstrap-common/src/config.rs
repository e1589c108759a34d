//! Environment configuration resolution
//!
//! The configuration source is a JSON document keyed first by environment
//! name, then by parameter name (the `cdk.context.json` shape):
//!
//! ```json
//! {
//!   "dev": {
//!     "region": "us-east-1",
//!     "appName": "demo",
//!     "accountId": "123456789012",
//!     "env": "dev",
//!     "iamUser": "admin",
//!     "ec2SSHKey": "demo-key",
//!     "createVpc": true,
//!     "vpcCidr": "10.0.0.0/16"
//!   }
//! }
//! ```
//!
//! A `cdk.json`-style document with a top-level `"context"` object is also
//! accepted. Resolution happens once, before any resource is declared.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Control-plane version used when `k8sVersion` is absent
pub const DEFAULT_K8S_VERSION: &str = "1.23";

/// Ingress-controller version used when `albVersion` is absent
pub const DEFAULT_ALB_VERSION: &str = "2.4.1";

/// Key under which a `cdk.json`-style document nests its environments
const NESTED_CONTEXT_KEY: &str = "context";

/// Boolean flag that tolerates the string forms `"true"` / `"false"`
///
/// Context values passed on the command line arrive as strings, so
/// `createVpc` may be either a JSON boolean or its string spelling.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum Flag {
    /// Native JSON boolean
    Bool(bool),
    /// String spelling of a boolean
    Text(String),
}

impl Flag {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Flag::Bool(b) => Some(*b),
            Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" | "" => Some(false),
                _ => None,
            },
        }
    }
}

/// Version pin that tolerates an unquoted numeric value
///
/// `"k8sVersion": 1.27` and `"k8sVersion": "1.27"` resolve alike. Numbers go
/// through JSON number formatting, so `1.30` reads back as `"1.3"`; quote
/// versions with trailing zeros.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum VersionValue {
    /// Quoted version string
    Text(String),
    /// Bare JSON number
    Number(serde_json::Number),
}

impl VersionValue {
    fn into_string(self) -> String {
        match self {
            VersionValue::Text(s) => s,
            VersionValue::Number(n) => n.to_string(),
        }
    }
}

/// One environment's parameters exactly as they appear in the source
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvironment {
    /// Region to deploy into (e.g., "us-east-1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Existing VPC to look up when `createVpc` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    /// Whether to create a new VPC (default: false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_vpc: Option<Flag>,

    /// Application name, used as the prefix for every resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// CIDR block for a newly created VPC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_cidr: Option<String>,

    /// Account to deploy into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Environment name used for tagging (defaults to the selector)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    /// IAM user mapped into the cluster administrators group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_user: Option<String>,

    /// EC2 key pair used for node remote access
    #[serde(
        default,
        rename = "ec2SSHKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub ec2_ssh_key: Option<String>,

    /// Control-plane version (default: "1.23")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s_version: Option<VersionValue>,

    /// Ingress-controller version (default: "2.4.1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alb_version: Option<VersionValue>,
}

/// Where the cluster network comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkSource {
    /// Declare a new VPC with the given CIDR
    Create {
        /// CIDR block for the new VPC
        cidr: String,
    },
    /// Look up an existing VPC by identifier
    Existing {
        /// VPC identifier
        vpc_id: String,
    },
}

/// Resolved, immutable configuration for one environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Region to deploy into
    pub region: String,
    /// Application name (resource name prefix)
    pub app_name: String,
    /// Account to deploy into
    pub account_id: String,
    /// Environment name used for tagging
    pub env: String,
    /// IAM user bound to the cluster administrators group
    pub iam_user: String,
    /// EC2 key pair for node remote access
    pub ec2_ssh_key: String,
    /// Network creation or lookup
    pub network: NetworkSource,
    /// Control-plane version
    pub k8s_version: String,
    /// Ingress-controller version
    pub alb_version: String,
}

impl EnvironmentConfig {
    /// Resolve the named environment from the configuration source
    ///
    /// Fails with `ConfigurationMissing` when no selector is given and with
    /// `EnvironmentNotFound` when the source has no entry for it.
    pub fn resolve(selector: Option<&str>, source: &ContextDocument) -> Result<Self> {
        let name = selector
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::configuration_missing(
                    "environment selector 'env' is required, e.g. --env dev",
                )
            })?;

        let node = source
            .environment(name)
            .filter(|node| !node.is_null())
            .ok_or_else(|| Error::environment_not_found(name))?;

        if !node.is_object() {
            return Err(Error::validation_for_field(
                name,
                name,
                "environment entry must be an object of parameters",
            ));
        }

        let raw: RawEnvironment = serde_json::from_value(node.clone()).map_err(|e| {
            Error::validation_for_field(name, name, format!("invalid parameters: {e}"))
        })?;

        Self::from_raw(name, raw)
    }

    /// Build a configuration from raw parameters, filling defaults and
    /// enforcing invariants
    pub fn from_raw(name: &str, raw: RawEnvironment) -> Result<Self> {
        let required = |value: Option<String>, field: &str| {
            non_empty(value).ok_or_else(|| {
                Error::validation_for_field(name, field, format!("'{field}' is required"))
            })
        };

        let region = required(raw.region, "region")?;
        let app_name = required(raw.app_name, "appName")?;
        let account_id = required(raw.account_id, "accountId")?;
        let iam_user = required(raw.iam_user, "iamUser")?;
        let ec2_ssh_key = required(raw.ec2_ssh_key, "ec2SSHKey")?;
        let env = non_empty(raw.env).unwrap_or_else(|| name.to_string());

        let create_vpc = match raw.create_vpc {
            None => false,
            Some(flag) => flag.as_bool().ok_or_else(|| {
                Error::validation_for_field(name, "createVpc", "expected true or false")
            })?,
        };

        let network = if create_vpc {
            let cidr = non_empty(raw.vpc_cidr).ok_or_else(|| {
                Error::validation_for_field(
                    name,
                    "vpcCidr",
                    "'vpcCidr' is required when createVpc is true",
                )
            })?;
            NetworkSource::Create { cidr }
        } else {
            let vpc_id = non_empty(raw.vpc_id).ok_or_else(|| {
                Error::validation_for_field(
                    name,
                    "vpcId",
                    "'vpcId' is required when createVpc is false",
                )
            })?;
            NetworkSource::Existing { vpc_id }
        };

        let k8s_version = non_empty(raw.k8s_version.map(VersionValue::into_string))
            .unwrap_or_else(|| DEFAULT_K8S_VERSION.to_string());
        validate_k8s_version(name, &k8s_version)?;

        let alb_version = non_empty(raw.alb_version.map(VersionValue::into_string))
            .unwrap_or_else(|| DEFAULT_ALB_VERSION.to_string());
        validate_alb_version(name, &alb_version)?;

        Ok(Self {
            region,
            app_name,
            account_id,
            env,
            iam_user,
            ec2_ssh_key,
            network,
            k8s_version,
            alb_version,
        })
    }

    /// Whether a new VPC is declared
    pub fn create_vpc(&self) -> bool {
        matches!(self.network, NetworkSource::Create { .. })
    }

    /// CIDR of the VPC to create, if in create mode
    pub fn vpc_cidr(&self) -> Option<&str> {
        match &self.network {
            NetworkSource::Create { cidr } => Some(cidr),
            NetworkSource::Existing { .. } => None,
        }
    }

    /// Identifier of the VPC to look up, if in lookup mode
    pub fn vpc_id(&self) -> Option<&str> {
        match &self.network {
            NetworkSource::Existing { vpc_id } => Some(vpc_id),
            NetworkSource::Create { .. } => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Control-plane versions look like "1.x" (optionally "v1.x")
fn validate_k8s_version(env: &str, version: &str) -> Result<()> {
    if !version.starts_with("1.") && !version.starts_with("v1.") {
        return Err(Error::validation_for_field(
            env,
            "k8sVersion",
            format!("invalid kubernetes version: {version}, expected format: 1.x"),
        ));
    }
    Ok(())
}

/// Ingress-controller versions are dotted numerics, `x.y` or `x.y.z`
/// (optionally "v"-prefixed)
fn validate_alb_version(env: &str, version: &str) -> Result<()> {
    let parts: Vec<&str> = version.trim_start_matches('v').split('.').collect();
    let well_formed = (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(Error::validation_for_field(
            env,
            "albVersion",
            format!("invalid ingress controller version: {version}, expected format: x.y or x.y.z"),
        ));
    }
    Ok(())
}

/// Configuration source keyed by environment name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextDocument {
    entries: Map<String, Value>,
}

impl ContextDocument {
    /// Parse a context document from JSON text
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::serialization_for("context", e.to_string()))?;
        Self::from_value(value)
    }

    /// Build a context document from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut entries) = value else {
            return Err(Error::serialization_for(
                "context",
                "context document must be a JSON object",
            ));
        };

        if let Some(Value::Object(nested)) = entries.remove(NESTED_CONTEXT_KEY) {
            entries = nested;
        }

        Ok(Self { entries })
    }

    /// Load a context document from a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::config_source(path.display().to_string(), e.to_string()))?;
        Self::from_json_str(&data)
            .map_err(|e| Error::config_source(path.display().to_string(), e.to_string()))
    }

    /// The raw entry for an environment
    pub fn environment(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Names of every entry that looks like an environment (object-valued)
    pub fn environments(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_object())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

impl From<Map<String, Value>> for ContextDocument {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}
