//! IAM policy documents
//!
//! The ingress controller's permission document is a fixed contract: the
//! provisioning engine validates it against the cloud authorization model at
//! apply time, so it is shipped as a JSON asset (checked by `build.rs`) rather
//! than assembled in code.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use eks_bootstrap_common::{Error, Result};

/// IAM policy language version used by every document
pub const POLICY_LANGUAGE_VERSION: &str = "2012-10-17";

const ALB_CONTROLLER_POLICY_JSON: &str = include_str!("../assets/alb-controller-policy.json");

static ALB_CONTROLLER_POLICY: LazyLock<std::result::Result<PolicyDocument, String>> =
    LazyLock::new(|| serde_json::from_str(ALB_CONTROLLER_POLICY_JSON).map_err(|e| e.to_string()));

/// Statement effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Grant the listed actions
    Allow,
    /// Deny the listed actions
    Deny,
}

/// Resource pattern(s) a statement applies to
///
/// Kept as written in the source document: a bare string stays a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourcePattern {
    /// Single pattern, e.g. `"*"`
    Single(String),
    /// Several patterns
    List(Vec<String>),
}

impl ResourcePattern {
    /// All patterns as a slice-like list
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            ResourcePattern::Single(p) => vec![p.as_str()],
            ResourcePattern::List(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

/// Condition block: operator → (condition key → value)
pub type Conditions = BTreeMap<String, BTreeMap<String, String>>;

/// One permission statement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Allow or deny
    pub effect: Effect,
    /// Actions covered by the statement
    pub action: Vec<String>,
    /// Resources covered by the statement
    pub resource: ResourcePattern,
    /// Optional conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Conditions>,
}

/// A versioned statement list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version
    pub version: String,
    /// Statements in document order
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Serialize to the JSON value handed to the provisioning engine
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| Error::serialization_for("PolicyDocument", e.to_string()))
    }
}

/// The embedded AWS Load Balancer Controller policy
pub fn alb_controller_policy() -> Result<&'static PolicyDocument> {
    match &*ALB_CONTROLLER_POLICY {
        Ok(doc) => Ok(doc),
        Err(e) => Err(Error::serialization_for("PolicyDocument", e.clone())),
    }
}

/// Ingress-controller policy bound to a controller version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressPolicy {
    /// Controller version the policy is attached for
    pub controller_version: String,
    /// Permission document
    pub document: PolicyDocument,
}

/// Build the ingress-controller policy for a controller version
///
/// The statement set does not vary with the version; the version only
/// travels with it so the attached controller and its policy stay paired.
pub fn ingress_policy(controller_version: &str) -> Result<IngressPolicy> {
    Ok(IngressPolicy {
        controller_version: controller_version.to_string(),
        document: alb_controller_policy()?.clone(),
    })
}
