//! Declared resources in serializable form
//!
//! A [`ResourceManifest`] is one declared resource: its type, logical id,
//! untyped properties, explicit dependencies, and tags. An [`Assembly`] is the
//! ordered output of one synthesis pass, ready to hand to an apply step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use eks_bootstrap_common::{Error, Result, SynthContext, STACK_NAME};

/// Resource type for a virtual network
pub const VPC_RESOURCE_TYPE: &str = "AWS::EC2::VPC";
/// Resource type for a control plane
pub const CLUSTER_RESOURCE_TYPE: &str = "AWS::EKS::Cluster";
/// Resource type for a managed node group
pub const NODEGROUP_RESOURCE_TYPE: &str = "AWS::EKS::Nodegroup";
/// Resource type for an IAM role
pub const ROLE_RESOURCE_TYPE: &str = "AWS::IAM::Role";
/// Resource type for an aws-auth user mapping
pub const AUTH_MAPPING_RESOURCE_TYPE: &str = "Custom::AwsAuthUserMapping";

/// A declared resource
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceManifest {
    /// Logical id, unique within an assembly
    pub logical_id: String,
    /// Resource type (e.g., "AWS::EKS::Cluster")
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource properties (untyped)
    pub properties: serde_json::Value,
    /// Logical ids this resource must be created after
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Tags attached to the resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ResourceManifest {
    /// Create a manifest with empty properties
    pub fn new(resource_type: impl Into<String>, logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            properties: serde_json::Value::Object(serde_json::Map::new()),
            depends_on: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Set the properties
    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Add a dependency on another logical id
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let id = logical_id.into();
        if !self.depends_on.contains(&id) {
            self.depends_on.push(id);
        }
        self
    }
}

/// Output of one synthesis pass
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assembly {
    /// Stack the resources belong to
    pub stack_name: String,
    /// Target account
    pub account: String,
    /// Target region
    pub region: String,
    /// Tags applied to every resource
    pub tags: BTreeMap<String, String>,
    /// Resources in declaration order
    pub resources: Vec<ResourceManifest>,
}

impl Assembly {
    /// Create an assembly for a context
    pub fn new(ctx: &SynthContext, resources: Vec<ResourceManifest>) -> Self {
        Self {
            stack_name: STACK_NAME.to_string(),
            account: ctx.config().account_id.clone(),
            region: ctx.config().region.clone(),
            tags: ctx.tags().clone(),
            resources,
        }
    }

    /// Find a resource by logical id
    pub fn resource(&self, logical_id: &str) -> Option<&ResourceManifest> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    /// All resources of a type, in declaration order
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a ResourceManifest> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }

    /// Serialize the assembly to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::serialization_for("Assembly", e.to_string()))
    }
}
