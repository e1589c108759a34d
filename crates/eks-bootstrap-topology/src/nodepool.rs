//! Worker node pools
//!
//! Every pool is attached to one cluster and one node role, placed in the
//! private-with-egress tier, sized between its minimum and [`MAX_POOL_SIZE`],
//! and reachable over SSH through the configured key. Labels mirror the pool
//! tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use eks_bootstrap_common::{Error, Result, SynthContext};

use crate::constants::{DEFAULT_MIN_SIZE, MAX_POOL_SIZE, NODE_DISK_SIZE_GB};
use crate::engine::{ClusterHandle, ProvisioningEngine, RoleHandle, SubnetTier};

/// Machine image family of a node pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmiType {
    /// Amazon Linux 2, x86_64
    #[serde(rename = "AL2_X86_64")]
    Al2X86_64,
    /// Amazon Linux 2, arm64
    #[serde(rename = "AL2_ARM_64")]
    Al2Arm64,
    /// Bottlerocket, x86_64
    #[serde(rename = "BOTTLEROCKET_X86_64")]
    BottlerocketX86_64,
    /// Bottlerocket, arm64
    #[serde(rename = "BOTTLEROCKET_ARM_64")]
    BottlerocketArm64,
}

/// EC2 instance shape (e.g., `c7g.large`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceType(String);

impl InstanceType {
    /// Wrap an instance shape name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Shape name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-facing arguments of [`add_node_pool`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePoolRequest {
    /// Pool name
    pub name: String,
    /// Candidate instance shapes, smallest first
    pub instance_types: Vec<InstanceType>,
    /// Machine image family
    pub ami_type: AmiType,
    /// Labels, also applied as tags
    pub labels: BTreeMap<String, String>,
    /// SSH key name for remote access
    pub remote_access_key: String,
    /// Minimum size; [`DEFAULT_MIN_SIZE`] when absent
    pub min_size: Option<u32>,
}

/// Declaration of a node pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePoolSpec {
    /// Logical id in the assembly (`<cluster>_<pool>`)
    pub logical_id: String,
    /// Pool name
    pub name: String,
    /// Candidate instance shapes, smallest first
    pub instance_types: Vec<InstanceType>,
    /// Machine image family
    pub ami_type: AmiType,
    /// Kubernetes node labels
    pub labels: BTreeMap<String, String>,
    /// Resource tags (global tags with labels layered on top)
    pub tags: BTreeMap<String, String>,
    /// SSH key name for remote access
    pub remote_access_key: String,
    /// Role assumed by the pool's nodes
    pub node_role: RoleHandle,
    /// Minimum size
    pub min_size: u32,
    /// Maximum size
    pub max_size: u32,
    /// Root disk size in GiB
    pub disk_size_gb: u32,
    /// Subnet tier the nodes are placed in
    pub subnet_tier: SubnetTier,
    /// Subnets of that tier
    pub subnet_ids: Vec<String>,
}

/// Build a node pool declaration
pub fn node_pool_spec(
    ctx: &SynthContext,
    cluster: &ClusterHandle,
    role: &RoleHandle,
    request: &NodePoolRequest,
) -> Result<NodePoolSpec> {
    let env = &ctx.config().env;

    if request.instance_types.is_empty() {
        return Err(Error::validation_for_field(
            env,
            "instanceTypes",
            format!("node pool {} has no instance types", request.name),
        ));
    }

    let min_size = request.min_size.unwrap_or(DEFAULT_MIN_SIZE);
    if min_size > MAX_POOL_SIZE {
        return Err(Error::validation_for_field(
            env,
            "minSize",
            format!(
                "node pool {}: min size {min_size} exceeds max size {MAX_POOL_SIZE}",
                request.name
            ),
        ));
    }

    let subnet_tier = SubnetTier::PrivateWithEgress;
    Ok(NodePoolSpec {
        logical_id: format!("{}_{}", cluster.logical_id, request.name),
        name: request.name.clone(),
        instance_types: request.instance_types.clone(),
        ami_type: request.ami_type,
        labels: request.labels.clone(),
        tags: ctx.tags_with(&request.labels),
        remote_access_key: request.remote_access_key.clone(),
        node_role: role.clone(),
        min_size,
        max_size: MAX_POOL_SIZE,
        disk_size_gb: NODE_DISK_SIZE_GB,
        subnet_tier,
        subnet_ids: cluster.network.subnet_ids(subnet_tier).to_vec(),
    })
}

/// Attach a node pool to the cluster
pub async fn add_node_pool(
    ctx: &SynthContext,
    engine: &dyn ProvisioningEngine,
    cluster: &ClusterHandle,
    role: &RoleHandle,
    request: &NodePoolRequest,
) -> Result<NodePoolSpec> {
    let spec = node_pool_spec(ctx, cluster, role, request)?;
    info!(
        cluster = %cluster.name,
        pool = %spec.name,
        min_size = spec.min_size,
        max_size = spec.max_size,
        "adding node pool"
    );
    debug!(pool = %spec.name, instance_types = ?spec.instance_types, "node pool shapes");
    engine.add_node_pool(cluster, &spec).await?;
    Ok(spec)
}

/// The two pools every environment gets
///
/// `system` runs cluster add-ons and is pinned at three nodes minimum; `biz`
/// scales from zero across two Graviton shapes.
pub fn reference_pools(ctx: &SynthContext) -> Vec<NodePoolRequest> {
    let key = &ctx.config().ec2_ssh_key;
    vec![
        NodePoolRequest {
            name: "system".to_string(),
            instance_types: vec![InstanceType::new("c7g.large")],
            ami_type: AmiType::BottlerocketArm64,
            labels: pool_labels("system"),
            remote_access_key: key.clone(),
            min_size: Some(3),
        },
        NodePoolRequest {
            name: "biz".to_string(),
            instance_types: vec![InstanceType::new("c7g.large"), InstanceType::new("c7g.xlarge")],
            ami_type: AmiType::BottlerocketArm64,
            labels: pool_labels("biz"),
            remote_access_key: key.clone(),
            min_size: None,
        },
    ]
}

fn pool_labels(biz_fun: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("BizFun".to_string(), biz_fun.to_string()),
        ("ArchType".to_string(), "arm".to_string()),
    ])
}
