//! Provisioning engine collaborator
//!
//! The engine turns declarations into live infrastructure at a later apply
//! phase. Synthesis only needs "declare resource, get handle" and "resolve an
//! existing resource by identifier"; this trait is that seam, so tests can
//! mock it while the CLI uses the in-process [`RecordingEngine`].
//!
//! [`RecordingEngine`]: crate::recording::RecordingEngine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use eks_bootstrap_common::Error;

use crate::cluster::ClusterSpec;
use crate::iam::RoleSpec;
use crate::network::NetworkSpec;
use crate::nodepool::NodePoolSpec;

/// Placement tier of a subnet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetTier {
    /// Routable from the internet
    Public,
    /// Private, with outbound access through a NAT gateway
    PrivateWithEgress,
}

impl SubnetTier {
    /// Wire name of the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetTier::Public => "PUBLIC",
            SubnetTier::PrivateWithEgress => "PRIVATE_WITH_EGRESS",
        }
    }
}

impl std::fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a virtual network and its subnet tiers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRef {
    /// VPC identifier (a token for networks declared in this pass)
    pub vpc_id: String,
    /// Public subnet identifiers
    pub public_subnet_ids: Vec<String>,
    /// Private-with-egress subnet identifiers
    pub private_subnet_ids: Vec<String>,
}

/// A network, whether declared in this pass or looked up
///
/// Both variants expose the same accessors; downstream builders never need
/// to know which one they hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkHandle {
    /// Declared by this synthesis pass
    Created(NetworkRef),
    /// Resolved from an existing network
    LookedUp(NetworkRef),
}

impl NetworkHandle {
    /// The underlying network reference
    pub fn network(&self) -> &NetworkRef {
        match self {
            NetworkHandle::Created(n) | NetworkHandle::LookedUp(n) => n,
        }
    }

    /// VPC identifier
    pub fn vpc_id(&self) -> &str {
        &self.network().vpc_id
    }

    /// Subnet identifiers of a tier
    pub fn subnet_ids(&self, tier: SubnetTier) -> &[String] {
        let network = self.network();
        match tier {
            SubnetTier::Public => &network.public_subnet_ids,
            SubnetTier::PrivateWithEgress => &network.private_subnet_ids,
        }
    }

    /// Whether this pass declared the network
    pub fn is_created(&self) -> bool {
        matches!(self, NetworkHandle::Created(_))
    }
}

/// Reference to a declared control plane
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterHandle {
    /// Logical id in the assembly
    pub logical_id: String,
    /// Cluster name
    pub name: String,
    /// Network the control plane is bound to
    pub network: NetworkHandle,
}

/// Reference to a declared IAM role
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleHandle {
    /// Logical id in the assembly
    pub logical_id: String,
    /// Role name
    pub name: String,
    /// Role ARN (a token for roles declared in this pass)
    pub arn: String,
}

/// Reference to a resolved IAM principal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrincipalHandle {
    /// Principal name as configured
    pub name: String,
    /// Principal ARN
    pub arn: String,
}

/// Trait abstracting the provisioning engine
///
/// Every method is a single declaration or lookup; implementations must not
/// reorder or batch them, because synthesis relies on strict call order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Declare a new virtual network
    async fn declare_network(&self, spec: &NetworkSpec) -> Result<NetworkHandle, Error>;

    /// Resolve an existing network by region and identifier
    ///
    /// Fails with `NetworkNotFound` when the identifier does not resolve.
    async fn lookup_network(&self, region: &str, vpc_id: &str) -> Result<NetworkHandle, Error>;

    /// Declare a control plane
    async fn declare_cluster(&self, spec: &ClusterSpec) -> Result<ClusterHandle, Error>;

    /// Attach a node pool to a cluster
    async fn add_node_pool(&self, cluster: &ClusterHandle, spec: &NodePoolSpec)
        -> Result<(), Error>;

    /// Declare an IAM role
    async fn declare_role(&self, spec: &RoleSpec) -> Result<RoleHandle, Error>;

    /// Resolve a principal by name
    ///
    /// Fails with `PrincipalNotFound` when the name does not resolve.
    async fn lookup_principal(&self, name: &str) -> Result<PrincipalHandle, Error>;

    /// Map a principal into cluster authorization groups
    async fn bind_authorization(
        &self,
        cluster: &ClusterHandle,
        principal: &PrincipalHandle,
        groups: &[String],
    ) -> Result<(), Error>;
}
