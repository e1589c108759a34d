//! Synthesis pipeline
//!
//! Runs the builders in dependency order against one engine: network, control
//! plane, node role, node pools, admin binding. Each step consumes only the
//! context and handles produced by earlier steps. The first error aborts the
//! pass.

use tracing::{info, instrument};

use eks_bootstrap_common::{Result, SynthContext};

use crate::access::{bind_admin, AccessBinding};
use crate::cluster::create_cluster;
use crate::engine::{ClusterHandle, NetworkHandle, ProvisioningEngine, RoleHandle};
use crate::iam::create_node_role;
use crate::network::resolve_network;
use crate::nodepool::{add_node_pool, reference_pools, NodePoolSpec};

/// Handles produced by one synthesis pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    /// Cluster network
    pub network: NetworkHandle,
    /// Control plane
    pub cluster: ClusterHandle,
    /// Role shared by every node pool
    pub node_role: RoleHandle,
    /// Node pools in declaration order
    pub node_pools: Vec<NodePoolSpec>,
    /// Admin principal mapping
    pub admin_binding: AccessBinding,
}

/// Synthesize the full topology for an environment
#[instrument(skip_all, fields(app = %ctx.config().app_name, env = %ctx.config().env))]
pub async fn synthesize(ctx: &SynthContext, engine: &dyn ProvisioningEngine) -> Result<Topology> {
    let network = resolve_network(ctx, engine).await?;
    let cluster = create_cluster(ctx, engine, &network).await?;
    let node_role = create_node_role(ctx, engine).await?;

    let mut node_pools = Vec::new();
    for request in reference_pools(ctx) {
        node_pools.push(add_node_pool(ctx, engine, &cluster, &node_role, &request).await?);
    }

    let admin_binding = bind_admin(engine, &cluster, &ctx.config().iam_user).await?;

    info!(
        cluster = %cluster.name,
        vpc_id = %network.vpc_id(),
        pools = node_pools.len(),
        "synthesis complete"
    );

    Ok(Topology {
        network,
        cluster,
        node_role,
        node_pools,
        admin_binding,
    })
}
