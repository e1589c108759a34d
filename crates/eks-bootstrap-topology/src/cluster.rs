//! Control plane declaration
//!
//! The control plane is bound to the network's private-with-egress subnets,
//! exposes a public endpoint, ships all five log channels, and attaches the
//! ingress controller. It is declared with zero default capacity: worker
//! capacity comes only from explicitly added node pools, so control-plane
//! updates never churn nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use eks_bootstrap_common::{Error, Result, SynthContext};

use crate::constants::CLUSTER_SUFFIX;
use crate::engine::{ClusterHandle, NetworkHandle, ProvisioningEngine, SubnetTier};
use crate::policy::{ingress_policy, PolicyDocument};

/// Control plane endpoint exposure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointAccess {
    /// Reachable from the internet only
    Public,
    /// Reachable from inside the VPC only
    Private,
    /// Reachable from both
    PublicAndPrivate,
}

/// Control plane log channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogChannel {
    /// API server
    Api,
    /// IAM authenticator
    Authenticator,
    /// Scheduler
    Scheduler,
    /// Controller manager
    ControllerManager,
    /// Audit
    Audit,
}

/// Log channels enabled on every control plane
pub const CONTROL_PLANE_LOG_CHANNELS: [LogChannel; 5] = [
    LogChannel::Api,
    LogChannel::Authenticator,
    LogChannel::Scheduler,
    LogChannel::ControllerManager,
    LogChannel::Audit,
];

/// Ingress controller add-on attached to the control plane
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressControllerSpec {
    /// Controller version
    pub version: String,
    /// Policy granted to the controller's execution identity
    pub policy: PolicyDocument,
}

/// Declaration of a control plane
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSpec {
    /// Logical id in the assembly
    pub logical_id: String,
    /// Cluster name (`<app>_eks`)
    pub name: String,
    /// Control plane version
    pub version: String,
    /// Endpoint exposure
    pub endpoint_access: EndpointAccess,
    /// Network the control plane is bound to
    pub network: NetworkHandle,
    /// Subnet tier the control plane is placed in
    pub subnet_tier: SubnetTier,
    /// Subnets of that tier
    pub subnet_ids: Vec<String>,
    /// Enabled log channels
    pub logging: Vec<LogChannel>,
    /// Nodes created with the control plane (always 0)
    pub default_capacity: u32,
    /// Ingress controller add-on
    pub ingress_controller: IngressControllerSpec,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

/// Build the control plane declaration bound to a network
pub fn cluster_spec(ctx: &SynthContext, network: &NetworkHandle) -> Result<ClusterSpec> {
    let config = ctx.config();
    let name = ctx.resource_name(CLUSTER_SUFFIX);

    let subnet_tier = SubnetTier::PrivateWithEgress;
    let subnet_ids = network.subnet_ids(subnet_tier).to_vec();
    if subnet_ids.is_empty() {
        return Err(Error::validation_for_field(
            &config.env,
            "vpcId",
            format!(
                "network {} has no {subnet_tier} subnets for cluster {name}",
                network.vpc_id()
            ),
        ));
    }

    let policy = ingress_policy(&config.alb_version)?;

    Ok(ClusterSpec {
        logical_id: name.clone(),
        name,
        version: config.k8s_version.clone(),
        endpoint_access: EndpointAccess::Public,
        network: network.clone(),
        subnet_tier,
        subnet_ids,
        logging: CONTROL_PLANE_LOG_CHANNELS.to_vec(),
        default_capacity: 0,
        ingress_controller: IngressControllerSpec {
            version: policy.controller_version,
            policy: policy.document,
        },
        tags: ctx.tags().clone(),
    })
}

/// Declare the control plane
pub async fn create_cluster(
    ctx: &SynthContext,
    engine: &dyn ProvisioningEngine,
    network: &NetworkHandle,
) -> Result<ClusterHandle> {
    let spec = cluster_spec(ctx, network)?;
    info!(
        cluster = %spec.name,
        version = %spec.version,
        alb_version = %spec.ingress_controller.version,
        vpc_id = %network.vpc_id(),
        "declaring control plane"
    );
    engine.declare_cluster(&spec).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockProvisioningEngine, NetworkRef};
    use crate::fixtures::{cluster, create_config, ctx, network};

    #[test]
    fn cluster_is_named_after_app() {
        let spec = cluster_spec(&ctx(create_config()), &network()).expect("spec");
        assert_eq!(spec.name, "demo_eks");
        assert_eq!(spec.logical_id, "demo_eks");
    }

    #[test]
    fn cluster_has_zero_default_capacity() {
        let spec = cluster_spec(&ctx(create_config()), &network()).expect("spec");
        assert_eq!(spec.default_capacity, 0);
    }

    #[test]
    fn cluster_is_placed_in_private_subnets() {
        let spec = cluster_spec(&ctx(create_config()), &network()).expect("spec");
        assert_eq!(spec.subnet_tier, SubnetTier::PrivateWithEgress);
        assert_eq!(spec.subnet_ids, vec!["subnet-priv-a", "subnet-priv-b"]);
    }

    #[test]
    fn cluster_enables_all_log_channels_and_public_endpoint() {
        let spec = cluster_spec(&ctx(create_config()), &network()).expect("spec");
        assert_eq!(spec.endpoint_access, EndpointAccess::Public);
        assert_eq!(spec.logging.len(), 5);
        let wire = serde_json::to_value(&spec.logging).unwrap();
        assert_eq!(
            wire,
            serde_json::json!(["api", "authenticator", "scheduler", "controllerManager", "audit"])
        );
    }

    #[test]
    fn cluster_pins_configured_versions() {
        let mut config = create_config();
        config.k8s_version = "1.27".to_string();
        config.alb_version = "2.5.4".to_string();
        let spec = cluster_spec(&ctx(config), &network()).expect("spec");
        assert_eq!(spec.version, "1.27");
        assert_eq!(spec.ingress_controller.version, "2.5.4");
        assert_eq!(spec.ingress_controller.policy.statement.len(), 15);
    }

    #[test]
    fn network_without_private_subnets_is_rejected() {
        let bare = NetworkHandle::LookedUp(NetworkRef {
            vpc_id: "vpc-public-only".to_string(),
            public_subnet_ids: vec!["subnet-pub".to_string()],
            private_subnet_ids: vec![],
        });
        let err = cluster_spec(&ctx(create_config()), &bare).unwrap_err();
        assert!(err.to_string().contains("vpc-public-only"));
    }

    #[tokio::test]
    async fn declares_cluster_bound_to_network() {
        let mut engine = MockProvisioningEngine::new();
        engine
            .expect_declare_cluster()
            .times(1)
            .withf(|spec| spec.network.vpc_id() == "vpc-123" && spec.default_capacity == 0)
            .returning(|_| Ok(cluster()));

        let handle = create_cluster(&ctx(create_config()), &engine, &network())
            .await
            .expect("cluster");
        assert_eq!(handle.name, "demo_eks");
    }
}
