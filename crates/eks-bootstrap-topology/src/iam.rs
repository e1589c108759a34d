//! IAM execution roles
//!
//! Worker nodes share exactly one role, trusted by the EC2 service principal
//! and carrying the three managed worker-node policies. The ingress
//! controller's policy document lives in [`crate::policy`].

use std::collections::BTreeMap;

use tracing::{debug, info};

use eks_bootstrap_common::{Result, SynthContext};

use crate::constants::{
    managed_policy_arn, NODE_MANAGED_POLICIES, NODE_ROLE_SERVICE_PRINCIPAL, NODE_ROLE_SUFFIX,
};
use crate::engine::{ProvisioningEngine, RoleHandle};

/// Declaration of an IAM role
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSpec {
    /// Logical id in the assembly
    pub logical_id: String,
    /// Role name
    pub name: String,
    /// Service principal allowed to assume the role
    pub assumed_by: String,
    /// Managed policy ARNs attached to the role
    pub managed_policy_arns: Vec<String>,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

impl RoleSpec {
    /// Trust policy allowing the service principal to assume the role
    pub fn trust_policy(&self) -> serde_json::Value {
        serde_json::json!({
            "Version": crate::policy::POLICY_LANGUAGE_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": &self.assumed_by },
                "Action": "sts:AssumeRole"
            }]
        })
    }
}

/// Build the worker node role declaration (`<app>_eks_node`)
pub fn node_role_spec(ctx: &SynthContext) -> RoleSpec {
    let name = ctx.resource_name(NODE_ROLE_SUFFIX);
    RoleSpec {
        logical_id: name.clone(),
        name,
        assumed_by: NODE_ROLE_SERVICE_PRINCIPAL.to_string(),
        managed_policy_arns: NODE_MANAGED_POLICIES
            .iter()
            .map(|p| managed_policy_arn(p))
            .collect(),
        tags: ctx.tags().clone(),
    }
}

/// Declare the worker node role shared by every node pool
pub async fn create_node_role(
    ctx: &SynthContext,
    engine: &dyn ProvisioningEngine,
) -> Result<RoleHandle> {
    let spec = node_role_spec(ctx);
    info!(role = %spec.name, "declaring node role");
    debug!(policies = ?spec.managed_policy_arns, "node role managed policies");
    engine.declare_role(&spec).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockProvisioningEngine;
    use crate::fixtures::{create_config, ctx, node_role};

    #[test]
    fn node_role_is_named_after_app() {
        let spec = node_role_spec(&ctx(create_config()));
        assert_eq!(spec.name, "demo_eks_node");
        assert_eq!(spec.logical_id, "demo_eks_node");
    }

    #[test]
    fn node_role_trusts_ec2() {
        let spec = node_role_spec(&ctx(create_config()));
        assert_eq!(spec.assumed_by, "ec2.amazonaws.com");
        let trust = spec.trust_policy();
        assert_eq!(
            trust["Statement"][0]["Principal"]["Service"],
            "ec2.amazonaws.com"
        );
        assert_eq!(trust["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[test]
    fn node_role_attaches_three_worker_policies() {
        let spec = node_role_spec(&ctx(create_config()));
        assert_eq!(
            spec.managed_policy_arns,
            vec![
                "arn:aws:iam::aws:policy/AmazonEKSWorkerNodePolicy",
                "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryReadOnly",
                "arn:aws:iam::aws:policy/AmazonEKS_CNI_Policy",
            ]
        );
    }

    #[tokio::test]
    async fn declares_role_once() {
        let mut engine = MockProvisioningEngine::new();
        engine
            .expect_declare_role()
            .times(1)
            .withf(|spec| spec.name == "demo_eks_node")
            .returning(|_| Ok(node_role()));

        let role = create_node_role(&ctx(create_config()), &engine)
            .await
            .expect("role");
        assert_eq!(role, node_role());
    }
}
