//! Admin access binding

use tracing::info;

use eks_bootstrap_common::Result;

use crate::constants::CLUSTER_ADMIN_GROUP;
use crate::engine::{ClusterHandle, ProvisioningEngine};

/// A principal mapped into cluster authorization groups
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessBinding {
    /// Cluster the mapping belongs to
    pub cluster: String,
    /// Resolved principal ARN
    pub principal_arn: String,
    /// Groups the principal is mapped into
    pub groups: Vec<String>,
}

/// Map the configured admin principal into the cluster admin group
///
/// A principal that does not resolve surfaces `PrincipalNotFound`; nothing is
/// bound in that case.
pub async fn bind_admin(
    engine: &dyn ProvisioningEngine,
    cluster: &ClusterHandle,
    principal_name: &str,
) -> Result<AccessBinding> {
    let principal = engine.lookup_principal(principal_name).await?;
    let groups = vec![CLUSTER_ADMIN_GROUP.to_string()];

    info!(cluster = %cluster.name, principal = %principal.arn, "binding cluster admin");
    engine
        .bind_authorization(cluster, &principal, &groups)
        .await?;

    Ok(AccessBinding {
        cluster: cluster.name.clone(),
        principal_arn: principal.arn,
        groups,
    })
}
