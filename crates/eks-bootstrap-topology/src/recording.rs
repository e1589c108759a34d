//! In-process provisioning engine
//!
//! [`RecordingEngine`] records every declaration as a [`ResourceManifest`] in
//! call order and answers lookups from a [`LookupCache`] file. Identifiers of
//! resources declared in the same pass are deterministic tokens
//! (`${<logicalId>.<Attribute>}`) resolved by the apply step.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use eks_bootstrap_common::{Error, SynthContext};

use crate::cluster::ClusterSpec;
use crate::constants::ADMIN_BINDING_ID;
use crate::engine::{
    ClusterHandle, NetworkHandle, NetworkRef, PrincipalHandle, ProvisioningEngine, RoleHandle,
    SubnetTier,
};
use crate::iam::RoleSpec;
use crate::manifest::{
    Assembly, ResourceManifest, AUTH_MAPPING_RESOURCE_TYPE, CLUSTER_RESOURCE_TYPE,
    NODEGROUP_RESOURCE_TYPE, ROLE_RESOURCE_TYPE, VPC_RESOURCE_TYPE,
};
use crate::network::NetworkSpec;
use crate::nodepool::NodePoolSpec;

/// Maximum length of an IAM user name
const MAX_PRINCIPAL_NAME_LEN: usize = 64;

/// A network known ahead of synthesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedNetwork {
    /// Region the network lives in
    pub region: String,
    /// VPC identifier
    pub vpc_id: String,
    /// Public subnet identifiers
    #[serde(default)]
    pub public_subnet_ids: Vec<String>,
    /// Private-with-egress subnet identifiers
    #[serde(default)]
    pub private_subnet_ids: Vec<String>,
}

/// Previously resolved lookups
///
/// When `principals` is absent, any syntactically valid IAM user name
/// resolves; when present, only listed names do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupCache {
    /// Known networks
    #[serde(default)]
    pub networks: Vec<CachedNetwork>,
    /// Known principal names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principals: Option<Vec<String>>,
}

impl LookupCache {
    /// Parse a lookup cache from JSON
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        serde_json::from_str(input)
            .map_err(|e| Error::serialization_for("LookupCache", e.to_string()))
    }

    /// Load a lookup cache file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::config_source(&display, e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| Error::config_source(display, e.to_string()))
    }

    fn network(&self, region: &str, vpc_id: &str) -> Option<&CachedNetwork> {
        self.networks
            .iter()
            .find(|n| n.region == region && n.vpc_id == vpc_id)
    }

    fn knows_principal(&self, name: &str) -> bool {
        match &self.principals {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

/// Engine that records declarations instead of applying them
pub struct RecordingEngine {
    account_id: String,
    tags: BTreeMap<String, String>,
    lookups: LookupCache,
    resources: Mutex<Vec<ResourceManifest>>,
}

impl RecordingEngine {
    /// Create an engine for a context, answering lookups from `lookups`
    pub fn new(ctx: &SynthContext, lookups: LookupCache) -> Self {
        Self {
            account_id: ctx.config().account_id.clone(),
            tags: ctx.tags().clone(),
            lookups,
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Resources recorded so far, in declaration order
    pub fn resources(&self) -> Vec<ResourceManifest> {
        self.resources.lock().clone()
    }

    /// Consume the engine into an assembly
    pub fn into_assembly(self, ctx: &SynthContext) -> Assembly {
        Assembly::new(ctx, self.resources.into_inner())
    }

    fn record(&self, manifest: ResourceManifest) -> Result<(), Error> {
        let mut resources = self.resources.lock();
        if resources
            .iter()
            .any(|r| r.logical_id == manifest.logical_id)
        {
            return Err(Error::engine(
                &manifest.logical_id,
                "logical id already declared",
            ));
        }
        // Only keep dependencies on resources declared in this pass
        let mut manifest = manifest;
        manifest
            .depends_on
            .retain(|id| resources.iter().any(|r| &r.logical_id == id));
        debug!(
            logical_id = %manifest.logical_id,
            resource_type = %manifest.resource_type,
            "recorded resource"
        );
        resources.push(manifest);
        Ok(())
    }

    fn tagged(&self, tags: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut merged = self.tags.clone();
        merged.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

fn token(logical_id: &str, attribute: &str) -> String {
    format!("${{{logical_id}.{attribute}}}")
}

fn subnet_tokens(spec: &NetworkSpec, tier: SubnetTier) -> Vec<String> {
    spec.subnet_tiers
        .iter()
        .filter(|t| t.tier == tier)
        .flat_map(|t| {
            (1..=spec.max_azs).map(move |az| token(&spec.logical_id, &format!("{}Subnet{az}", t.name)))
        })
        .collect()
}

/// Whether a name is a syntactically valid IAM user name
fn is_valid_principal_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_PRINCIPAL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c))
}

#[async_trait]
impl ProvisioningEngine for RecordingEngine {
    async fn declare_network(&self, spec: &NetworkSpec) -> Result<NetworkHandle, Error> {
        let subnets: Vec<_> = spec
            .subnet_tiers
            .iter()
            .map(|t| json!({ "name": t.name, "subnetType": t.tier, "cidrMask": t.cidr_mask }))
            .collect();
        self.record(
            ResourceManifest::new(VPC_RESOURCE_TYPE, &spec.logical_id)
                .with_properties(json!({
                    "vpcName": spec.name,
                    "cidrBlock": spec.cidr,
                    "maxAzs": spec.max_azs,
                    "subnetConfiguration": subnets,
                }))
                .with_tags(self.tagged(&spec.tags)),
        )?;

        Ok(NetworkHandle::Created(NetworkRef {
            vpc_id: token(&spec.logical_id, "VpcId"),
            public_subnet_ids: subnet_tokens(spec, SubnetTier::Public),
            private_subnet_ids: subnet_tokens(spec, SubnetTier::PrivateWithEgress),
        }))
    }

    async fn lookup_network(&self, region: &str, vpc_id: &str) -> Result<NetworkHandle, Error> {
        let cached = self
            .lookups
            .network(region, vpc_id)
            .ok_or_else(|| Error::network_not_found(region, vpc_id))?;
        debug!(region, vpc_id, "resolved network from lookup cache");
        Ok(NetworkHandle::LookedUp(NetworkRef {
            vpc_id: cached.vpc_id.clone(),
            public_subnet_ids: cached.public_subnet_ids.clone(),
            private_subnet_ids: cached.private_subnet_ids.clone(),
        }))
    }

    async fn declare_cluster(&self, spec: &ClusterSpec) -> Result<ClusterHandle, Error> {
        let mut manifest = ResourceManifest::new(CLUSTER_RESOURCE_TYPE, &spec.logical_id)
            .with_properties(json!({
                "name": spec.name,
                "version": spec.version,
                "endpointAccess": spec.endpoint_access,
                "vpcId": spec.network.vpc_id(),
                "subnetType": spec.subnet_tier,
                "subnetIds": spec.subnet_ids,
                "logging": spec.logging,
                "defaultCapacity": spec.default_capacity,
                "albController": {
                    "version": spec.ingress_controller.version,
                    "policy": spec.ingress_controller.policy,
                },
            }))
            .with_tags(self.tagged(&spec.tags));
        if let Some((vpc_logical_id, _)) = spec
            .network
            .vpc_id()
            .strip_prefix("${")
            .and_then(|t| t.split_once('.'))
        {
            manifest = manifest.depends_on(vpc_logical_id);
        }
        self.record(manifest)?;

        Ok(ClusterHandle {
            logical_id: spec.logical_id.clone(),
            name: spec.name.clone(),
            network: spec.network.clone(),
        })
    }

    async fn add_node_pool(
        &self,
        cluster: &ClusterHandle,
        spec: &NodePoolSpec,
    ) -> Result<(), Error> {
        self.record(
            ResourceManifest::new(NODEGROUP_RESOURCE_TYPE, &spec.logical_id)
                .with_properties(json!({
                    "clusterName": cluster.name,
                    "nodegroupName": spec.name,
                    "instanceTypes": spec.instance_types,
                    "amiType": spec.ami_type,
                    "labels": spec.labels,
                    "scalingConfig": {
                        "minSize": spec.min_size,
                        "maxSize": spec.max_size,
                    },
                    "diskSize": spec.disk_size_gb,
                    "nodeRole": spec.node_role.arn,
                    "subnetType": spec.subnet_tier,
                    "subnets": spec.subnet_ids,
                    "remoteAccess": { "ec2SshKey": spec.remote_access_key },
                }))
                .with_tags(self.tagged(&spec.tags))
                .depends_on(&cluster.logical_id)
                .depends_on(&spec.node_role.logical_id),
        )
    }

    async fn declare_role(&self, spec: &RoleSpec) -> Result<RoleHandle, Error> {
        self.record(
            ResourceManifest::new(ROLE_RESOURCE_TYPE, &spec.logical_id)
                .with_properties(json!({
                    "roleName": spec.name,
                    "assumeRolePolicyDocument": spec.trust_policy(),
                    "managedPolicyArns": spec.managed_policy_arns,
                }))
                .with_tags(self.tagged(&spec.tags)),
        )?;

        Ok(RoleHandle {
            logical_id: spec.logical_id.clone(),
            name: spec.name.clone(),
            arn: token(&spec.logical_id, "Arn"),
        })
    }

    async fn lookup_principal(&self, name: &str) -> Result<PrincipalHandle, Error> {
        if !is_valid_principal_name(name) || !self.lookups.knows_principal(name) {
            return Err(Error::principal_not_found(name));
        }
        Ok(PrincipalHandle {
            name: name.to_string(),
            arn: format!("arn:aws:iam::{}:user/{name}", self.account_id),
        })
    }

    async fn bind_authorization(
        &self,
        cluster: &ClusterHandle,
        principal: &PrincipalHandle,
        groups: &[String],
    ) -> Result<(), Error> {
        let logical_id = format!("{}_{ADMIN_BINDING_ID}", cluster.logical_id);
        self.record(
            ResourceManifest::new(AUTH_MAPPING_RESOURCE_TYPE, logical_id)
                .with_properties(json!({
                    "clusterName": cluster.name,
                    "userArn": principal.arn,
                    "username": principal.name,
                    "groups": groups,
                }))
                .with_tags(self.tags.clone())
                .depends_on(&cluster.logical_id),
        )
    }
}
