//! EKS topology resolution
//!
//! This crate provides:
//! - The provisioning engine trait and the handles it returns
//! - Builders for the network, control plane, node role, node pools, and admin binding
//! - The synthesis pipeline running those builders in dependency order
//! - RecordingEngine, which records declarations into an Assembly

#![warn(missing_docs)]

pub mod access;
pub mod cluster;
pub mod constants;
pub mod engine;
pub mod iam;
pub mod manifest;
pub mod network;
pub mod nodepool;
pub mod policy;
pub mod recording;
pub mod synth;

#[cfg(test)]
mod fixtures;

// Re-export engine types
pub use engine::{
    ClusterHandle, NetworkHandle, NetworkRef, PrincipalHandle, ProvisioningEngine, RoleHandle,
    SubnetTier,
};

// Re-export builder types
pub use access::{bind_admin, AccessBinding};
pub use cluster::{cluster_spec, create_cluster, ClusterSpec, EndpointAccess, LogChannel};
pub use iam::{create_node_role, node_role_spec, RoleSpec};
pub use network::{network_spec, resolve_network, NetworkSpec};
pub use nodepool::{
    add_node_pool, reference_pools, AmiType, InstanceType, NodePoolRequest, NodePoolSpec,
};
pub use policy::{alb_controller_policy, ingress_policy, IngressPolicy, PolicyDocument};

// Re-export synthesis output
pub use manifest::{Assembly, ResourceManifest};
pub use recording::{CachedNetwork, LookupCache, RecordingEngine};
pub use synth::{synthesize, Topology};
