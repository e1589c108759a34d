//! Centralized constants for the topology crate
//!
//! Every fixed value of the topology shape lives here so builders and tests
//! agree on them.

// =============================================================================
// Naming
// =============================================================================

/// Suffix of the VPC name (`<app>_vpc`)
pub const VPC_SUFFIX: &str = "vpc";
/// Suffix of the public subnet tier name (`<app>_public`)
pub const PUBLIC_SUBNET_SUFFIX: &str = "public";
/// Suffix of the private subnet tier name (`<app>_private`)
pub const PRIVATE_SUBNET_SUFFIX: &str = "private";
/// Suffix of the cluster name (`<app>_eks`)
pub const CLUSTER_SUFFIX: &str = "eks";
/// Suffix of the node role name (`<app>_eks_node`)
pub const NODE_ROLE_SUFFIX: &str = "eks_node";
/// Logical id of the admin user mapping
pub const ADMIN_BINDING_ID: &str = "adminUser";

// =============================================================================
// Network
// =============================================================================

/// Netmask of each public subnet
pub const PUBLIC_SUBNET_MASK: u8 = 24;
/// Netmask of each private-with-egress subnet
pub const PRIVATE_SUBNET_MASK: u8 = 20;
/// Availability zones a new VPC spreads its subnets across
pub const DEFAULT_MAX_AZS: u8 = 3;

// =============================================================================
// Node pools
// =============================================================================

/// Minimum pool size when none is given
pub const DEFAULT_MIN_SIZE: u32 = 0;
/// Maximum size of every pool
pub const MAX_POOL_SIZE: u32 = 100;
/// Root disk size of every node, in GiB
pub const NODE_DISK_SIZE_GB: u32 = 100;

// =============================================================================
// IAM
// =============================================================================

/// Service principal trusted by the node role
pub const NODE_ROLE_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";

/// AWS managed policies attached to the node role
pub const NODE_MANAGED_POLICIES: &[&str] = &[
    "AmazonEKSWorkerNodePolicy",
    "AmazonEC2ContainerRegistryReadOnly",
    "AmazonEKS_CNI_Policy",
];

/// ARN prefix of AWS managed policies
pub const AWS_MANAGED_POLICY_ARN_PREFIX: &str = "arn:aws:iam::aws:policy/";

/// Built-in cluster administrators group
pub const CLUSTER_ADMIN_GROUP: &str = "system:masters";

/// Build the ARN of an AWS managed policy
pub fn managed_policy_arn(name: &str) -> String {
    format!("{AWS_MANAGED_POLICY_ARN_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_policy_arns_use_aws_prefix() {
        assert_eq!(
            managed_policy_arn("AmazonEKS_CNI_Policy"),
            "arn:aws:iam::aws:policy/AmazonEKS_CNI_Policy"
        );
    }
}
