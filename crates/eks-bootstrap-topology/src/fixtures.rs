//! Shared test fixtures

use eks_bootstrap_common::{EnvironmentConfig, NetworkSource, SynthContext};

use crate::engine::{ClusterHandle, NetworkHandle, NetworkRef, RoleHandle};

pub fn create_config() -> EnvironmentConfig {
    EnvironmentConfig {
        region: "us-east-1".to_string(),
        app_name: "demo".to_string(),
        account_id: "123456789012".to_string(),
        env: "dev".to_string(),
        iam_user: "admin".to_string(),
        ec2_ssh_key: "demo-key".to_string(),
        network: NetworkSource::Create {
            cidr: "10.0.0.0/16".to_string(),
        },
        k8s_version: "1.23".to_string(),
        alb_version: "2.4.1".to_string(),
    }
}

pub fn lookup_config(vpc_id: &str) -> EnvironmentConfig {
    EnvironmentConfig {
        network: NetworkSource::Existing {
            vpc_id: vpc_id.to_string(),
        },
        ..create_config()
    }
}

pub fn ctx(config: EnvironmentConfig) -> SynthContext {
    SynthContext::new(config)
}

pub fn network() -> NetworkHandle {
    NetworkHandle::LookedUp(NetworkRef {
        vpc_id: "vpc-123".to_string(),
        public_subnet_ids: vec!["subnet-pub-a".to_string(), "subnet-pub-b".to_string()],
        private_subnet_ids: vec!["subnet-priv-a".to_string(), "subnet-priv-b".to_string()],
    })
}

pub fn cluster() -> ClusterHandle {
    ClusterHandle {
        logical_id: "demo_eks".to_string(),
        name: "demo_eks".to_string(),
        network: network(),
    }
}

pub fn node_role() -> RoleHandle {
    RoleHandle {
        logical_id: "demo_eks_node".to_string(),
        name: "demo_eks_node".to_string(),
        arn: "${demo_eks_node.Arn}".to_string(),
    }
}
