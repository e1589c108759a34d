//! Network resolution
//!
//! Either declares a new VPC with a public and a private-with-egress subnet
//! tier, or resolves an existing VPC through the engine. The result is a
//! [`NetworkHandle`] either way.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use tracing::info;

use eks_bootstrap_common::{Error, NetworkSource, Result, SynthContext};

use crate::constants::{
    DEFAULT_MAX_AZS, PRIVATE_SUBNET_MASK, PRIVATE_SUBNET_SUFFIX, PUBLIC_SUBNET_MASK,
    PUBLIC_SUBNET_SUFFIX, VPC_SUFFIX,
};
use crate::engine::{NetworkHandle, ProvisioningEngine, SubnetTier};

/// One subnet tier of a new VPC
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubnetTierSpec {
    /// Tier name (`<app>_public`, `<app>_private`)
    pub name: String,
    /// Placement tier
    pub tier: SubnetTier,
    /// Netmask of each subnet in the tier
    pub cidr_mask: u8,
}

/// Declaration of a new VPC
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Logical id in the assembly
    pub logical_id: String,
    /// VPC name
    pub name: String,
    /// VPC CIDR block
    pub cidr: String,
    /// Availability zones to spread each tier across
    pub max_azs: u8,
    /// Subnet tiers
    pub subnet_tiers: Vec<SubnetTierSpec>,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

/// Build the declaration of a new VPC with the given CIDR
pub fn network_spec(ctx: &SynthContext, cidr: &str) -> Result<NetworkSpec> {
    let name = ctx.resource_name(VPC_SUFFIX);
    let spec = NetworkSpec {
        logical_id: name.clone(),
        name,
        cidr: cidr.to_string(),
        max_azs: DEFAULT_MAX_AZS,
        subnet_tiers: vec![
            SubnetTierSpec {
                name: ctx.resource_name(PUBLIC_SUBNET_SUFFIX),
                tier: SubnetTier::Public,
                cidr_mask: PUBLIC_SUBNET_MASK,
            },
            SubnetTierSpec {
                name: ctx.resource_name(PRIVATE_SUBNET_SUFFIX),
                tier: SubnetTier::PrivateWithEgress,
                cidr_mask: PRIVATE_SUBNET_MASK,
            },
        ],
        tags: ctx.tags().clone(),
    };
    validate_capacity(&ctx.config().env, &spec)?;
    Ok(spec)
}

/// Resolve the cluster network for the configured mode
pub async fn resolve_network(
    ctx: &SynthContext,
    engine: &dyn ProvisioningEngine,
) -> Result<NetworkHandle> {
    let config = ctx.config();
    match &config.network {
        NetworkSource::Create { cidr } => {
            let spec = network_spec(ctx, cidr)?;
            info!(vpc = %spec.name, cidr = %spec.cidr, "declaring network");
            engine.declare_network(&spec).await
        }
        NetworkSource::Existing { vpc_id } => {
            info!(region = %config.region, vpc_id = %vpc_id, "looking up existing network");
            engine.lookup_network(&config.region, vpc_id).await
        }
    }
}

/// Parse an IPv4 CIDR block into its address and prefix length
pub fn parse_cidr(cidr: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, prefix) = cidr.split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    (prefix <= 32).then_some((addr, prefix))
}

/// Check that every tier fits in the VPC CIDR across all availability zones
fn validate_capacity(env: &str, spec: &NetworkSpec) -> Result<()> {
    let (_, prefix) = parse_cidr(&spec.cidr).ok_or_else(|| {
        Error::validation_for_field(
            env,
            "vpcCidr",
            format!("invalid CIDR block: {}", spec.cidr),
        )
    })?;

    let mut required: u64 = 0;
    for tier in &spec.subnet_tiers {
        if tier.cidr_mask < prefix {
            return Err(Error::validation_for_field(
                env,
                "vpcCidr",
                format!(
                    "/{} subnets of tier {} do not fit in {}",
                    tier.cidr_mask, tier.name, spec.cidr
                ),
            ));
        }
        required += u64::from(spec.max_azs) << (32 - u32::from(tier.cidr_mask));
    }

    let available: u64 = 1 << (32 - u32::from(prefix));
    if required > available {
        return Err(Error::validation_for_field(
            env,
            "vpcCidr",
            format!(
                "{} needs {required} addresses for {} availability zones but {} has {available}",
                spec.name, spec.max_azs, spec.cidr
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockProvisioningEngine, NetworkRef};
    use crate::fixtures::{create_config, lookup_config, ctx};

    fn looked_up(vpc_id: &str) -> NetworkHandle {
        NetworkHandle::LookedUp(NetworkRef {
            vpc_id: vpc_id.to_string(),
            public_subnet_ids: vec!["subnet-pub".to_string()],
            private_subnet_ids: vec!["subnet-priv".to_string()],
        })
    }

    #[test]
    fn new_network_has_exactly_two_tiers() {
        let spec = network_spec(&ctx(create_config()), "10.0.0.0/16").expect("spec");
        assert_eq!(spec.subnet_tiers.len(), 2);

        let public = &spec.subnet_tiers[0];
        assert_eq!(public.tier, SubnetTier::Public);
        assert_eq!(public.cidr_mask, 24);
        assert_eq!(public.name, "demo_public");

        let private = &spec.subnet_tiers[1];
        assert_eq!(private.tier, SubnetTier::PrivateWithEgress);
        assert_eq!(private.cidr_mask, 20);
        assert_eq!(private.name, "demo_private");
    }

    #[test]
    fn new_network_is_named_after_app() {
        let spec = network_spec(&ctx(create_config()), "10.0.0.0/16").expect("spec");
        assert_eq!(spec.name, "demo_vpc");
        assert_eq!(spec.logical_id, "demo_vpc");
        assert_eq!(spec.tags["App"], "demo");
        assert_eq!(spec.tags["Environment"], "dev");
    }

    #[test]
    fn rejects_malformed_cidr() {
        let err = network_spec(&ctx(create_config()), "10.0.0.0").unwrap_err();
        assert_eq!(err.field(), Some("vpcCidr"));
    }

    #[test]
    fn rejects_cidr_too_small_for_private_tier() {
        let err = network_spec(&ctx(create_config()), "10.0.0.0/22").unwrap_err();
        assert!(err.to_string().contains("do not fit"));
    }

    #[test]
    fn rejects_cidr_without_room_for_all_zones() {
        // 3 x (/24 + /20) = 13056 addresses, a /19 holds 8192
        let err = network_spec(&ctx(create_config()), "10.0.0.0/19").unwrap_err();
        assert!(err.to_string().contains("availability zones"));
        assert!(network_spec(&ctx(create_config()), "10.0.0.0/18").is_ok());
    }

    #[test]
    fn parses_cidr_blocks() {
        assert_eq!(
            parse_cidr("10.1.0.0/16"),
            Some((Ipv4Addr::new(10, 1, 0, 0), 16))
        );
        assert_eq!(parse_cidr("10.1.0.0/33"), None);
        assert_eq!(parse_cidr("nonsense/16"), None);
    }

    #[tokio::test]
    async fn create_mode_declares_and_never_looks_up() {
        let mut engine = MockProvisioningEngine::new();
        engine
            .expect_declare_network()
            .times(1)
            .withf(|spec| spec.name == "demo_vpc" && spec.cidr == "10.0.0.0/16")
            .returning(|spec| {
                Ok(NetworkHandle::Created(NetworkRef {
                    vpc_id: format!("${{{}.VpcId}}", spec.logical_id),
                    public_subnet_ids: vec![],
                    private_subnet_ids: vec![],
                }))
            });
        engine.expect_lookup_network().never();

        let handle = resolve_network(&ctx(create_config()), &engine)
            .await
            .expect("network");
        assert!(handle.is_created());
    }

    #[tokio::test]
    async fn lookup_mode_issues_exactly_one_lookup() {
        let mut engine = MockProvisioningEngine::new();
        engine
            .expect_lookup_network()
            .times(1)
            .withf(|region, vpc_id| region == "us-east-1" && vpc_id == "vpc-123")
            .returning(|_, vpc_id| Ok(looked_up(vpc_id)));
        engine.expect_declare_network().never();

        let handle = resolve_network(&ctx(lookup_config("vpc-123")), &engine)
            .await
            .expect("network");
        assert_eq!(handle, looked_up("vpc-123"));
    }

    #[tokio::test]
    async fn lookup_failure_is_surfaced() {
        let mut engine = MockProvisioningEngine::new();
        engine
            .expect_lookup_network()
            .times(1)
            .returning(|region, vpc_id| Err(Error::network_not_found(region, vpc_id)));

        let err = resolve_network(&ctx(lookup_config("vpc-missing")), &engine)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NetworkNotFound { ref vpc_id, .. } if vpc_id == "vpc-missing"));
    }
}
