//! Shared, read-only synthesis context
//!
//! Holds the resolved configuration together with the process-wide tags that
//! every declared resource carries. Builders receive it by reference; nothing
//! in it changes after construction.

use std::collections::BTreeMap;

use crate::config::EnvironmentConfig;

/// Tag key carrying the application name
pub const APP_TAG: &str = "App";

/// Tag key carrying the environment name
pub const ENVIRONMENT_TAG: &str = "Environment";

/// Name of the stack every resource is declared in
pub const STACK_NAME: &str = "EksBootstrapStack";

/// Immutable context threaded through every builder
#[derive(Clone, Debug)]
pub struct SynthContext {
    config: EnvironmentConfig,
    tags: BTreeMap<String, String>,
}

impl SynthContext {
    /// Create a context, deriving the global tags from the configuration
    pub fn new(config: EnvironmentConfig) -> Self {
        let tags = BTreeMap::from([
            (APP_TAG.to_string(), config.app_name.clone()),
            (ENVIRONMENT_TAG.to_string(), config.env.clone()),
        ]);
        Self { config, tags }
    }

    /// The resolved environment configuration
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Tags applied to every declared resource
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Global tags with resource-specific tags layered on top
    pub fn tags_with(&self, extra: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut tags = self.tags.clone();
        tags.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        tags
    }

    /// Prefix a resource name with the application name (`<app>_<suffix>`)
    pub fn resource_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.config.app_name, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkSource;

    fn config() -> EnvironmentConfig {
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

    #[test]
    fn global_tags_carry_app_and_environment() {
        let ctx = SynthContext::new(config());
        assert_eq!(ctx.tags().len(), 2);
        assert_eq!(ctx.tags()[APP_TAG], "demo");
        assert_eq!(ctx.tags()[ENVIRONMENT_TAG], "dev");
    }

    #[test]
    fn resource_tags_layer_over_global_tags() {
        let ctx = SynthContext::new(config());
        let extra = BTreeMap::from([("BizFun".to_string(), "system".to_string())]);
        let tags = ctx.tags_with(&extra);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags["BizFun"], "system");
        assert_eq!(tags[APP_TAG], "demo");
    }

    #[test]
    fn resource_names_are_app_prefixed() {
        let ctx = SynthContext::new(config());
        assert_eq!(ctx.resource_name("eks"), "demo_eks");
        assert_eq!(ctx.resource_name("vpc"), "demo_vpc");
    }
}
