//! Synth command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use eks_bootstrap_common::{ContextDocument, EnvironmentConfig, SynthContext};
use eks_bootstrap_topology::{synthesize, Assembly, LookupCache, RecordingEngine};

use super::{OutputFormat, DEFAULT_CONTEXT_FILE};
use crate::Result;

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Environment to synthesize
    #[arg(long, env = "EKS_BOOTSTRAP_ENV")]
    pub env: Option<String>,

    /// Context file holding the environment entries
    #[arg(long, default_value = DEFAULT_CONTEXT_FILE)]
    pub context: PathBuf,

    /// Lookup cache with known networks and principals
    #[arg(long)]
    pub lookups: Option<PathBuf>,

    /// Write the assembly here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub async fn run(args: SynthArgs) -> Result<()> {
    let assembly = synthesize_assembly(&args).await?;
    let rendered = render_assembly(&assembly, args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!(
                path = %path.display(),
                resources = assembly.resources.len(),
                "wrote assembly"
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Render an assembly in the requested format
pub fn render_assembly(assembly: &Assembly, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => assembly.to_json()?,
        OutputFormat::Yaml => serde_yaml::to_string(assembly)?,
    })
}

/// Resolve the selected environment and record its topology
pub async fn synthesize_assembly(args: &SynthArgs) -> Result<Assembly> {
    // Checked before touching any file so a missing selector fails fast
    let selector = args.env.as_deref().filter(|s| !s.trim().is_empty());
    if selector.is_none() {
        return Err(eks_bootstrap_common::Error::configuration_missing(
            "environment selector is required: pass --env <name> or set EKS_BOOTSTRAP_ENV",
        )
        .into());
    }

    let document = ContextDocument::from_path(&args.context)?;
    let config = EnvironmentConfig::resolve(selector, &document)?;
    let ctx = SynthContext::new(config);

    let lookups = match &args.lookups {
        Some(path) => LookupCache::from_path(path)?,
        None => LookupCache::default(),
    };

    info!(
        env = %ctx.config().env,
        region = %ctx.config().region,
        account = %ctx.config().account_id,
        "synthesizing"
    );
    let engine = RecordingEngine::new(&ctx, lookups);
    synthesize(&ctx, &engine).await?;
    Ok(engine.into_assembly(&ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const CONTEXT: &str = r#"{
        "context": {
            "dev": {
                "region": "us-east-1",
                "createVpc": "true",
                "vpcCidr": "10.0.0.0/16",
                "appName": "demo",
                "accountId": "123456789012",
                "iamUser": "admin",
                "ec2SSHKey": "demo-key"
            },
            "prod": {
                "region": "us-east-1",
                "vpcId": "vpc-123",
                "appName": "demo",
                "accountId": "123456789012",
                "iamUser": "admin",
                "ec2SSHKey": "demo-key"
            }
        }
    }"#;

    fn args(dir: &Path, env: Option<&str>) -> SynthArgs {
        let context = dir.join("cdk.json");
        std::fs::write(&context, CONTEXT).unwrap();
        SynthArgs {
            env: env.map(str::to_string),
            context,
            lookups: None,
            output: None,
            format: OutputFormat::Json,
        }
    }

    #[tokio::test]
    async fn missing_selector_fails_before_reading_context() {
        let args = SynthArgs {
            env: None,
            context: PathBuf::from("/nonexistent/cdk.json"),
            lookups: None,
            output: None,
            format: OutputFormat::Json,
        };
        let err = synthesize_assembly(&args).await.unwrap_err();
        assert!(err.is_configuration_missing());
    }

    #[tokio::test]
    async fn blank_selector_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = synthesize_assembly(&args(dir.path(), Some("  ")))
            .await
            .unwrap_err();
        assert!(err.is_configuration_missing());
    }

    #[tokio::test]
    async fn synthesizes_create_mode_environment() {
        let dir = tempfile::tempdir().unwrap();
        let assembly = synthesize_assembly(&args(dir.path(), Some("dev")))
            .await
            .expect("assembly");
        assert_eq!(assembly.resources.len(), 6);
        assert_eq!(assembly.tags["Environment"], "dev");
        assert!(assembly.resource("demo_eks").is_some());
    }

    #[tokio::test]
    async fn lookup_mode_needs_cached_network() {
        let dir = tempfile::tempdir().unwrap();
        let err = synthesize_assembly(&args(dir.path(), Some("prod")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("vpc-123"));

        let lookups = dir.path().join("lookups.json");
        std::fs::write(
            &lookups,
            r#"{"networks": [{"region": "us-east-1", "vpcId": "vpc-123",
                "privateSubnetIds": ["subnet-a", "subnet-b"]}]}"#,
        )
        .unwrap();
        let mut with_lookups = args(dir.path(), Some("prod"));
        with_lookups.lookups = Some(lookups);
        let assembly = synthesize_assembly(&with_lookups).await.expect("assembly");
        assert_eq!(assembly.resources.len(), 5);
    }

    #[tokio::test]
    async fn renders_assembly_as_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let assembly = synthesize_assembly(&args(dir.path(), Some("dev")))
            .await
            .expect("assembly");

        let json = render_assembly(&assembly, OutputFormat::Json).unwrap();
        assert_eq!(json, assembly.to_json().unwrap());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["stackName"], "EksBootstrapStack");

        let yaml = render_assembly(&assembly, OutputFormat::Yaml).unwrap();
        assert!(yaml.starts_with("stackName: EksBootstrapStack\n"));
    }

    #[tokio::test]
    async fn writes_yaml_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("assembly.yaml");
        let mut synth = args(dir.path(), Some("dev"));
        synth.output = Some(output.clone());
        synth.format = OutputFormat::Yaml;

        run(synth).await.expect("run");
        let written = std::fs::read_to_string(output).unwrap();
        assert!(written.contains("stackName: EksBootstrapStack"));
    }

    #[tokio::test]
    async fn unknown_environment_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = synthesize_assembly(&args(dir.path(), Some("qa")))
            .await
            .unwrap_err();
        assert!(!err.is_configuration_missing());
        assert!(err.to_string().contains("'qa' not found"));
    }
}
