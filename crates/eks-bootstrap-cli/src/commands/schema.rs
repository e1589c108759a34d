//! Schema command

use schemars::schema_for;

use eks_bootstrap_common::RawEnvironment;

use crate::Result;

pub fn run() -> Result<()> {
    println!("{}", environment_schema()?);
    Ok(())
}

/// JSON schema of one environment entry
pub fn environment_schema() -> Result<String> {
    let schema = schema_for!(RawEnvironment);
    Ok(serde_json::to_string_pretty(&schema)?)
}
