//! Envs command

use std::path::{Path, PathBuf};

use clap::Args;

use eks_bootstrap_common::ContextDocument;

use super::DEFAULT_CONTEXT_FILE;
use crate::Result;

#[derive(Args, Debug)]
pub struct EnvsArgs {
    /// Context file holding the environment entries
    #[arg(long, default_value = DEFAULT_CONTEXT_FILE)]
    pub context: PathBuf,
}

pub fn run(args: EnvsArgs) -> Result<()> {
    for name in environment_names(&args.context)? {
        println!("{name}");
    }
    Ok(())
}

/// Environment names defined in a context file, sorted
pub fn environment_names(path: &Path) -> Result<Vec<String>> {
    let document = ContextDocument::from_path(path)?;
    let mut names: Vec<String> = document
        .environments()
        .into_iter()
        .map(str::to_string)
        .collect();
    names.sort();
    Ok(names)
}
