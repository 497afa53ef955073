//! `convoy validate` — load and validate an adapter config.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the adapter config YAML
    #[arg(short, long, env = "CONVOY_CONFIG")]
    pub config: PathBuf,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let config = convoy_config::load_from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let spec = &config.spec;
    println!(
        "{} {} is valid: {} params, {} preconditions, {} resources, {} payloads, {} post actions",
        config.metadata.name,
        config.metadata.version,
        spec.params.len(),
        spec.preconditions.len(),
        spec.resources.len(),
        spec.post.as_ref().map(|p| p.payloads.len()).unwrap_or(0),
        spec.post.as_ref().map(|p| p.post_actions.len()).unwrap_or(0),
    );

    Ok(())
}
