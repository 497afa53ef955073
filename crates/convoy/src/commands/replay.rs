//! `convoy replay` — execute one event from a file and print the result.
//!
//! API calls go to the real control plane; cluster applies are dry-run and
//! reported, so an operator can replay a failed event against the config
//! and see exactly what each phase did.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use convoy_engine::Event;

use super::dry_run_engine;

#[derive(Args)]
pub struct ReplayArgs {
    /// Path to the adapter config YAML
    #[arg(short, long, env = "CONVOY_CONFIG")]
    pub config: PathBuf,

    /// Path to a CloudEvent JSON file ({"id": ..., "data": {...}})
    #[arg(short, long)]
    pub event: PathBuf,

    /// Consumer id used as ManifestWork namespace
    #[arg(long, default_value = "replay", env = "CONVOY_CONSUMER_ID")]
    pub consumer_id: String,
}

pub async fn run(args: ReplayArgs) -> Result<()> {
    let config = convoy_config::load_from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let text = std::fs::read_to_string(&args.event)
        .with_context(|| format!("reading {}", args.event.display()))?;
    let event: Event = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.event.display()))?;

    let engine = dry_run_engine(config, &args.consumer_id)?;
    let result = engine.execute(&event).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
