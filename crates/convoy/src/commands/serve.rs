//! `convoy serve` — consume NDJSON events from stdin.
//!
//! A broker stand-in for local runs and integration tests: each input line
//! is one CloudEvent JSON document, executed through the engine with the
//! ACK/NACK outcome logged. Health endpoints run alongside; readiness flips
//! on once the engine is wired and off again when stdin closes.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use convoy_engine::Event;
use convoy_server::Readiness;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use super::dry_run_engine;

#[derive(Args)]
pub struct ServeArgs {
    /// Path to the adapter config YAML
    #[arg(short, long, env = "CONVOY_CONFIG")]
    pub config: PathBuf,

    /// Health endpoint listen address
    #[arg(long, default_value = "127.0.0.1:8090", env = "CONVOY_HEALTH_ADDR")]
    pub health_addr: SocketAddr,

    /// Consumer id used as ManifestWork namespace
    #[arg(long, default_value = "local", env = "CONVOY_CONSUMER_ID")]
    pub consumer_id: String,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = convoy_config::load_from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let adapter = config.metadata.name.clone();

    let engine = dry_run_engine(config, &args.consumer_id)?;

    let readiness = Readiness::new();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let health = tokio::spawn(convoy_server::serve(
        args.health_addr,
        readiness.clone(),
        async move {
            let _ = shutdown_rx.await;
        },
    ));

    readiness.set(true);
    info!(adapter = %adapter, "consuming events from stdin (one JSON document per line)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping malformed event line: {e}");
                continue;
            }
        };

        let event_id = event.id.clone();
        match engine.handle(event).await {
            Ok(()) => info!(event_id = %event_id, "event acknowledged"),
            // A real broker would redeliver here; stdin has no redelivery.
            Err(e) => error!(event_id = %event_id, "event failed (would NACK): {e}"),
        }
    }

    info!("stdin closed, shutting down");
    readiness.set(false);
    let _ = shutdown_tx.send(());
    health.await?.context("health server")?;

    Ok(())
}
