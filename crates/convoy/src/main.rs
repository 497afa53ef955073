//! Convoy — declarative CloudEvent → API/workload adapter.
//!
//! Main entry point for the Convoy CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{replay, serve, validate};

/// Convoy - declarative CloudEvent to API/workload adapter
#[derive(Parser)]
#[command(name = "convoy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate an adapter config
    Validate(validate::ValidateArgs),

    /// Execute a single event file against the config (dry-run apply)
    Replay(replay::ReplayArgs),

    /// Consume NDJSON events on stdin with health endpoints
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "convoy=debug,convoy_engine=debug,convoy_api=debug,convoy_cluster=debug,info"
    } else {
        "convoy=info,convoy_engine=info,convoy_api=info,convoy_cluster=info,warn"
    };
    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Validate(args) => validate::run(args),
        Commands::Replay(args) => replay::run(args).await,
        Commands::Serve(args) => serve::run(args).await,
    }
}
