//! CLI command handlers.

pub mod replay;
pub mod serve;
pub mod validate;

use std::sync::Arc;

use anyhow::{Context, Result};
use convoy_api::ReqwestApi;
use convoy_cluster::memory::{RecordingKubernetes, RecordingTransport};
use convoy_config::AdapterConfig;
use convoy_engine::Engine;

/// Assemble an engine with the real HTTP client and dry-run cluster
/// collaborators. Deployments with real cluster access wire their own
/// `KubernetesClient`/`WorkTransport` implementations through
/// `Engine::builder` instead.
pub(crate) fn dry_run_engine(config: AdapterConfig, consumer_id: &str) -> Result<Engine> {
    let api = Arc::new(ReqwestApi::new().context("building HTTP client")?);
    let kubernetes = Arc::new(RecordingKubernetes::new());
    let transport = Arc::new(RecordingTransport::new(consumer_id));

    Engine::builder()
        .config(config)
        .api(api)
        .kubernetes(kubernetes)
        .work_transport(transport)
        .build()
        .context("building engine")
}
