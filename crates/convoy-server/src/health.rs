//! Liveness and readiness endpoints.
//!
//! Liveness (`/healthz`) answers 200 as long as the process runs. Readiness
//! (`/readyz`) answers 200 once the ready flag is set and 503 before that —
//! the flag is the only process-wide mutable state, flipped after startup
//! wiring completes and cleared on shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

/// Health endpoint response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Process-wide readiness flag, shared with the health routes.
#[derive(Clone, Default)]
pub struct Readiness {
    ready: Arc<AtomicBool>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the process ready (or not) to accept traffic.
    pub fn set(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

async fn healthz() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            message: None,
        }),
    )
}

async fn readyz(State(readiness): State<Readiness>) -> (StatusCode, Json<HealthResponse>) {
    if readiness.is_ready() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                message: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error",
                message: Some("not ready"),
            }),
        )
    }
}

/// Build the health router.
pub fn health_routes(readiness: Readiness) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(readiness)
}

/// Serve health endpoints until `shutdown` resolves.
pub async fn serve(
    addr: std::net::SocketAddr,
    readiness: Readiness,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("health server listening on {addr}");

    axum::serve(listener, health_routes(readiness))
        .with_graceful_shutdown(shutdown)
        .await
}
