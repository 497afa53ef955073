//! HTTP client trait and reqwest implementation.
//!
//! The engine talks to the control plane through the object-safe [`HttpApi`]
//! trait so tests can substitute an in-memory client. The real
//! implementation wraps a single shared `reqwest::Client`, which is safe for
//! concurrent use across events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Result};

/// Default timeout applied when a call does not specify its own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully rendered HTTP request, ready to send.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Convenience constructor for a body-less request.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }
}

/// A received response. Non-2xx statuses are *not* errors at this layer;
/// classification is the caller's job (it owns the full diagnostic context).
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// True when the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as UTF-8, lossy.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Object-safe HTTP collaborator.
///
/// Implementations must be safe for concurrent use; the engine shares one
/// instance across all in-flight events as `Arc<dyn HttpApi>`.
#[async_trait]
pub trait HttpApi: Send + Sync {
    /// Send the request and return the response, or a transport error if no
    /// response arrived.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Shared trait-object handle used throughout the engine.
pub type SharedHttpApi = Arc<dyn HttpApi>;

/// Production [`HttpApi`] backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestApi {
    http: reqwest::Client,
}

impl ReqwestApi {
    /// Build a client with the default timeout.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpApi for ReqwestApi {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("bad method '{}'", request.method)))?;
        let url = Url::parse(&request.url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad url '{}': {e}", request.url)))?;

        let mut builder = self.http.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(method = %request.method, url = %request.url, "sending API request");

        let response = builder.send().await.map_err(|e| ApiError::Transport {
            method: request.method.clone(),
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport {
                method: request.method.clone(),
                url: request.url.clone(),
                message: format!("reading response body: {e}"),
            })?
            .to_vec();

        debug!(status, bytes = body.len(), "API response received");

        Ok(ApiResponse { status, body })
    }
}
