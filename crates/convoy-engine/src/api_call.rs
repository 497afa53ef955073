//! The API-call step shared by preconditions and post-actions.
//!
//! Renders method, URL, headers, and body against the current params, sends
//! the request through the HTTP collaborator, and classifies the outcome:
//! transport failures error immediately; received responses come back whole
//! so callers can record body and status even when the status check fails.

use std::time::Duration;

use convoy_api::{ApiError, ApiRequest, ApiResponse, HttpApi};
use convoy_config::ApiCallSpec;
use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::Result;
use crate::template::{render, RenderMode};

/// How much response body to carry inside error messages.
const ERROR_BODY_LIMIT: usize = 2048;

/// A completed call: the rendered target plus the raw response.
#[derive(Debug)]
pub struct CompletedCall {
    pub method: String,
    pub url: String,
    pub response: ApiResponse,
}

impl CompletedCall {
    /// Enforce the 2xx contract, shaping the failure with the full
    /// diagnostic context (truncated body included).
    pub fn ensure_success(&self) -> std::result::Result<(), ApiError> {
        if self.response.is_success() {
            return Ok(());
        }
        let mut body = self.response.body_text();
        if body.chars().count() > ERROR_BODY_LIMIT {
            body = body.chars().take(ERROR_BODY_LIMIT).collect();
            body.push('…');
        }
        Err(ApiError::Status {
            method: self.method.clone(),
            url: self.url.clone(),
            status: self.response.status,
            body,
        })
    }
}

/// Render and send one configured call. Errors are transport or request
/// construction failures only; a received non-2xx response is returned as a
/// [`CompletedCall`] for the caller to classify.
pub async fn execute(
    api: &dyn HttpApi,
    spec: &ApiCallSpec,
    ctx: &EvaluationContext,
) -> Result<CompletedCall> {
    let url = render(&spec.url, &ctx.params, RenderMode::Lenient)?;

    let mut headers = Vec::with_capacity(spec.headers.len());
    for (name, value) in &spec.headers {
        headers.push((
            name.clone(),
            render(value, &ctx.params, RenderMode::Lenient)?,
        ));
    }

    let body = match &spec.body {
        Some(template) => Some(render(template, &ctx.params, RenderMode::Lenient)?),
        None => None,
    };

    debug!(method = %spec.method, url = %url, "executing API call");

    let response = api
        .execute(ApiRequest {
            method: spec.method.clone(),
            url: url.clone(),
            headers,
            body,
            timeout: spec.timeout_seconds.map(Duration::from_secs),
        })
        .await?;

    Ok(CompletedCall {
        method: spec.method.clone(),
        url,
        response,
    })
}
