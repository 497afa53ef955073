//! API client error types.

use thiserror::Error;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors from calls against the control-plane API.
///
/// `Transport` covers everything that prevented a response from arriving;
/// `Status` is a response outside the 2xx range, carrying the full body for
/// diagnostics. Both are transient from the broker's point of view.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("{method} {url}: transport error: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// A response arrived with a non-2xx status.
    #[error("{method} {url}: unexpected status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The request could not be constructed (bad method or URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// True for errors where a response was never received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    /// The HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
