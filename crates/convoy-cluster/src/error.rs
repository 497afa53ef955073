//! Cluster collaborator error types.

use thiserror::Error;

/// Result type for cluster operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors from the Kubernetes apply client or the work transport.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A manifest is structurally unusable (missing kind/metadata, wrong shape).
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The apply/patch call failed server-side.
    #[error("apply failed for {kind} '{name}': {message}")]
    ApplyFailed {
        kind: String,
        name: String,
        message: String,
    },

    /// A lookup target does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// The work transport rejected or failed to deliver a ManifestWork.
    #[error("work transport error: {0}")]
    Transport(String),
}
