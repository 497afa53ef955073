//! Kubernetes collaborator trait.
//!
//! The engine never talks to a cluster directly; it holds an
//! `Arc<dyn KubernetesClient>` and hands it fully rendered manifests.
//! Real implementations live outside this repo (they wrap whatever client
//! the deployment uses); tests and the CLI dry-run path use
//! [`crate::memory::RecordingKubernetes`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A lookup against the cluster, used by parameter extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

/// Create-or-update apply plus read access, object-safe.
///
/// Implementations must be safe for concurrent use; one instance is shared
/// across all in-flight events.
#[async_trait]
pub trait KubernetesClient: Send + Sync {
    /// Server-side create-or-update of a rendered manifest. The manifest is
    /// a JSON tree with `apiVersion`, `kind`, `metadata`, and whatever else
    /// the resource kind carries.
    async fn apply(&self, manifest: &Value) -> Result<()>;

    /// Fetch an object; `Ok(None)` when it does not exist.
    async fn lookup(&self, query: &LookupQuery) -> Result<Option<Value>>;
}

/// Shared trait-object handle used throughout the engine.
pub type SharedKubernetes = Arc<dyn KubernetesClient>;
