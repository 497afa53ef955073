//! ManifestWork wrapper model and composition.
//!
//! A ManifestWork is an envelope delivered to a remote cluster by the work
//! transport: metadata naming the work, plus a workload of embedded
//! manifests. Composition takes a rendered wrapper template and decides
//! which workload manifests ship: concrete resources supplied by the caller
//! replace the embedded ones; otherwise the template's own workload is used
//! as-is. The template is never mutated.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClusterError, Result};

/// Annotation carrying the config generation that produced a wrapper.
/// Preserved verbatim through composition.
pub const ANNOTATION_GENERATION: &str = "convoy.io/generation";

/// API version stamped on composed wrappers that omit one.
pub const WORK_API_VERSION: &str = "work.open-cluster-management.io/v1";

/// The ManifestWork envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestWork {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: WorkMetadata,
    #[serde(default)]
    pub spec: WorkSpec,
}

/// Wrapper identity. `namespace` is the consumer id of the target cluster,
/// set at composition time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkMetadata {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSpec {
    #[serde(default)]
    pub workload: ManifestsTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestsTemplate {
    #[serde(default)]
    pub manifests: Vec<Value>,
}

/// A workload entry offered to composition. `manifest: None` means "use the
/// wrapper's embedded workload for this entry".
#[derive(Debug, Clone)]
pub struct ResourceToApply {
    pub name: String,
    pub manifest: Option<Value>,
}

/// Compose the wrapper that ships to the consumer cluster.
///
/// - `namespace` is set to `consumer_id`; all other template metadata is
///   preserved verbatim.
/// - If at least one entry in `resources` carries a concrete manifest, the
///   workload is replaced by those manifests (nil entries skipped).
///   Otherwise the template's embedded workload is used unchanged.
///
/// The template is cloned up front; the caller's value is untouched.
pub fn build_manifest_work(
    template: &ManifestWork,
    resources: &[ResourceToApply],
    consumer_id: &str,
) -> Result<ManifestWork> {
    if template.metadata.name.is_empty() {
        return Err(ClusterError::InvalidManifest(
            "manifest work template has no metadata.name".into(),
        ));
    }

    let mut work = template.clone();
    work.metadata.namespace = consumer_id.to_string();
    if work.api_version.is_empty() {
        work.api_version = WORK_API_VERSION.to_string();
    }
    if work.kind.is_empty() {
        work.kind = "ManifestWork".to_string();
    }

    let concrete: Vec<Value> = resources
        .iter()
        .filter_map(|r| r.manifest.clone())
        .collect();
    if !concrete.is_empty() {
        work.spec.workload.manifests = concrete;
    }

    Ok(work)
}

/// Delivery of composed wrappers to remote clusters, object-safe.
///
/// Implementations own the consumer id of the cluster they publish to and
/// are expected to be idempotent per wrapper name (create-or-update).
#[async_trait]
pub trait WorkTransport: Send + Sync {
    /// Compose and deliver. `resources` follows the replacement policy of
    /// [`build_manifest_work`].
    async fn apply_work(
        &self,
        template: &ManifestWork,
        resources: &[ResourceToApply],
    ) -> Result<()>;
}

/// Shared trait-object handle used throughout the engine.
pub type SharedWorkTransport = Arc<dyn WorkTransport>;
