//! Recording collaborators for tests and dry runs.
//!
//! Both record every call and succeed. The CLI's replay path uses them so an
//! operator can see exactly what would reach the cluster without applying
//! anything.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::kube::{KubernetesClient, LookupQuery};
use crate::work::{build_manifest_work, ManifestWork, ResourceToApply, WorkTransport};

/// A [`KubernetesClient`] that records applied manifests in memory.
///
/// Lookups answer from a fixed set of seeded objects.
#[derive(Default)]
pub struct RecordingKubernetes {
    applied: Mutex<Vec<Value>>,
    seeded: Mutex<Vec<(LookupQuery, Value)>>,
}

impl RecordingKubernetes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object so `lookup` can find it.
    pub fn seed(&self, query: LookupQuery, object: Value) {
        self.seeded.lock().unwrap().push((query, object));
    }

    /// All manifests applied so far, in order.
    pub fn applied(&self) -> Vec<Value> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl KubernetesClient for RecordingKubernetes {
    async fn apply(&self, manifest: &Value) -> Result<()> {
        info!(
            kind = manifest["kind"].as_str().unwrap_or("?"),
            name = manifest["metadata"]["name"].as_str().unwrap_or("?"),
            "dry-run apply"
        );
        self.applied.lock().unwrap().push(manifest.clone());
        Ok(())
    }

    async fn lookup(&self, query: &LookupQuery) -> Result<Option<Value>> {
        let seeded = self.seeded.lock().unwrap();
        Ok(seeded
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, v)| v.clone()))
    }
}

/// A [`WorkTransport`] that composes wrappers for a fixed consumer id and
/// records them in memory.
pub struct RecordingTransport {
    consumer_id: String,
    published: Mutex<Vec<ManifestWork>>,
}

impl RecordingTransport {
    pub fn new(consumer_id: impl Into<String>) -> Self {
        Self {
            consumer_id: consumer_id.into(),
            published: Mutex::new(Vec::new()),
        }
    }

    /// All wrappers published so far, in order.
    pub fn published(&self) -> Vec<ManifestWork> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkTransport for RecordingTransport {
    async fn apply_work(
        &self,
        template: &ManifestWork,
        resources: &[ResourceToApply],
    ) -> Result<()> {
        let work = build_manifest_work(template, resources, &self.consumer_id)?;
        info!(
            name = %work.metadata.name,
            namespace = %work.metadata.namespace,
            manifests = work.spec.workload.manifests.len(),
            "dry-run manifest work publish"
        );
        self.published.lock().unwrap().push(work);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::{ManifestsTemplate, WorkMetadata, WorkSpec};
    use serde_json::json;

    #[tokio::test]
    async fn recording_kubernetes_applies_and_looks_up() {
        let kube = RecordingKubernetes::new();
        let query = LookupQuery {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            namespace: Some("default".into()),
            name: "cluster-info".into(),
        };
        kube.seed(query.clone(), json!({"data": {"nodes": 3}}));

        kube.apply(&json!({"kind": "Namespace", "metadata": {"name": "ns"}}))
            .await
            .unwrap();

        assert_eq!(kube.applied().len(), 1);
        let found = kube.lookup(&query).await.unwrap().unwrap();
        assert_eq!(found["data"]["nodes"], 3);

        let missing = LookupQuery {
            name: "other".into(),
            ..query
        };
        assert!(kube.lookup(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recording_transport_sets_consumer_namespace() {
        let transport = RecordingTransport::new("cluster-7");
        let template = ManifestWork {
            api_version: String::new(),
            kind: String::new(),
            metadata: WorkMetadata {
                name: "setup".into(),
                ..Default::default()
            },
            spec: WorkSpec {
                workload: ManifestsTemplate {
                    manifests: vec![json!({"kind": "Namespace"})],
                },
            },
        };

        transport.apply_work(&template, &[]).await.unwrap();

        let published = transport.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].metadata.namespace, "cluster-7");
        assert_eq!(published[0].spec.workload.manifests.len(), 1);
    }
}
