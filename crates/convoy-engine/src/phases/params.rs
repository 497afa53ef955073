//! Phase 1: parameter extraction.
//!
//! Binds configured params from the event payload, the environment, literal
//! config values, and cluster lookups, then injects adapter metadata. A
//! required param that yields nothing (and has no default) is fatal and
//! marks the event permanently bad — malformed events are not retried.

use chrono::Utc;
use convoy_cluster::{KubernetesClient, LookupQuery};
use convoy_config::{AdapterMetadata, ParamSource, ParamSpec};
use serde_json::Value;
use tracing::debug;

use crate::context::EvaluationContext;
use crate::error::{EngineError, Phase, Result};
use crate::paths;

/// Extract all configured params plus adapter metadata into the context.
pub async fn execute(
    specs: &[ParamSpec],
    metadata: &AdapterMetadata,
    kubernetes: &dyn KubernetesClient,
    ctx: &mut EvaluationContext,
) -> Result<()> {
    for spec in specs {
        let value = resolve(spec, kubernetes, ctx).await?;

        match value.or_else(|| spec.default.clone()) {
            Some(value) => ctx.set_param(&spec.name, value),
            None if spec.required => {
                return Err(EngineError::ParamExtraction {
                    name: spec.name.clone(),
                    message: "required parameter yielded no value".into(),
                }
                .in_step(Phase::ParamExtraction, &spec.name));
            }
            None => debug!(param = %spec.name, "optional parameter not found, skipping"),
        }
    }

    // Metadata params ride alongside the configured ones.
    ctx.set_param("adapterName", Value::String(metadata.name.clone()));
    ctx.set_param("adapterVersion", Value::String(metadata.version.clone()));
    ctx.set_param("eventId", Value::String(ctx.adapter.event_id.clone()));
    ctx.set_param("timestamp", Value::String(Utc::now().to_rfc3339()));

    Ok(())
}

async fn resolve(
    spec: &ParamSpec,
    kubernetes: &dyn KubernetesClient,
    ctx: &EvaluationContext,
) -> Result<Option<Value>> {
    match &spec.source {
        ParamSource::Event { path } => Ok(paths::extract(&ctx.event, path).ok().cloned()),
        ParamSource::Env { key } => Ok(std::env::var(key).ok().map(Value::String)),
        ParamSource::Literal { value } => Ok(Some(value.clone())),
        ParamSource::Kubernetes {
            api_version,
            kind,
            namespace,
            resource_name,
            path,
        } => {
            let query = LookupQuery {
                api_version: api_version.clone(),
                kind: kind.clone(),
                namespace: namespace.clone(),
                name: resource_name.clone(),
            };
            let object = kubernetes
                .lookup(&query)
                .await
                .map_err(|e| {
                    EngineError::ParamExtraction {
                        name: spec.name.clone(),
                        message: format!("cluster lookup failed: {e}"),
                    }
                    .in_step(Phase::ParamExtraction, &spec.name)
                })?;

            Ok(match (object, path) {
                (Some(object), Some(path)) => paths::extract(&object, path).ok().cloned(),
                (Some(object), None) => Some(object),
                (None, _) => None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_cluster::memory::RecordingKubernetes;
    use serde_json::{json, Map};

    fn metadata() -> AdapterMetadata {
        AdapterMetadata {
            name: "test-adapter".into(),
            version: "0.3.0".into(),
        }
    }

    fn context_with_event(data: Value) -> EvaluationContext {
        EvaluationContext::new(
            "test-adapter",
            "0.3.0",
            "evt-1",
            data.as_object().cloned().unwrap(),
        )
    }

    fn event_param(name: &str, path: &str, required: bool) -> ParamSpec {
        ParamSpec {
            name: name.into(),
            source: ParamSource::Event { path: path.into() },
            required,
            default: None,
        }
    }

    #[tokio::test]
    async fn extracts_event_literal_and_metadata_params() {
        let kube = RecordingKubernetes::new();
        let mut ctx = context_with_event(json!({"cluster": {"id": "c-1"}}));

        let specs = vec![
            event_param("clusterId", "cluster.id", true),
            ParamSpec {
                name: "phase".into(),
                source: ParamSource::Literal {
                    value: json!("Provisioned"),
                },
                required: false,
                default: None,
            },
        ];

        execute(&specs, &metadata(), &kube, &mut ctx).await.unwrap();

        assert_eq!(ctx.get_param("clusterId"), Some(&json!("c-1")));
        assert_eq!(ctx.get_param("phase"), Some(&json!("Provisioned")));
        assert_eq!(ctx.get_param("adapterName"), Some(&json!("test-adapter")));
        assert_eq!(ctx.get_param("adapterVersion"), Some(&json!("0.3.0")));
        assert_eq!(ctx.get_param("eventId"), Some(&json!("evt-1")));
        assert!(ctx.get_param("timestamp").is_some());
    }

    #[tokio::test]
    async fn missing_required_param_is_fatal_and_permanent() {
        let kube = RecordingKubernetes::new();
        let mut ctx = context_with_event(json!({}));

        let err = execute(
            &[event_param("clusterId", "cluster.id", true)],
            &metadata(),
            &kube,
            &mut ctx,
        )
        .await
        .unwrap_err();

        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn missing_optional_param_is_skipped() {
        let kube = RecordingKubernetes::new();
        let mut ctx = context_with_event(json!({}));

        execute(
            &[event_param("clusterId", "cluster.id", false)],
            &metadata(),
            &kube,
            &mut ctx,
        )
        .await
        .unwrap();

        assert!(ctx.get_param("clusterId").is_none());
    }

    #[tokio::test]
    async fn default_fills_missing_value() {
        let kube = RecordingKubernetes::new();
        let mut ctx = context_with_event(json!({}));

        let spec = ParamSpec {
            name: "region".into(),
            source: ParamSource::Event {
                path: "cluster.region".into(),
            },
            required: true,
            default: Some(json!("us-east-1")),
        };

        execute(&[spec], &metadata(), &kube, &mut ctx).await.unwrap();
        assert_eq!(ctx.get_param("region"), Some(&json!("us-east-1")));
    }

    #[tokio::test]
    async fn env_param_reads_process_environment() {
        let kube = RecordingKubernetes::new();
        let mut ctx = context_with_event(json!({}));
        std::env::set_var("CONVOY_TEST_REGION", "eu-west-1");

        let spec = ParamSpec {
            name: "region".into(),
            source: ParamSource::Env {
                key: "CONVOY_TEST_REGION".into(),
            },
            required: true,
            default: None,
        };

        execute(&[spec], &metadata(), &kube, &mut ctx).await.unwrap();
        assert_eq!(ctx.get_param("region"), Some(&json!("eu-west-1")));
        std::env::remove_var("CONVOY_TEST_REGION");
    }

    #[tokio::test]
    async fn kubernetes_param_walks_lookup_result() {
        let kube = RecordingKubernetes::new();
        kube.seed(
            LookupQuery {
                api_version: "v1".into(),
                kind: "ConfigMap".into(),
                namespace: Some("default".into()),
                name: "cluster-info".into(),
            },
            json!({"data": {"nodes": "3"}}),
        );
        let mut ctx = context_with_event(json!({}));

        let spec = ParamSpec {
            name: "nodeCount".into(),
            source: ParamSource::Kubernetes {
                api_version: "v1".into(),
                kind: "ConfigMap".into(),
                namespace: Some("default".into()),
                resource_name: "cluster-info".into(),
                path: Some("data.nodes".into()),
            },
            required: true,
            default: None,
        };

        execute(&[spec], &metadata(), &kube, &mut ctx).await.unwrap();
        assert_eq!(ctx.get_param("nodeCount"), Some(&json!("3")));
    }
}
