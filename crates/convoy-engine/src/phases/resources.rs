//! Phase 3: resource application.
//!
//! Each resource's template is rendered on a fresh copy (the config tree is
//! never touched) and handed to the configured apply target. The first apply
//! error is fatal to the phase; earlier successes keep their records.

use convoy_cluster::{KubernetesClient, ManifestWork, ResourceToApply, WorkTransport};
use convoy_config::{ApplyTarget, Resource};
use tracing::info;

use crate::context::EvaluationContext;
use crate::error::{EngineError, Phase};
use crate::phases::run_log_action;
use crate::result::{ResourceResult, Status};
use crate::template::{render_value, RenderMode};

/// Apply all resources in declared order; stop on the first failure.
pub async fn execute_all(
    resources: &[Resource],
    kubernetes: &dyn KubernetesClient,
    transport: Option<&dyn WorkTransport>,
    ctx: &mut EvaluationContext,
) -> (Vec<ResourceResult>, Option<EngineError>) {
    let mut results = Vec::with_capacity(resources.len());

    for resource in resources {
        let (result, error) = execute_one(resource, kubernetes, transport, ctx).await;
        results.push(result);

        if let Some(error) = error {
            ctx.set_execution_error(Phase::Resources, &resource.name, error.to_string());
            return (results, Some(error));
        }
    }

    (results, None)
}

async fn execute_one(
    resource: &Resource,
    kubernetes: &dyn KubernetesClient,
    transport: Option<&dyn WorkTransport>,
    ctx: &EvaluationContext,
) -> (ResourceResult, Option<EngineError>) {
    let mut result = ResourceResult {
        name: resource.name.clone(),
        status: Status::Success,
        rendered: None,
        error: None,
    };

    if let Some(log) = &resource.log {
        run_log_action(log, ctx);
    }

    // Validated at load time; a missing template here is config drift.
    let Some(template) = &resource.template else {
        let error = EngineError::Internal(format!("resource '{}' has no template", resource.name))
            .in_step(Phase::Resources, &resource.name);
        result.status = Status::Failed;
        result.error = Some(error.to_string());
        return (result, Some(error));
    };

    let rendered = match render_value(template, &ctx.params, RenderMode::Lenient) {
        Ok(rendered) => rendered,
        Err(e) => {
            result.status = Status::Failed;
            result.error = Some(e.to_string());
            return (
                result,
                Some(EngineError::from(e).in_step(Phase::Resources, &resource.name)),
            );
        }
    };
    result.rendered = Some(rendered.clone());

    let applied = match resource.target {
        ApplyTarget::Kubernetes => kubernetes.apply(&rendered).await.map_err(EngineError::from),
        ApplyTarget::ManifestWork => match transport {
            Some(transport) => {
                match serde_json::from_value::<ManifestWork>(rendered) {
                    Ok(work) => {
                        // The engine ships the wrapper as-is; its embedded
                        // workload is the manifest source.
                        let resources_to_apply = [ResourceToApply {
                            name: resource.name.clone(),
                            manifest: None,
                        }];
                        transport
                            .apply_work(&work, &resources_to_apply)
                            .await
                            .map_err(EngineError::from)
                    }
                    Err(e) => Err(EngineError::Internal(format!(
                        "rendered template is not a ManifestWork: {e}"
                    ))),
                }
            }
            None => Err(EngineError::Builder(
                "resource targets manifestWork but no work transport is configured".into(),
            )),
        },
    };

    if let Err(e) = applied {
        let error = e.in_step(Phase::Resources, &resource.name);
        result.status = Status::Failed;
        result.error = Some(error.to_string());
        return (result, Some(error));
    }

    info!(resource = %resource.name, target = ?resource.target, "resource applied");
    (result, None)
}
