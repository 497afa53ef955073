//! Phase 4: post-actions.
//!
//! Runs unconditionally once param extraction has succeeded — this is how
//! failures and business skips get reported upstream. Payloads are built
//! first (each becomes a JSON string param), then actions run sequentially,
//! stopping at the first failure.

use convoy_api::HttpApi;
use convoy_config::{PostAction, PostConfig};
use serde_json::Value;
use tracing::{error, info};

use crate::api_call;
use crate::cel::ExpressionCache;
use crate::context::EvaluationContext;
use crate::error::{EngineError, Phase};
use crate::payload;
use crate::phases::run_log_action;
use crate::result::{PostActionResult, Status};

/// Build payloads, then execute every post-action in declared order.
pub async fn execute_all(
    post: Option<&PostConfig>,
    api: &dyn HttpApi,
    cel: &ExpressionCache,
    ctx: &mut EvaluationContext,
) -> (Vec<PostActionResult>, Option<EngineError>) {
    let Some(post) = post else {
        return (Vec::new(), None);
    };

    if let Err(e) = build_payloads(post, cel, ctx) {
        ctx.set_execution_error(Phase::PostActions, "build_payloads", e.to_string());
        return (Vec::new(), Some(e));
    }

    let mut results = Vec::with_capacity(post.post_actions.len());
    for action in &post.post_actions {
        let (result, err) = execute_one(action, api, ctx).await;
        results.push(result);

        if let Some(err) = err {
            error!(action = %action.name, "post action failed: {err}");
            ctx.set_execution_error(Phase::PostActions, &action.name, err.to_string());
            // Remaining actions are not attempted.
            return (results, Some(err));
        }
    }

    (results, None)
}

/// Build every configured payload and bind it as a JSON string param, so
/// post-action body templates can embed it directly.
fn build_payloads(
    post: &PostConfig,
    cel: &ExpressionCache,
    ctx: &mut EvaluationContext,
) -> Result<(), EngineError> {
    for spec in &post.payloads {
        // Validated at load time; missing build here is config drift.
        let Some(build) = &spec.build else {
            return Err(EngineError::PayloadBuild {
                name: spec.name.clone(),
                message: "payload has no build definition".into(),
            }
            .in_step(Phase::PostActions, "build_payloads"));
        };

        let built = payload::build(build, ctx, cel).map_err(|e| {
            EngineError::PayloadBuild {
                name: spec.name.clone(),
                message: e.to_string(),
            }
            .in_step(Phase::PostActions, "build_payloads")
        })?;

        let json = serde_json::to_string(&built).map_err(|e| {
            EngineError::PayloadBuild {
                name: spec.name.clone(),
                message: format!("payload does not serialize: {e}"),
            }
            .in_step(Phase::PostActions, "build_payloads")
        })?;

        ctx.set_param(&spec.name, Value::String(json));
    }

    Ok(())
}

async fn execute_one(
    action: &PostAction,
    api: &dyn HttpApi,
    ctx: &EvaluationContext,
) -> (PostActionResult, Option<EngineError>) {
    let mut result = PostActionResult::new(&action.name);

    info!(action = %action.name, "executing post action");

    if let Some(log) = &action.log {
        run_log_action(log, ctx);
    }

    if let Some(spec) = &action.api_call {
        result.api_call_made = true;

        let call = match api_call::execute(api, spec, ctx).await {
            Ok(call) => call,
            Err(e) => {
                result.status = Status::Failed;
                result.error = Some(e.to_string());
                return (result, Some(e.in_step(Phase::PostActions, &action.name)));
            }
        };

        // Record the response even when the status check fails below.
        result.api_response = Some(call.response.body_text());
        result.http_status = Some(call.response.status);

        if let Err(e) = call.ensure_success() {
            result.status = Status::Failed;
            result.error = Some(e.to_string());
            return (
                result,
                Some(EngineError::from(e).in_step(Phase::PostActions, &action.name)),
            );
        }
    }

    info!(action = %action.name, "post action completed");
    (result, None)
}
