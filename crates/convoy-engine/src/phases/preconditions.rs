//! Phase 2: precondition evaluation.
//!
//! Preconditions run in declared order and stop early in two distinct ways:
//! a hard failure (API error, unparseable response, compile error) aborts
//! the phase with an error, while an unmatched condition ends it with a
//! business outcome — resources are skipped, the event is still a success.

use convoy_api::HttpApi;
use convoy_config::Precondition;
use serde_json::Value;
use tracing::{info, warn};

use crate::api_call;
use crate::cel::ExpressionCache;
use crate::conditions;
use crate::context::EvaluationContext;
use crate::error::{EngineError, Phase};
use crate::paths;
use crate::phases::run_log_action;
use crate::result::{PreconditionResult, PreconditionsOutcome, Status};

/// Evaluate all preconditions in declared order.
pub async fn execute_all(
    preconditions: &[Precondition],
    api: &dyn HttpApi,
    cel: &ExpressionCache,
    ctx: &mut EvaluationContext,
) -> PreconditionsOutcome {
    let mut results = Vec::with_capacity(preconditions.len());

    for precondition in preconditions {
        let (result, error) = execute_one(precondition, api, cel, ctx).await;
        let matched = result.matched;
        results.push(result);

        if let Some(error) = error {
            ctx.set_execution_error(Phase::Preconditions, &precondition.name, error.to_string());
            return PreconditionsOutcome {
                all_matched: false,
                results,
                error: Some(error),
                not_met_reason: None,
            };
        }

        if !matched {
            let reason = format!(
                "precondition '{}' not met: {}",
                precondition.name,
                format_details(results.last().unwrap())
            );
            return PreconditionsOutcome {
                all_matched: false,
                results,
                error: None,
                not_met_reason: Some(reason),
            };
        }
    }

    PreconditionsOutcome {
        all_matched: true,
        results,
        error: None,
        not_met_reason: None,
    }
}

async fn execute_one(
    precondition: &Precondition,
    api: &dyn HttpApi,
    cel: &ExpressionCache,
    ctx: &mut EvaluationContext,
) -> (PreconditionResult, Option<EngineError>) {
    let mut result = PreconditionResult::new(&precondition.name);

    info!(precondition = %precondition.name, "evaluating precondition");

    if let Some(log) = &precondition.log {
        run_log_action(log, ctx);
    }

    if let Some(spec) = &precondition.api_call {
        let call = match api_call::execute(api, spec, ctx).await {
            Ok(call) => call,
            Err(e) => {
                result.status = Status::Failed;
                result.error = Some(e.to_string());
                return (
                    result,
                    Some(e.in_step(Phase::Preconditions, &precondition.name)),
                );
            }
        };
        result.api_call_made = true;
        result.api_response = Some(call.response.body_text());

        if let Err(e) = call.ensure_success() {
            result.status = Status::Failed;
            result.error = Some(e.to_string());
            return (
                result,
                Some(EngineError::from(e).in_step(Phase::Preconditions, &precondition.name)),
            );
        }

        let body: Value = match serde_json::from_slice(&call.response.body) {
            Ok(body) => body,
            Err(e) => {
                result.status = Status::Failed;
                result.error = Some(format!("failed to parse API response as JSON: {e}"));
                return (
                    result,
                    Some(
                        EngineError::ResponseParse(e)
                            .in_step(Phase::Preconditions, &precondition.name),
                    ),
                );
            }
        };

        // Captures bind into params; lenient by default, fatal when marked
        // required.
        for capture in &precondition.capture {
            match paths::extract(&body, &capture.field) {
                Ok(value) => {
                    result
                        .captured_fields
                        .insert(capture.name.clone(), value.clone());
                    ctx.set_param(&capture.name, value.clone());
                }
                Err(e) if capture.required => {
                    result.status = Status::Failed;
                    result.error = Some(e.to_string());
                    return (
                        result,
                        Some(
                            EngineError::Capture {
                                name: capture.name.clone(),
                                message: e.to_string(),
                            }
                            .in_step(Phase::Preconditions, &precondition.name),
                        ),
                    );
                }
                Err(e) => {
                    warn!(
                        capture = %capture.name,
                        field = %capture.field,
                        "failed to capture field: {e}"
                    );
                }
            }
        }
    }

    if !precondition.conditions.is_empty() {
        let outcome = conditions::evaluate(&precondition.conditions, &ctx.params);
        result.matched = outcome.matched;
        result.condition_results = outcome.results.clone();
        ctx.add_conditions_evaluation(
            Phase::Preconditions,
            &precondition.name,
            outcome.matched,
            outcome.results,
        );
    } else if let Some(expression) = &precondition.expression {
        let outcome = match cel.evaluate(expression, ctx) {
            Ok(outcome) => outcome,
            Err(e) => {
                result.status = Status::Failed;
                result.error = Some(e.to_string());
                return (
                    result,
                    Some(e.in_step(Phase::Preconditions, &precondition.name)),
                );
            }
        };
        result.matched = outcome.matched;
        ctx.add_cel_evaluation(
            Phase::Preconditions,
            &precondition.name,
            expression.clone(),
            outcome.matched,
        );
        result.cel_result = Some(outcome);
    } else {
        // Nothing to check; the precondition is trivially satisfied.
        result.matched = true;
    }

    if result.matched {
        info!(precondition = %precondition.name, "precondition satisfied");
    } else {
        warn!(precondition = %precondition.name, "precondition not satisfied");
    }

    (result, None)
}

/// Describe why a precondition did not match.
fn format_details(result: &PreconditionResult) -> String {
    if let Some(cel) = &result.cel_result {
        if let Some(reason) = &cel.error_reason {
            return format!("expression error: {reason}");
        }
        if !cel.matched {
            return format!("expression '{}' evaluated to false", cel.expression);
        }
    }

    if !result.condition_results.is_empty() {
        return conditions::format_failures(&result.condition_results);
    }

    "no specific details available".to_string()
}
