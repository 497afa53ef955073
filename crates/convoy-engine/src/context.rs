//! Per-event evaluation context.
//!
//! One context is created per event and owned by that event's task; there is
//! no cross-event sharing. Phase executors are the only writers. The whole
//! context serializes, so a failed event's state can be logged and replayed
//! against the config.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::conditions::ConditionResult;
use crate::error::Phase;

/// Mutable per-event state: bound params, adapter metadata, the parsed
/// event payload, and the append-only evaluation trail.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationContext {
    pub params: Map<String, Value>,
    pub adapter: AdapterState,
    /// Immutable copy of the parsed event data.
    pub event: Value,
    pub evaluations: Vec<EvaluationRecord>,
}

/// Adapter metadata visible to CEL and payload builds under `adapter`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterState {
    pub name: String,
    pub version: String,
    pub event_id: String,
    /// First hard failure, set exactly once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<ExecutionErrorInfo>,
    /// Business skip (preconditions not met), distinct from failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipInfo>,
}

/// Where the first hard failure happened.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionErrorInfo {
    pub phase: Phase,
    pub step: String,
    pub message: String,
}

/// Why resources were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SkipInfo {
    pub reason: String,
    pub message: String,
}

/// One recorded evaluation (structured conditions or a CEL expression).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub phase: Phase,
    pub step: String,
    pub matched: bool,
    #[serde(flatten)]
    pub detail: EvaluationDetail,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluationDetail {
    Conditions { results: Vec<ConditionResult> },
    Cel { expression: String },
}

impl EvaluationContext {
    /// Create the context for one event.
    pub fn new(
        adapter_name: impl Into<String>,
        adapter_version: impl Into<String>,
        event_id: impl Into<String>,
        event_data: Map<String, Value>,
    ) -> Self {
        Self {
            params: Map::new(),
            adapter: AdapterState {
                name: adapter_name.into(),
                version: adapter_version.into(),
                event_id: event_id.into(),
                execution_error: None,
                skipped: None,
            },
            event: Value::Object(event_data),
            evaluations: Vec::new(),
        }
    }

    /// Bind a param. Later steps in the same event may overwrite it.
    pub fn set_param(&mut self, name: impl Into<String>, value: Value) {
        self.params.insert(name.into(), value);
    }

    /// Look up a bound param.
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Bind every entry of a map as a param.
    pub fn set_params_from(&mut self, values: Map<String, Value>) {
        for (name, value) in values {
            self.params.insert(name, value);
        }
    }

    /// Record the first hard failure; later calls are ignored.
    pub fn set_execution_error(
        &mut self,
        phase: Phase,
        step: impl Into<String>,
        message: impl Into<String>,
    ) {
        if self.adapter.execution_error.is_none() {
            self.adapter.execution_error = Some(ExecutionErrorInfo {
                phase,
                step: step.into(),
                message: message.into(),
            });
        }
    }

    /// Record a business skip (preconditions not met).
    pub fn set_skipped(&mut self, reason: impl Into<String>, message: impl Into<String>) {
        self.adapter.skipped = Some(SkipInfo {
            reason: reason.into(),
            message: message.into(),
        });
    }

    /// Append a structured-conditions evaluation record.
    pub fn add_conditions_evaluation(
        &mut self,
        phase: Phase,
        step: impl Into<String>,
        matched: bool,
        results: Vec<ConditionResult>,
    ) {
        self.evaluations.push(EvaluationRecord {
            phase,
            step: step.into(),
            matched,
            detail: EvaluationDetail::Conditions { results },
        });
    }

    /// Append a CEL evaluation record.
    pub fn add_cel_evaluation(
        &mut self,
        phase: Phase,
        step: impl Into<String>,
        expression: impl Into<String>,
        matched: bool,
    ) {
        self.evaluations.push(EvaluationRecord {
            phase,
            step: step.into(),
            matched,
            detail: EvaluationDetail::Cel {
                expression: expression.into(),
            },
        });
    }

    /// The adapter metadata as a JSON tree, for CEL and payload builds.
    pub fn adapter_value(&self) -> Value {
        serde_json::to_value(&self.adapter).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> EvaluationContext {
        EvaluationContext::new("test-adapter", "0.1.0", "evt-1", Map::new())
    }

    #[test]
    fn params_bind_and_overwrite() {
        let mut ctx = context();
        assert!(ctx.get_param("clusterId").is_none());

        ctx.set_param("clusterId", json!("c-1"));
        assert_eq!(ctx.get_param("clusterId"), Some(&json!("c-1")));

        ctx.set_param("clusterId", json!("c-2"));
        assert_eq!(ctx.get_param("clusterId"), Some(&json!("c-2")));
    }

    #[test]
    fn first_execution_error_wins() {
        let mut ctx = context();
        ctx.set_execution_error(Phase::Preconditions, "check", "boom");
        ctx.set_execution_error(Phase::Resources, "apply", "later");

        let err = ctx.adapter.execution_error.as_ref().unwrap();
        assert_eq!(err.phase, Phase::Preconditions);
        assert_eq!(err.step, "check");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn evaluations_are_append_only_records() {
        let mut ctx = context();
        ctx.add_cel_evaluation(Phase::Preconditions, "a", "params.x == 1", true);
        ctx.add_conditions_evaluation(Phase::Preconditions, "b", false, vec![]);

        assert_eq!(ctx.evaluations.len(), 2);
        assert_eq!(ctx.evaluations[0].step, "a");
        assert!(ctx.evaluations[0].matched);
        assert_eq!(ctx.evaluations[1].step, "b");
        assert!(!ctx.evaluations[1].matched);
    }

    #[test]
    fn adapter_value_exposes_skip_and_error() {
        let mut ctx = context();
        ctx.set_skipped("PreconditionNotMet", "status was pending");

        let adapter = ctx.adapter_value();
        assert_eq!(adapter["name"], "test-adapter");
        assert_eq!(adapter["eventId"], "evt-1");
        assert_eq!(adapter["skipped"]["reason"], "PreconditionNotMet");
        assert!(adapter.get("executionError").is_none());

        ctx.set_execution_error(Phase::Resources, "apply", "boom");
        let adapter = ctx.adapter_value();
        assert_eq!(adapter["executionError"]["phase"], "resources");
    }
}
