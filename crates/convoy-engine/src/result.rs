//! Per-step and per-event outcome records.
//!
//! Results are what gets logged and returned to operators; control-flow
//! errors travel separately so a failed step still leaves its record behind.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cel::CelOutcome;
use crate::conditions::ConditionResult;
use crate::context::EvaluationContext;
use crate::error::{EngineError, Phase};

/// Step/event status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Outcome of one precondition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreconditionResult {
    pub name: String,
    pub status: Status,
    pub matched: bool,
    pub captured_fields: Map<String, Value>,
    pub api_call_made: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_response: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub condition_results: Vec<ConditionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cel_result: Option<CelOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreconditionResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Success,
            matched: false,
            captured_fields: Map::new(),
            api_call_made: false,
            api_response: None,
            condition_results: Vec::new(),
            cel_result: None,
            error: None,
        }
    }
}

/// Outcome of the whole precondition phase.
#[derive(Debug)]
pub struct PreconditionsOutcome {
    pub all_matched: bool,
    pub results: Vec<PreconditionResult>,
    pub error: Option<EngineError>,
    pub not_met_reason: Option<String>,
}

/// Outcome of one resource step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResult {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one post-action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostActionResult {
    pub name: String,
    pub status: Status,
    pub api_call_made: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostActionResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Success,
            api_call_made: false,
            api_response: None,
            http_status: None,
            error: None,
        }
    }
}

/// The final per-event record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub event_id: String,
    pub status: Status,
    pub phase: Phase,
    pub resources_skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    /// The control-flow error, when failed. Not serialized; `errorReason`
    /// plus the execution context carry the operator-facing detail.
    #[serde(skip)]
    pub error: Option<EngineError>,
    pub params: Map<String, Value>,
    pub precondition_results: Vec<PreconditionResult>,
    pub resource_results: Vec<ResourceResult>,
    pub post_action_results: Vec<PostActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_context: Option<EvaluationContext>,
}

impl ExecutionResult {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            status: Status::Success,
            phase: Phase::ParamExtraction,
            resources_skipped: false,
            skip_reason: None,
            error_reason: None,
            error: None,
            params: Map::new(),
            precondition_results: Vec::new(),
            resource_results: Vec::new(),
            post_action_results: Vec::new(),
            execution_context: None,
        }
    }
}
