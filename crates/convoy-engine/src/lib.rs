//! The Convoy execution engine.
//!
//! One event in, one [`ExecutionResult`] out. Each event runs a fixed
//! four-phase program declared in the adapter config:
//!
//! 1. **Parameter extraction** — bind params from the event payload,
//!    environment, literals, and cluster lookups.
//! 2. **Preconditions** — optional API calls with response captures, then
//!    structured conditions or a CEL expression.
//! 3. **Resources** — render manifest templates and apply them (directly or
//!    wrapped as ManifestWork), skipped when preconditions did not match.
//! 4. **Post-actions** — build payloads and report status; always runs once
//!    params extracted, so failures and skips are visible upstream.
//!
//! The engine is strictly sequential per event and shares nothing mutable
//! between events; collaborators (`HttpApi`, `KubernetesClient`,
//! `WorkTransport`) are `Arc`-shared and must be concurrency-safe.

mod api_call;
mod cel;
mod conditions;
mod context;
mod engine;
mod error;
mod event;
mod paths;
mod payload;
mod phases;
mod result;
mod template;

pub use cel::{CelOutcome, ExpressionCache};
pub use conditions::{evaluate as evaluate_conditions, ConditionResult, ConditionsOutcome};
pub use context::{
    AdapterState, EvaluationContext, EvaluationDetail, EvaluationRecord, ExecutionErrorInfo,
    SkipInfo,
};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Phase, Result};
pub use event::Event;
pub use paths::{extract, extract_map, PathError};
pub use payload::build as build_payload;
pub use result::{
    ExecutionResult, PostActionResult, PreconditionResult, PreconditionsOutcome, ResourceResult,
    Status,
};
pub use template::{render, render_value, RenderError, RenderMode};
