//! Engine error taxonomy.
//!
//! Errors are classified by what the broker should do with the event:
//! event-parse and param-extraction failures are permanent (the event itself
//! is bad — acknowledge, do not redeliver); everything else is transient and
//! surfaces through [`crate::Engine::handle`] so the broker NACKs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use convoy_api::ApiError;
use convoy_cluster::ClusterError;

use crate::template::RenderError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// The four fixed phases of per-event execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    ParamExtraction,
    Preconditions,
    Resources,
    PostActions,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::ParamExtraction => "paramExtraction",
            Phase::Preconditions => "preconditions",
            Phase::Resources => "resources",
            Phase::PostActions => "postActions",
        };
        write!(f, "{s}")
    }
}

/// Errors raised while executing an event.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The event payload is not a JSON object. Permanent.
    #[error("event data is not valid JSON: {0}")]
    EventParse(String),

    /// A required parameter could not be extracted. Permanent.
    #[error("parameter '{name}': {message}")]
    ParamExtraction { name: String, message: String },

    /// An API call failed (transport or non-2xx status).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An API response body was not valid JSON.
    #[error("failed to parse API response as JSON: {0}")]
    ResponseParse(#[source] serde_json::Error),

    /// Template rendering failed (strict mode with a missing variable).
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A CEL expression did not compile.
    #[error("expression '{expression}' failed to compile: {message}")]
    CelCompile { expression: String, message: String },

    /// A required response capture missed.
    #[error("required capture '{name}': {message}")]
    Capture { name: String, message: String },

    /// A resource apply or work publish failed.
    #[error(transparent)]
    Apply(#[from] ClusterError),

    /// A post payload tree could not be built.
    #[error("failed to build payload '{name}': {message}")]
    PayloadBuild { name: String, message: String },

    /// A step failed; wraps the underlying error with phase/step context.
    #[error("{phase} step '{step}': {source}")]
    Step {
        phase: Phase,
        step: String,
        #[source]
        source: Box<EngineError>,
    },

    /// The engine was constructed without a required collaborator.
    #[error("engine construction: {0}")]
    Builder(String),

    /// Invariant violation — should not be reachable from valid configs.
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// Wrap an error with the phase and step it occurred in.
    pub fn in_step(self, phase: Phase, step: impl Into<String>) -> Self {
        EngineError::Step {
            phase,
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// True for errors where redelivering the event cannot help.
    pub fn is_permanent(&self) -> bool {
        match self {
            EngineError::EventParse(_) | EngineError::ParamExtraction { .. } => true,
            EngineError::Step { source, .. } => source.is_permanent(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display_matches_wire_names() {
        assert_eq!(Phase::ParamExtraction.to_string(), "paramExtraction");
        assert_eq!(Phase::Preconditions.to_string(), "preconditions");
        assert_eq!(Phase::Resources.to_string(), "resources");
        assert_eq!(Phase::PostActions.to_string(), "postActions");
    }

    #[test]
    fn phase_serde_roundtrip() {
        let json = serde_json::to_string(&Phase::PostActions).unwrap();
        assert_eq!(json, "\"postActions\"");
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Phase::PostActions);
    }

    #[test]
    fn permanence_survives_step_wrapping() {
        let err = EngineError::ParamExtraction {
            name: "clusterId".into(),
            message: "missing".into(),
        }
        .in_step(Phase::ParamExtraction, "extract");
        assert!(err.is_permanent());

        let err = EngineError::ResponseParse(
            serde_json::from_str::<serde_json::Value>("nope").unwrap_err(),
        )
        .in_step(Phase::Preconditions, "check");
        assert!(!err.is_permanent());
    }
}
