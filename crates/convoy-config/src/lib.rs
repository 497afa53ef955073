//! Adapter configuration for Convoy.
//!
//! A single YAML document declares the per-event program: parameter
//! extraction rules, preconditions, resource templates, and post-actions.
//! This crate owns the schema, the loader (with `templateRef`/`buildRef`
//! inlining), and structural validation. The loaded config is immutable and
//! shared read-only across in-flight events.

mod error;
mod loader;
mod types;

pub use error::{ConfigError, Result};
pub use loader::{load_from_path, load_from_str, validate};
pub use types::{
    AdapterConfig, AdapterMetadata, AdapterSpec, ApiCallSpec, ApplyTarget, CaptureSpec, Condition,
    LogAction, LogLevel, Operator, ParamSource, ParamSpec, PayloadSpec, PostAction, PostConfig,
    Precondition, Resource,
};
