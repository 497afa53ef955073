//! Adapter configuration schema.
//!
//! An adapter config is a single YAML document describing the per-event
//! program: which parameters to extract, which preconditions to check
//! against the control-plane API, which resources to materialize, and which
//! post-actions report status back. The document is read-only once loaded
//! and shared across events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root of the adapter config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Schema version, e.g. `convoy.io/v1alpha1`.
    pub api_version: String,
    /// Document kind; always `Adapter`.
    pub kind: String,
    /// Adapter identity.
    pub metadata: AdapterMetadata,
    /// The per-event program.
    pub spec: AdapterSpec,
}

/// Adapter identity, injected into the evaluation context as metadata params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterMetadata {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// The four declarative sections executed per event, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterSpec {
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub post: Option<PostConfig>,
}

/// A single parameter extraction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Name the value is bound to in the evaluation context.
    pub name: String,
    #[serde(flatten)]
    pub source: ParamSource,
    /// Fatal if the source yields nothing and no default is set.
    #[serde(default)]
    pub required: bool,
    /// Fallback when the source yields nothing.
    #[serde(default)]
    pub default: Option<Value>,
}

/// Where a parameter value comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ParamSource {
    /// A dotted path into the parsed event data.
    Event { path: String },
    /// A process environment variable.
    Env { key: String },
    /// A literal value from the config itself.
    Literal { value: Value },
    /// A lookup against the cluster, with an optional dotted path into the
    /// returned object.
    Kubernetes {
        api_version: String,
        kind: String,
        #[serde(default)]
        namespace: Option<String>,
        resource_name: String,
        #[serde(default)]
        path: Option<String>,
    },
}

/// A named check: optional API call, response captures, then either
/// structured conditions or one CEL expression (never both).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    pub name: String,
    #[serde(default)]
    pub log: Option<LogAction>,
    #[serde(default)]
    pub api_call: Option<ApiCallSpec>,
    #[serde(default)]
    pub capture: Vec<CaptureSpec>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub expression: Option<String>,
}

/// Copy a value out of an API response into a named param.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSpec {
    /// Dotted path into the JSON-decoded response body.
    pub field: String,
    /// Param name to bind the value to.
    pub name: String,
    /// Lenient by default: a miss logs a warning and leaves the param unset.
    #[serde(default)]
    pub required: bool,
}

/// One structured condition; all conditions in a precondition are AND-ed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path into the evaluation context params.
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Option<Value>,
}

/// The closed operator set for structured conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Exists,
    NotExists,
    In,
    NotIn,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    Matches,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Exists => "exists",
            Operator::NotExists => "notExists",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Contains => "contains",
            Operator::Matches => "matches",
        };
        write!(f, "{s}")
    }
}

/// An HTTP call descriptor. Method, URL, headers, and body are templates
/// rendered against the evaluation context before the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallSpec {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// A templated log line emitted while executing a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogAction {
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
}

/// Log severity for [`LogAction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// A named resource template applied to the cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub log: Option<LogAction>,
    /// Inline manifest template. All string leaves (keys included) are
    /// rendered before apply.
    #[serde(default)]
    pub template: Option<Value>,
    /// Path to a YAML file holding the template, relative to the config
    /// document. Inlined into `template` at load time.
    #[serde(default)]
    pub template_ref: Option<String>,
    #[serde(default)]
    pub target: ApplyTarget,
}

/// How a rendered resource reaches the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyTarget {
    /// Create-or-update directly through the Kubernetes client.
    #[default]
    Kubernetes,
    /// Wrap into a ManifestWork and hand to the work transport.
    ManifestWork,
}

/// The post phase: payloads are built first, then actions run in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConfig {
    #[serde(default)]
    pub payloads: Vec<PayloadSpec>,
    #[serde(default)]
    pub post_actions: Vec<PostAction>,
}

/// A named payload built from a declarative tree whose leaves may be CEL
/// expressions, literal values, or templated strings. The built tree is
/// JSON-serialized and bound into params under `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadSpec {
    pub name: String,
    #[serde(default)]
    pub build: Option<Value>,
    /// Path to a YAML file holding the build tree, relative to the config
    /// document. Inlined into `build` at load time.
    #[serde(default)]
    pub build_ref: Option<String>,
}

/// A named status-reporting action executed after the other phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAction {
    pub name: String,
    #[serde(default)]
    pub log: Option<LogAction>,
    #[serde(default)]
    pub api_call: Option<ApiCallSpec>,
}
