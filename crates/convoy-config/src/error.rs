//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or validating an adapter config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config document or a referenced file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("failed to parse YAML config: {0}")]
    ParseYaml(String),

    /// Missing required field.
    #[error("missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// Two steps in the same section share a name.
    #[error("duplicate {section} name '{name}'")]
    DuplicateName { section: String, name: String },

    /// A precondition sets both `conditions` and `expression`.
    #[error("precondition '{0}' sets both 'conditions' and 'expression' — use exactly one")]
    ConditionsAndExpression(String),

    /// A step declares both an inline definition and a file reference.
    #[error("{section} '{name}' sets both '{inline}' and '{reference}' — use exactly one")]
    InlineAndRef {
        section: String,
        name: String,
        inline: &'static str,
        reference: &'static str,
    },

    /// A step declares neither an inline definition nor a file reference.
    #[error("{section} '{name}' needs either '{inline}' or '{reference}'")]
    MissingDefinition {
        section: String,
        name: String,
        inline: &'static str,
        reference: &'static str,
    },

    /// A referenced file did not contain a mapping.
    #[error("reference file '{path}' must contain a YAML mapping")]
    RefNotMapping { path: String },

    /// Other validation error.
    #[error("{0}")]
    Invalid(String),
}
