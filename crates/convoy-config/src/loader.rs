//! Config document loading, reference resolution, and validation.
//!
//! Loading is a three-step pass: parse the YAML document, inline any
//! `templateRef`/`buildRef` files (relative to the document), then validate
//! the structure. Validation failures are config bugs and abort startup —
//! nothing here is recoverable at event time.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::types::{AdapterConfig, ApiCallSpec, Precondition};

/// Load, resolve, and validate an adapter config from a file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<AdapterConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;

    let mut config: AdapterConfig =
        serde_yaml::from_str(&text).map_err(|e| ConfigError::ParseYaml(e.to_string()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_refs(&mut config, base_dir)?;
    validate(&config)?;

    Ok(config)
}

/// Parse and validate a config from a YAML string. File references are not
/// permitted here since there is no base directory to resolve against.
pub fn load_from_str(text: &str) -> Result<AdapterConfig> {
    let config: AdapterConfig =
        serde_yaml::from_str(text).map_err(|e| ConfigError::ParseYaml(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Inline `templateRef` and `buildRef` files into their owning entries.
fn resolve_refs(config: &mut AdapterConfig, base_dir: &Path) -> Result<()> {
    for resource in &mut config.spec.resources {
        if let Some(ref_path) = &resource.template_ref {
            if resource.template.is_some() {
                return Err(ConfigError::InlineAndRef {
                    section: "resource".into(),
                    name: resource.name.clone(),
                    inline: "template",
                    reference: "templateRef",
                });
            }
            resource.template = Some(load_ref(base_dir, ref_path)?);
        }
    }

    if let Some(post) = &mut config.spec.post {
        for payload in &mut post.payloads {
            if let Some(ref_path) = &payload.build_ref {
                if payload.build.is_some() {
                    return Err(ConfigError::InlineAndRef {
                        section: "payload".into(),
                        name: payload.name.clone(),
                        inline: "build",
                        reference: "buildRef",
                    });
                }
                payload.build = Some(load_ref(base_dir, ref_path)?);
            }
        }
    }

    Ok(())
}

/// Read a referenced YAML file and parse it into a JSON value tree.
fn load_ref(base_dir: &Path, ref_path: &str) -> Result<Value> {
    let full = base_dir.join(ref_path);
    let text = std::fs::read_to_string(&full).map_err(|source| ConfigError::ReadFile {
        path: full.display().to_string(),
        source,
    })?;
    let value: Value =
        serde_yaml::from_str(&text).map_err(|e| ConfigError::ParseYaml(e.to_string()))?;
    if !value.is_object() {
        return Err(ConfigError::RefNotMapping {
            path: full.display().to_string(),
        });
    }
    Ok(value)
}

/// Structural validation of a parsed (and ref-resolved) config.
pub fn validate(config: &AdapterConfig) -> Result<()> {
    if config.metadata.name.is_empty() {
        return Err(ConfigError::MissingField {
            field: "metadata.name".into(),
            context: "adapter config".into(),
        });
    }

    check_unique("param", config.spec.params.iter().map(|p| p.name.as_str()))?;
    check_unique(
        "precondition",
        config.spec.preconditions.iter().map(|p| p.name.as_str()),
    )?;
    check_unique(
        "resource",
        config.spec.resources.iter().map(|r| r.name.as_str()),
    )?;

    for precond in &config.spec.preconditions {
        validate_precondition(precond)?;
    }

    for resource in &config.spec.resources {
        if resource.template.is_none() && resource.template_ref.is_none() {
            return Err(ConfigError::MissingDefinition {
                section: "resource".into(),
                name: resource.name.clone(),
                inline: "template",
                reference: "templateRef",
            });
        }
    }

    if let Some(post) = &config.spec.post {
        check_unique("payload", post.payloads.iter().map(|p| p.name.as_str()))?;
        check_unique(
            "postAction",
            post.post_actions.iter().map(|a| a.name.as_str()),
        )?;

        for payload in &post.payloads {
            if payload.build.is_none() && payload.build_ref.is_none() {
                return Err(ConfigError::MissingDefinition {
                    section: "payload".into(),
                    name: payload.name.clone(),
                    inline: "build",
                    reference: "buildRef",
                });
            }
        }
        for action in &post.post_actions {
            if let Some(call) = &action.api_call {
                validate_api_call(call, &action.name)?;
            }
        }
    }

    Ok(())
}

fn validate_precondition(precond: &Precondition) -> Result<()> {
    if !precond.conditions.is_empty() && precond.expression.is_some() {
        return Err(ConfigError::ConditionsAndExpression(precond.name.clone()));
    }

    if let Some(call) = &precond.api_call {
        validate_api_call(call, &precond.name)?;
    }

    for capture in &precond.capture {
        if capture.field.is_empty() || capture.name.is_empty() {
            return Err(ConfigError::MissingField {
                field: "capture.field/capture.name".into(),
                context: format!("precondition '{}'", precond.name),
            });
        }
    }

    Ok(())
}

fn validate_api_call(call: &ApiCallSpec, step: &str) -> Result<()> {
    if call.method.is_empty() {
        return Err(ConfigError::MissingField {
            field: "apiCall.method".into(),
            context: format!("step '{step}'"),
        });
    }
    if call.url.is_empty() {
        return Err(ConfigError::MissingField {
            field: "apiCall.url".into(),
            context: format!("step '{step}'"),
        });
    }
    Ok(())
}

fn check_unique<'a>(section: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(ConfigError::MissingField {
                field: "name".into(),
                context: format!("{section} entry"),
            });
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                section: section.into(),
                name: name.into(),
            });
        }
    }
    Ok(())
}
