//! `{{ .path }}` template rendering against the evaluation context.
//!
//! The grammar is deliberately tiny: `{{ .name }}` (or a dotted subpath,
//! `{{ .cluster.id }}`) references a param. Anything between braces that
//! does not start with a dot is left untouched. Missing params render as
//! the empty string in [`RenderMode::Lenient`] and error in
//! [`RenderMode::Strict`]. Rendering is pure — same input, same output —
//! and never mutates its inputs; tree rendering works on a fresh copy.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::paths::extract_map;

/// Rendering failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Strict mode only: a referenced param does not resolve.
    #[error("unresolved template variable '{path}'")]
    Unresolved { path: String },
}

/// What to do when a referenced param is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Missing params render as the empty string.
    #[default]
    Lenient,
    /// Missing params are an error.
    Strict,
}

/// Render all `{{ .path }}` occurrences in `text`.
pub fn render(
    text: &str,
    params: &Map<String, Value>,
    mode: RenderMode,
) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    let mut remaining = text;

    while let Some(start) = remaining.find("{{") {
        let Some(end) = remaining[start..].find("}}") else {
            // Unclosed braces: emit the rest verbatim.
            break;
        };
        let full_end = start + end + 2;
        let inner = remaining[start + 2..start + end].trim();

        out.push_str(&remaining[..start]);

        match inner.strip_prefix('.') {
            Some(path) if !path.is_empty() => match extract_map(params, path) {
                Ok(value) => out.push_str(&value_to_string(value)),
                Err(_) => match mode {
                    RenderMode::Lenient => {}
                    RenderMode::Strict => {
                        return Err(RenderError::Unresolved {
                            path: path.to_string(),
                        });
                    }
                },
            },
            // Not a param reference — keep the braces as written.
            _ => out.push_str(&remaining[start..full_end]),
        }

        remaining = &remaining[full_end..];
    }
    out.push_str(remaining);

    Ok(out)
}

/// Render every string leaf (keys included) of a value tree, returning a new
/// tree. The input is never modified.
pub fn render_value(
    value: &Value,
    params: &Map<String, Value>,
    mode: RenderMode,
) -> Result<Value, RenderError> {
    match value {
        Value::String(s) => Ok(Value::String(render(s, params, mode)?)),
        Value::Array(items) => {
            let rendered: Result<Vec<Value>, RenderError> = items
                .iter()
                .map(|item| render_value(item, params, mode))
                .collect();
            Ok(Value::Array(rendered?))
        }
        Value::Object(map) => {
            let mut rendered = Map::with_capacity(map.len());
            for (key, val) in map {
                rendered.insert(render(key, params, mode)?, render_value(val, params, mode)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

/// Stringify a param value for interpolation. Maps and arrays serialize as
/// compact JSON so rendered bodies stay machine-readable.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Map<String, Value> {
        json!({
            "clusterId": "c-1",
            "count": 42,
            "enabled": true,
            "cluster": {"id": "nested-1", "labels": {"env": "prod"}},
            "tags": ["a", "b"]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn literal_text_is_unchanged() {
        let out = render("no placeholders here", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, "no placeholders here");
    }

    #[test]
    fn substitutes_simple_param() {
        let out = render("cluster={{ .clusterId }}", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, "cluster=c-1");
    }

    #[test]
    fn substitutes_dotted_subpath() {
        let out = render("{{ .cluster.id }}", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, "nested-1");
    }

    #[test]
    fn multiple_placeholders_per_string() {
        let out = render(
            "{{ .clusterId }}/{{ .count }}/{{ .enabled }}",
            &params(),
            RenderMode::Lenient,
        )
        .unwrap();
        assert_eq!(out, "c-1/42/true");
    }

    #[test]
    fn maps_render_as_json() {
        let out = render("labels={{ .cluster.labels }}", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, r#"labels={"env":"prod"}"#);
    }

    #[test]
    fn arrays_render_as_json() {
        let out = render("{{ .tags }}", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, r#"["a","b"]"#);
    }

    #[test]
    fn missing_param_renders_empty_in_lenient_mode() {
        let out = render("id={{ .nope }}!", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, "id=!");
    }

    #[test]
    fn missing_param_errors_in_strict_mode() {
        let err = render("id={{ .nope }}", &params(), RenderMode::Strict).unwrap_err();
        assert_eq!(err, RenderError::Unresolved { path: "nope".into() });
    }

    #[test]
    fn non_reference_braces_are_preserved() {
        let out = render("{{ not a ref }} and {{}}", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, "{{ not a ref }} and {{}}");
    }

    #[test]
    fn unclosed_braces_are_preserved() {
        let out = render("open {{ .clusterId", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(out, "open {{ .clusterId");
    }

    #[test]
    fn whitespace_inside_braces_is_trimmed() {
        let out = render("{{.clusterId}} {{   .clusterId   }}", &params(), RenderMode::Lenient)
            .unwrap();
        assert_eq!(out, "c-1 c-1");
    }

    #[test]
    fn render_value_walks_keys_and_leaves() {
        let template = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "{{ .clusterId }}-config"},
            "data": {
                "{{ .clusterId }}-key": "count is {{ .count }}",
                "replicas": 3
            }
        });

        let rendered = render_value(&template, &params(), RenderMode::Lenient).unwrap();
        assert_eq!(rendered["metadata"]["name"], "c-1-config");
        assert_eq!(rendered["data"]["c-1-key"], "count is 42");
        assert_eq!(rendered["data"]["replicas"], 3);
    }

    #[test]
    fn render_value_does_not_mutate_input() {
        let template = json!({"metadata": {"name": "{{ .clusterId }}"}});
        let before = template.clone();
        let rendered = render_value(&template, &params(), RenderMode::Lenient).unwrap();

        assert_eq!(rendered["metadata"]["name"], "c-1");
        assert_eq!(template, before);
    }

    #[test]
    fn rendering_is_deterministic() {
        let first = render("{{ .cluster.labels }}", &params(), RenderMode::Lenient).unwrap();
        let second = render("{{ .cluster.labels }}", &params(), RenderMode::Lenient).unwrap();
        assert_eq!(first, second);
    }
}
