//! Declarative payload construction.
//!
//! A payload build tree is walked recursively: a mapping whose `expression`
//! key holds a string is replaced by the evaluated CEL value, a mapping with
//! a `value` key is replaced by that value (template-rendered when it is a
//! string), any other mapping recurses key-by-key with templated keys,
//! sequences recurse element-wise, and bare strings go through the template
//! renderer. CEL *runtime* errors contribute a null leaf — an object that
//! has not reported status yet is an expected state, not a build failure.

use serde_json::{Map, Value};
use tracing::debug;

use crate::cel::ExpressionCache;
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::template::{render, RenderMode};

/// Build one payload tree against the current context.
pub fn build(build: &Value, ctx: &EvaluationContext, cel: &ExpressionCache) -> Result<Value> {
    process_value(build, ctx, cel)
}

fn process_value(value: &Value, ctx: &EvaluationContext, cel: &ExpressionCache) -> Result<Value> {
    match value {
        Value::Object(map) => {
            // CEL leaf: { expression: "<source>" }
            if let Some(Value::String(expression)) = map.get("expression") {
                let outcome = cel.evaluate(expression, ctx)?;
                if outcome.has_error() {
                    // Expected while upstream state is still partial; the
                    // leaf becomes null and the build continues.
                    debug!(
                        expression = %outcome.expression,
                        reason = outcome.error_reason.as_deref().unwrap_or(""),
                        "payload expression evaluation failed"
                    );
                    return Ok(Value::Null);
                }
                return Ok(outcome.value.unwrap_or(Value::Null));
            }

            // Literal leaf: { value: <v> }
            if let Some(literal) = map.get("value") {
                if let Value::String(text) = literal {
                    return Ok(Value::String(render(text, &ctx.params, RenderMode::Lenient)?));
                }
                return Ok(literal.clone());
            }

            // Plain mapping: recurse, templating keys as well.
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                let rendered_key = render(key, &ctx.params, RenderMode::Lenient)?;
                out.insert(rendered_key, process_value(val, ctx, cel)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let out: Result<Vec<Value>> = items
                .iter()
                .map(|item| process_value(item, ctx, cel))
                .collect();
            Ok(Value::Array(out?))
        }
        Value::String(text) => Ok(Value::String(render(text, &ctx.params, RenderMode::Lenient)?)),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use serde_json::json;

    fn context_with(params: Value) -> EvaluationContext {
        let mut ctx = EvaluationContext::new("test", "0.1.0", "evt-1", Map::new());
        ctx.set_params_from(params.as_object().cloned().unwrap());
        ctx
    }

    #[test]
    fn expression_and_value_leaves() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({"clusterId": "c-1", "phase": "Provisioned"}));

        let tree = json!({
            "clusterId": { "expression": "params.clusterId" },
            "phase": { "value": "{{ .phase }}" }
        });

        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(built, json!({"clusterId": "c-1", "phase": "Provisioned"}));
    }

    #[test]
    fn non_string_value_leaf_passes_verbatim() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({}));

        let tree = json!({"replicas": {"value": 3}, "flags": {"value": [true, false]}});
        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(built, json!({"replicas": 3, "flags": [true, false]}));
    }

    #[test]
    fn nested_maps_and_sequences_recurse() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({"clusterId": "c-1", "region": "us-east-1"}));

        let tree = json!({
            "cluster": {
                "id": { "expression": "params.clusterId" },
                "location": "{{ .region }}"
            },
            "conditions": [
                { "type": { "value": "Ready" } },
                "{{ .clusterId }}"
            ]
        });

        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(
            built,
            json!({
                "cluster": {"id": "c-1", "location": "us-east-1"},
                "conditions": [{"type": "Ready"}, "c-1"]
            })
        );
    }

    #[test]
    fn keys_are_templated() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({"clusterId": "c-1"}));

        let tree = json!({"{{ .clusterId }}-status": {"value": "ok"}});
        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(built, json!({"c-1-status": "ok"}));
    }

    #[test]
    fn cel_runtime_error_becomes_null_leaf() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({"cluster": {"id": "c-1"}}));

        let tree = json!({
            "phase": { "expression": "cluster.status.phase" },
            "id": { "expression": "cluster.id" }
        });

        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(built, json!({"phase": null, "id": "c-1"}));
    }

    #[test]
    fn cel_compile_error_is_fatal() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({}));

        let tree = json!({"bad": {"expression": "=== nope ==="}});
        let err = build(&tree, &ctx, &cel).unwrap_err();
        assert!(matches!(err, EngineError::CelCompile { .. }));
    }

    #[test]
    fn adapter_state_is_queryable() {
        let cel = ExpressionCache::new();
        let mut ctx = context_with(json!({}));
        ctx.set_skipped("PreconditionNotMet", "status pending");

        let tree = json!({
            "skipped": { "expression": "has(adapter.skipped)" },
            "reason": { "expression": "adapter.skipped.reason" }
        });

        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(built["skipped"], json!(true));
        assert_eq!(built["reason"], json!("PreconditionNotMet"));
    }

    #[test]
    fn scalars_pass_through() {
        let cel = ExpressionCache::new();
        let ctx = context_with(json!({}));

        let tree = json!({"n": 7, "b": false, "s": "plain", "nil": null});
        let built = build(&tree, &ctx, &cel).unwrap();
        assert_eq!(built, json!({"n": 7, "b": false, "s": "plain", "nil": null}));
    }
}
