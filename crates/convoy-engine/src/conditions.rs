//! Structured condition evaluation.
//!
//! Each condition names a dotted field in the bound params, an operator from
//! the closed set, and (for most operators) an expected value. Evaluation
//! never fails hard: a missing field, a type mismatch, or a bad regex fails
//! *that condition* with a reason, and the overall result is the AND of all
//! conditions.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use convoy_config::{Condition, Operator};

use crate::paths::extract_map;

/// The outcome of one condition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResult {
    pub field: String,
    pub operator: Operator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The AND of all conditions, with per-condition detail.
#[derive(Debug, Clone)]
pub struct ConditionsOutcome {
    pub matched: bool,
    pub results: Vec<ConditionResult>,
}

/// Evaluate all conditions against the bound params.
pub fn evaluate(conditions: &[Condition], params: &Map<String, Value>) -> ConditionsOutcome {
    let mut results = Vec::with_capacity(conditions.len());
    let mut matched = true;

    for condition in conditions {
        let result = evaluate_one(condition, params);
        matched &= result.matched;
        results.push(result);
    }

    ConditionsOutcome { matched, results }
}

fn evaluate_one(condition: &Condition, params: &Map<String, Value>) -> ConditionResult {
    let resolved = extract_map(params, &condition.field).ok().cloned();

    let mut result = ConditionResult {
        field: condition.field.clone(),
        operator: condition.operator,
        expected: condition.value.clone(),
        actual: resolved.clone(),
        matched: false,
        reason: None,
    };

    // Existence checks only look at whether the field resolved.
    match condition.operator {
        Operator::Exists => {
            result.matched = resolved.is_some();
            if !result.matched {
                result.reason = Some("field not found".into());
            }
            return result;
        }
        Operator::NotExists => {
            result.matched = resolved.is_none();
            if !result.matched {
                result.reason = Some("field exists".into());
            }
            return result;
        }
        _ => {}
    }

    // Every other operator needs the field present.
    let Some(actual) = resolved else {
        result.reason = Some("field not found".into());
        return result;
    };

    let Some(expected) = condition.value.as_ref() else {
        result.reason = Some("condition has no expected value".into());
        return result;
    };

    match condition.operator {
        Operator::Eq => result.matched = &actual == expected,
        Operator::Ne => result.matched = &actual != expected,
        Operator::In => match expected.as_array() {
            Some(set) => result.matched = set.contains(&actual),
            None => result.reason = Some("expected value is not an array".into()),
        },
        Operator::NotIn => match expected.as_array() {
            Some(set) => result.matched = !set.contains(&actual),
            None => result.reason = Some("expected value is not an array".into()),
        },
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            match (actual.as_f64(), expected.as_f64()) {
                (Some(a), Some(e)) => {
                    result.matched = match condition.operator {
                        Operator::Lt => a < e,
                        Operator::Le => a <= e,
                        Operator::Gt => a > e,
                        _ => a >= e,
                    };
                }
                _ => {
                    result.reason = Some(format!(
                        "type mismatch: {} requires numbers, got {} and {}",
                        condition.operator,
                        json_type(&actual),
                        json_type(expected)
                    ));
                }
            }
        }
        Operator::Contains => match (&actual, expected) {
            (Value::String(haystack), Value::String(needle)) => {
                result.matched = haystack.contains(needle.as_str());
            }
            (Value::Array(items), needle) => result.matched = items.contains(needle),
            _ => {
                result.reason = Some(format!(
                    "type mismatch: contains requires a string or array field, got {}",
                    json_type(&actual)
                ));
            }
        },
        Operator::Matches => match (&actual, expected) {
            (Value::String(text), Value::String(pattern)) => match Regex::new(pattern) {
                Ok(re) => result.matched = re.is_match(text),
                Err(e) => result.reason = Some(format!("regex: {e}")),
            },
            _ => {
                result.reason = Some(format!(
                    "type mismatch: matches requires string field and pattern, got {} and {}",
                    json_type(&actual),
                    json_type(expected)
                ));
            }
        },
        // Existence operators returned above.
        Operator::Exists | Operator::NotExists => unreachable!(),
    }

    result
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Summarize the failing conditions for a not-met reason, e.g.
/// `status eq "ready" (actual: "pending")`.
pub fn format_failures(results: &[ConditionResult]) -> String {
    let failures: Vec<String> = results
        .iter()
        .filter(|r| !r.matched)
        .map(|r| {
            let expected = r
                .expected
                .as_ref()
                .map(render_scalar)
                .unwrap_or_else(|| "-".into());
            let actual = r
                .actual
                .as_ref()
                .map(render_scalar)
                .unwrap_or_else(|| "absent".into());
            match &r.reason {
                Some(reason) => {
                    format!("{} {} {} ({})", r.field, r.operator, expected, reason)
                }
                None => format!("{} {} {} (actual: {})", r.field, r.operator, expected, actual),
            }
        })
        .collect();

    if failures.is_empty() {
        "no specific details available".to_string()
    } else {
        failures.join("; ")
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Map<String, Value> {
        json!({
            "status": "ready",
            "replicas": 3,
            "region": "us-east-1",
            "phases": ["Pending", "Provisioned"],
            "cluster": {"id": "c-1"}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn cond(field: &str, operator: Operator, value: Option<Value>) -> Condition {
        Condition {
            field: field.into(),
            operator,
            value,
        }
    }

    #[test]
    fn eq_and_ne() {
        let out = evaluate(
            &[
                cond("status", Operator::Eq, Some(json!("ready"))),
                cond("status", Operator::Ne, Some(json!("pending"))),
            ],
            &params(),
        );
        assert!(out.matched);
        assert!(out.results.iter().all(|r| r.matched));
    }

    #[test]
    fn eq_mismatch_reports_actual() {
        let out = evaluate(&[cond("status", Operator::Eq, Some(json!("pending")))], &params());
        assert!(!out.matched);
        assert_eq!(out.results[0].actual, Some(json!("ready")));
        assert!(format_failures(&out.results).contains("status eq pending (actual: ready)"));
    }

    #[test]
    fn exists_and_not_exists() {
        let out = evaluate(
            &[
                cond("cluster.id", Operator::Exists, None),
                cond("cluster.missing", Operator::NotExists, None),
            ],
            &params(),
        );
        assert!(out.matched);
    }

    #[test]
    fn missing_field_fails_non_existence_operators() {
        let out = evaluate(&[cond("nope", Operator::Eq, Some(json!("x")))], &params());
        assert!(!out.matched);
        assert_eq!(out.results[0].actual, None);
        assert_eq!(out.results[0].reason.as_deref(), Some("field not found"));
        assert!(format_failures(&out.results).contains("field not found"));
    }

    #[test]
    fn in_and_not_in() {
        let out = evaluate(
            &[
                cond("status", Operator::In, Some(json!(["ready", "running"]))),
                cond("status", Operator::NotIn, Some(json!(["failed"]))),
            ],
            &params(),
        );
        assert!(out.matched);

        let out = evaluate(
            &[cond("status", Operator::In, Some(json!("ready")))],
            &params(),
        );
        assert!(!out.matched);
        assert!(out.results[0].reason.as_deref().unwrap().contains("array"));
    }

    #[test]
    fn numeric_comparisons() {
        let out = evaluate(
            &[
                cond("replicas", Operator::Gt, Some(json!(2))),
                cond("replicas", Operator::Ge, Some(json!(3))),
                cond("replicas", Operator::Lt, Some(json!(4))),
                cond("replicas", Operator::Le, Some(json!(3.0))),
            ],
            &params(),
        );
        assert!(out.matched);
    }

    #[test]
    fn numeric_comparison_with_string_is_typed_mismatch() {
        let out = evaluate(&[cond("status", Operator::Lt, Some(json!(5)))], &params());
        assert!(!out.matched);
        let reason = out.results[0].reason.as_deref().unwrap();
        assert!(reason.contains("type mismatch"));
        assert!(reason.contains("string"));
    }

    #[test]
    fn contains_on_strings_and_arrays() {
        let out = evaluate(
            &[
                cond("region", Operator::Contains, Some(json!("east"))),
                cond("phases", Operator::Contains, Some(json!("Provisioned"))),
            ],
            &params(),
        );
        assert!(out.matched);

        let out = evaluate(
            &[cond("replicas", Operator::Contains, Some(json!(3)))],
            &params(),
        );
        assert!(!out.matched);
        assert!(out.results[0].reason.is_some());
    }

    #[test]
    fn matches_regex() {
        let out = evaluate(
            &[cond("region", Operator::Matches, Some(json!("^us-[a-z]+-\\d$")))],
            &params(),
        );
        assert!(out.matched);
    }

    #[test]
    fn bad_regex_fails_with_regex_reason() {
        let out = evaluate(
            &[cond("region", Operator::Matches, Some(json!("((")))],
            &params(),
        );
        assert!(!out.matched);
        assert!(out.results[0].reason.as_deref().unwrap().starts_with("regex:"));
    }

    #[test]
    fn overall_is_and_of_all() {
        let out = evaluate(
            &[
                cond("status", Operator::Eq, Some(json!("ready"))),
                cond("replicas", Operator::Gt, Some(json!(10))),
            ],
            &params(),
        );
        assert!(!out.matched);
        assert!(out.results[0].matched);
        assert!(!out.results[1].matched);
        assert_eq!(out.results.len(), 2);
    }

    #[test]
    fn missing_expected_value_is_reasoned_failure() {
        let out = evaluate(&[cond("status", Operator::Eq, None)], &params());
        assert!(!out.matched);
        assert!(out.results[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("no expected value"));
    }
}
