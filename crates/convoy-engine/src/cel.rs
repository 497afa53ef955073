//! CEL expression evaluation.
//!
//! Expressions are compiled lazily and cached per source string; evaluation
//! installs every bound param as a top-level variable plus the `params` and
//! `adapter` maps. Compile failures are hard errors (config drift), but
//! *runtime* failures are not: a missing key mid-chain is an expected state
//! during retries (an object that has not reported status yet), so it yields
//! `matched = false` with an error reason instead of failing the step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cel_interpreter::objects::Key;
use cel_interpreter::{Context, Program, Value as CelValue};
use serde::Serialize;
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::error::{EngineError, Result};

/// The outcome of evaluating one expression.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CelOutcome {
    pub expression: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl CelOutcome {
    /// True when evaluation hit a runtime error.
    pub fn has_error(&self) -> bool {
        self.error_reason.is_some()
    }

    fn runtime_error(expression: &str, reason: String) -> Self {
        Self {
            expression: expression.to_string(),
            matched: false,
            value: None,
            error_reason: Some(reason),
        }
    }
}

/// Compile cache shared across events. Compiled programs are immutable.
#[derive(Default)]
pub struct ExpressionCache {
    programs: Mutex<HashMap<String, Arc<Program>>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_compile(&self, expression: &str) -> Result<Arc<Program>> {
        let mut programs = self.programs.lock().unwrap();
        if let Some(program) = programs.get(expression) {
            return Ok(program.clone());
        }

        let program = Program::compile(expression).map_err(|e| EngineError::CelCompile {
            expression: expression.to_string(),
            message: e.to_string(),
        })?;
        let program = Arc::new(program);
        programs.insert(expression.to_string(), program.clone());
        Ok(program)
    }

    /// Evaluate an expression against the event's context.
    ///
    /// Errors only on compile failure; runtime errors come back inside the
    /// outcome.
    pub fn evaluate(&self, expression: &str, ctx: &EvaluationContext) -> Result<CelOutcome> {
        let expression = expression.trim();
        let program = self.get_or_compile(expression)?;

        let mut context = Context::default();

        // Each param is a top-level variable, and the whole set is also
        // reachable as `params.<name>`.
        let mut params_map = HashMap::new();
        for (key, value) in &ctx.params {
            let cel_value = json_to_cel(value);
            params_map.insert(key.clone(), cel_value.clone());
            if let Err(e) = context.add_variable(key.clone(), cel_value) {
                return Ok(CelOutcome::runtime_error(
                    expression,
                    format!("failed to install variable '{key}': {e}"),
                ));
            }
        }
        if let Err(e) = context.add_variable("params", CelValue::Map(params_map.into())) {
            return Ok(CelOutcome::runtime_error(
                expression,
                format!("failed to install 'params': {e}"),
            ));
        }
        if let Err(e) = context.add_variable("adapter", json_to_cel(&ctx.adapter_value())) {
            return Ok(CelOutcome::runtime_error(
                expression,
                format!("failed to install 'adapter': {e}"),
            ));
        }

        match program.execute(&context) {
            Ok(value) => Ok(CelOutcome {
                expression: expression.to_string(),
                matched: truthy(&value),
                value: Some(cel_to_json(&value)),
                error_reason: None,
            }),
            Err(e) => Ok(CelOutcome::runtime_error(expression, e.to_string())),
        }
    }
}

/// JSON → CEL, structure-preserving.
fn json_to_cel(value: &Value) -> CelValue {
    match value {
        Value::Null => CelValue::Null,
        Value::Bool(b) => CelValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CelValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                CelValue::UInt(u)
            } else {
                CelValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => CelValue::String(Arc::new(s.clone())),
        Value::Array(items) => {
            let list: Vec<CelValue> = items.iter().map(json_to_cel).collect();
            CelValue::List(Arc::new(list))
        }
        Value::Object(map) => {
            let mut cel_map = HashMap::new();
            for (k, v) in map {
                cel_map.insert(k.clone(), json_to_cel(v));
            }
            CelValue::Map(cel_map.into())
        }
    }
}

/// CEL → JSON for recording evaluated values in results and payloads.
fn cel_to_json(value: &CelValue) -> Value {
    match value {
        CelValue::Null => Value::Null,
        CelValue::Bool(b) => Value::Bool(*b),
        CelValue::Int(i) => Value::from(*i),
        CelValue::UInt(u) => Value::from(*u),
        CelValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CelValue::String(s) => Value::String(s.as_ref().clone()),
        CelValue::List(items) => Value::Array(items.iter().map(cel_to_json).collect()),
        CelValue::Map(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map.map.iter() {
                out.insert(key_to_string(k), cel_to_json(v));
            }
            Value::Object(out)
        }
        other => Value::String(format!("{other:?}")),
    }
}

fn key_to_string(key: &Key) -> String {
    match key {
        Key::String(s) => s.as_ref().clone(),
        Key::Int(i) => i.to_string(),
        Key::Uint(u) => u.to_string(),
        Key::Bool(b) => b.to_string(),
    }
}

/// Truthiness for non-boolean results: zero, empty, and null are false.
fn truthy(value: &CelValue) -> bool {
    match value {
        CelValue::Bool(b) => *b,
        CelValue::Int(i) => *i != 0,
        CelValue::UInt(u) => *u != 0,
        CelValue::Float(f) => *f != 0.0,
        CelValue::String(s) => !s.is_empty(),
        CelValue::List(items) => !items.is_empty(),
        CelValue::Map(map) => !map.map.is_empty(),
        CelValue::Null => false,
        _ => false,
    }
}
