//! CloudEvent-shaped inbound record.
//!
//! Only `id` and `data` are consumed by the engine; the rest rides along
//! for logging. `data` may arrive as a JSON object (structured mode) or as
//! a string holding encoded JSON (binary mode); both normalize to a map at
//! the boundary so the rest of the engine never sees the transport shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// An inbound event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Event {
    /// Build an event carrying structured JSON data.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            source: String::new(),
            event_type: String::new(),
            datacontenttype: Some("application/json".into()),
            data: Some(data),
        }
    }

    /// Parse the data payload into a map. Empty payloads yield an empty map;
    /// anything that is not a JSON object is a permanent parse error.
    pub fn parse_data(&self) -> Result<Map<String, Value>, EngineError> {
        match &self.data {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(Value::String(raw)) => {
                if raw.trim().is_empty() {
                    return Ok(Map::new());
                }
                match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Object(map)) => Ok(map),
                    Ok(other) => Err(EngineError::EventParse(format!(
                        "expected a JSON object, got {}",
                        type_name(&other)
                    ))),
                    Err(e) => Err(EngineError::EventParse(e.to_string())),
                }
            }
            Some(other) => Err(EngineError::EventParse(format!(
                "expected a JSON object, got {}",
                type_name(other)
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_data_is_empty_map() {
        let event = Event {
            id: "evt-1".into(),
            source: String::new(),
            event_type: String::new(),
            datacontenttype: None,
            data: None,
        };
        assert!(event.parse_data().unwrap().is_empty());
    }

    #[test]
    fn object_data_passes_through() {
        let event = Event::new("evt-1", json!({"cluster": {"id": "c-1"}}));
        let data = event.parse_data().unwrap();
        assert_eq!(data["cluster"]["id"], "c-1");
    }

    #[test]
    fn string_data_is_parsed() {
        let event = Event::new("evt-1", json!(r#"{"cluster":{"id":"c-1"}}"#));
        let data = event.parse_data().unwrap();
        assert_eq!(data["cluster"]["id"], "c-1");
    }

    #[test]
    fn blank_string_data_is_empty_map() {
        let event = Event::new("evt-1", json!("  "));
        assert!(event.parse_data().unwrap().is_empty());
    }

    #[test]
    fn malformed_string_data_is_parse_error() {
        let event = Event::new("evt-1", json!("{not json"));
        let err = event.parse_data().unwrap_err();
        assert!(matches!(err, EngineError::EventParse(_)));
        assert!(err.is_permanent());
    }

    #[test]
    fn non_object_data_is_parse_error() {
        let event = Event::new("evt-1", json!([1, 2, 3]));
        let err = event.parse_data().unwrap_err();
        assert!(matches!(err, EngineError::EventParse(msg) if msg.contains("an array")));
    }

    #[test]
    fn deserializes_cloudevent_shape() {
        let event: Event = serde_json::from_str(
            r#"{"id":"evt-9","source":"/clusters","type":"cluster.created","data":{"x":1}}"#,
        )
        .unwrap();
        assert_eq!(event.id, "evt-9");
        assert_eq!(event.event_type, "cluster.created");
        assert_eq!(event.parse_data().unwrap()["x"], 1);
    }
}
