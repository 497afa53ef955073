//! Dotted field-path extraction over JSON value trees.
//!
//! `extract(root, "a.b.c")` walks mapping nodes only; any non-object on the
//! way (or a missing key) fails with a path-qualified error so operators can
//! see exactly where a capture or condition went wrong.

use serde_json::{Map, Value};
use thiserror::Error;

/// A failed path walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field '{field}' not found at path '{path}'")]
    NotFound { field: String, path: String },

    #[error("cannot access field '{field}' at path '{path}': parent is not an object")]
    NotAnObject { field: String, path: String },
}

/// Extract the value a dotted path denotes in `root`.
pub fn extract<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = root;

    for (i, part) in parts.iter().enumerate() {
        let walked = parts[..=i].join(".");
        match current {
            Value::Object(map) => {
                current = map.get(*part).ok_or_else(|| PathError::NotFound {
                    field: (*part).to_string(),
                    path: walked,
                })?;
            }
            _ => {
                return Err(PathError::NotAnObject {
                    field: (*part).to_string(),
                    path: walked,
                });
            }
        }
    }

    Ok(current)
}

/// Extract from a top-level map without wrapping it in a `Value`.
pub fn extract_map<'a>(map: &'a Map<String, Value>, path: &str) -> Result<&'a Value, PathError> {
    let (first, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };

    let root = map.get(first).ok_or_else(|| PathError::NotFound {
        field: first.to_string(),
        path: first.to_string(),
    })?;

    match rest {
        Some(rest) => extract(root, rest).map_err(|e| prefix(e, first)),
        None => Ok(root),
    }
}

/// Re-qualify an error from a sub-walk with the already-walked prefix.
fn prefix(err: PathError, first: &str) -> PathError {
    match err {
        PathError::NotFound { field, path } => PathError::NotFound {
            field,
            path: format!("{first}.{path}"),
        },
        PathError::NotAnObject { field, path } => PathError::NotAnObject {
            field,
            path: format!("{first}.{path}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_nested_value() {
        let root = json!({"a": {"b": {"c": 42}}});
        assert_eq!(extract(&root, "a.b.c").unwrap(), &json!(42));
        assert_eq!(extract(&root, "a.b").unwrap(), &json!({"c": 42}));
    }

    #[test]
    fn extracts_top_level() {
        let root = json!({"status": "ready"});
        assert_eq!(extract(&root, "status").unwrap(), &json!("ready"));
    }

    #[test]
    fn missing_key_is_path_qualified() {
        let root = json!({"a": {"b": {}}});
        let err = extract(&root, "a.b.c").unwrap_err();
        assert_eq!(
            err,
            PathError::NotFound {
                field: "c".into(),
                path: "a.b.c".into()
            }
        );
        assert_eq!(err.to_string(), "field 'c' not found at path 'a.b.c'");
    }

    #[test]
    fn scalar_parent_is_not_an_object() {
        let root = json!({"a": "leaf"});
        let err = extract(&root, "a.b").unwrap_err();
        assert!(matches!(err, PathError::NotAnObject { field, .. } if field == "b"));
    }

    #[test]
    fn array_parent_is_not_an_object() {
        let root = json!({"a": [1, 2]});
        let err = extract(&root, "a.0").unwrap_err();
        assert!(matches!(err, PathError::NotAnObject { .. }));
    }

    #[test]
    fn extract_map_walks_from_params() {
        let map = json!({"cluster": {"id": "c-1"}})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(extract_map(&map, "cluster.id").unwrap(), &json!("c-1"));
        assert_eq!(
            extract_map(&map, "cluster").unwrap(),
            &json!({"id": "c-1"})
        );
    }

    #[test]
    fn extract_map_errors_carry_full_path() {
        let map = json!({"cluster": {"id": "c-1"}})
            .as_object()
            .cloned()
            .unwrap();
        let err = extract_map(&map, "cluster.status.phase").unwrap_err();
        assert_eq!(
            err,
            PathError::NotFound {
                field: "status".into(),
                path: "cluster.status".into()
            }
        );

        let err = extract_map(&map, "missing").unwrap_err();
        assert_eq!(
            err,
            PathError::NotFound {
                field: "missing".into(),
                path: "missing".into()
            }
        );
    }
}
