//! Minimal JSON Schema checks for structured reasoning output.
//!
//! Supports the subset the workflow's schemas use: `type` (single or list),
//! `required`, `properties`, `items`, `enum`, `minimum` and `maximum`.
//! Unknown keywords are ignored.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaValidationError {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid type for field {field}: expected {expected}, got {actual}")]
    InvalidType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Value for field {field} is not one of the allowed values: {value}")]
    NotAllowed { field: String, value: String },

    #[error("Value out of range for field {field}: {value}")]
    OutOfRange { field: String, value: String },

    #[error("Multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<SchemaValidationError>),
}

/// Validates `value` against `schema`, collecting every violation.
pub fn validate_against_schema(value: &Value, schema: &Value) -> Result<(), SchemaValidationError> {
    let mut errors = Vec::new();
    check(value, schema, "root", &mut errors);
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(SchemaValidationError::Multiple(errors)),
    }
}

fn check(value: &Value, schema: &Value, path: &str, errors: &mut Vec<SchemaValidationError>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(expected) = schema.get("type") {
        if !type_matches(value, expected) {
            errors.push(SchemaValidationError::InvalidType {
                field: path.to_string(),
                expected: expected.to_string(),
                actual: type_name(value).to_string(),
            });
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            errors.push(SchemaValidationError::NotAllowed {
                field: path.to_string(),
                value: value.to_string(),
            });
        }
    }

    if let Some(number) = value.as_f64() {
        let below = schema
            .get("minimum")
            .and_then(Value::as_f64)
            .is_some_and(|min| number < min);
        let above = schema
            .get("maximum")
            .and_then(Value::as_f64)
            .is_some_and(|max| number > max);
        if below || above {
            errors.push(SchemaValidationError::OutOfRange {
                field: path.to_string(),
                value: number.to_string(),
            });
        }
    }

    if let Some(object) = value.as_object() {
        check_object(object, schema, path, errors);
    }

    if let (Some(items), Some(item_schema)) = (value.as_array(), schema.get("items")) {
        for (i, item) in items.iter().enumerate() {
            check(item, item_schema, &format!("{path}[{i}]"), errors);
        }
    }
}

fn check_object(
    object: &Map<String, Value>,
    schema: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<SchemaValidationError>,
) {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                errors.push(SchemaValidationError::MissingRequired {
                    field: join(path, field),
                });
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, property_schema) in properties {
            if let Some(property) = object.get(name) {
                check(property, property_schema, &join(path, name), errors);
            }
        }
    }
}

fn type_matches(value: &Value, expected: &Value) -> bool {
    match expected {
        Value::String(name) => is_type(value, name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| is_type(value, name)),
        _ => true,
    }
}

fn is_type(value: &Value, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, field: &str) -> String {
    if path == "root" {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn critique_schema() -> Value {
        json!({
            "type": "object",
            "required": ["confidence_score", "verdict"],
            "properties": {
                "confidence_score": {"type": "number", "minimum": 0, "maximum": 1},
                "verdict": {"type": "string", "enum": ["accept", "ask_user"]},
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["question"],
                        "properties": {"question": {"type": "string"}}
                    }
                },
                "note": {"type": ["string", "null"]}
            }
        })
    }

    #[test]
    fn accepts_valid_value() {
        let value = json!({"confidence_score": 0.8, "verdict": "accept", "note": null});
        assert!(validate_against_schema(&value, &critique_schema()).is_ok());
    }

    #[test]
    fn reports_missing_required_field() {
        let value = json!({"confidence_score": 0.8});
        assert_eq!(
            validate_against_schema(&value, &critique_schema()),
            Err(SchemaValidationError::MissingRequired {
                field: "verdict".to_string()
            })
        );
    }

    #[test]
    fn rejects_value_outside_enum() {
        let value = json!({"confidence_score": 0.8, "verdict": "maybe"});
        assert!(matches!(
            validate_against_schema(&value, &critique_schema()),
            Err(SchemaValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_number() {
        let value = json!({"confidence_score": 1.5, "verdict": "accept"});
        assert!(matches!(
            validate_against_schema(&value, &critique_schema()),
            Err(SchemaValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn checks_array_items_with_paths() {
        let value = json!({
            "confidence_score": 0.5,
            "verdict": "ask_user",
            "questions": [{"question": "Budget?"}, {"why": "no question"}]
        });
        assert_eq!(
            validate_against_schema(&value, &critique_schema()),
            Err(SchemaValidationError::MissingRequired {
                field: "questions[1].question".to_string()
            })
        );
    }

    #[test]
    fn collects_multiple_errors() {
        let value = json!({"confidence_score": "high"});
        assert!(matches!(
            validate_against_schema(&value, &critique_schema()),
            Err(SchemaValidationError::Multiple(errors)) if errors.len() == 2
        ));
    }

    #[test]
    fn wrong_root_type_is_reported() {
        let value = json!(["not", "an", "object"]);
        assert!(matches!(
            validate_against_schema(&value, &critique_schema()),
            Err(SchemaValidationError::InvalidType { .. })
        ));
    }
}
