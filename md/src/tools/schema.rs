//! JSON schema validation
//!
//! Interprets the subset of JSON Schema the tool catalogue actually uses:
//! `type`, `required`, `properties`, `items`, `enum`, `minimum`/`maximum`.
//! Violations carry a dotted field path (`goals[2].priority`) for
//! diagnosis. Both model-proposed tool arguments and model-generated
//! structured output go through this check before anything is persisted.

use serde_json::Value;

/// A single schema violation, located by field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    fn at(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() { "$".to_string() } else { path.to_string() },
            message: message.into(),
        }
    }
}

/// Validate a value against a schema, reporting the first violation
pub fn validate(value: &Value, schema: &Value) -> Result<(), SchemaViolation> {
    check(value, schema, "")
}

fn check(value: &Value, schema: &Value, path: &str) -> Result<(), SchemaViolation> {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        check_type(value, expected, path)?;
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            return Err(SchemaViolation::at(
                path,
                format!("value {value} is not one of the allowed values"),
            ));
        }
    }

    if let Some(minimum) = schema.get("minimum").and_then(Value::as_f64) {
        if let Some(n) = value.as_f64() {
            if n < minimum {
                return Err(SchemaViolation::at(path, format!("{n} is below the minimum {minimum}")));
            }
        }
    }
    if let Some(maximum) = schema.get("maximum").and_then(Value::as_f64) {
        if let Some(n) = value.as_f64() {
            if n > maximum {
                return Err(SchemaViolation::at(path, format!("{n} is above the maximum {maximum}")));
            }
        }
    }

    if let Some(object) = value.as_object() {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for field in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(field) {
                    return Err(SchemaViolation::at(
                        &join(path, field),
                        "required field is missing".to_string(),
                    ));
                }
            }
        }
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (field, field_schema) in properties {
                if let Some(field_value) = object.get(field) {
                    check(field_value, field_schema, &join(path, field))?;
                }
            }
        }
    }

    if let Some(items) = value.as_array() {
        if let Some(item_schema) = schema.get("items") {
            for (i, item) in items.iter().enumerate() {
                check(item, item_schema, &format!("{}[{}]", if path.is_empty() { "$" } else { path }, i))?;
            }
        }
    }

    Ok(())
}

fn check_type(value: &Value, expected: &str, path: &str) -> Result<(), SchemaViolation> {
    let ok = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(SchemaViolation::at(
            path,
            format!("expected {expected}, got {}", type_name(value)),
        ))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}
