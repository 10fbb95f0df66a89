//! Check model-supplied tool arguments against a tool's JSON Schema.

use crate::error::ParleyError;

/// Validate tool arguments against a JSON Schema.
///
/// Top-level only: object shape, required fields, and the declared type of
/// each known property. The first violation is reported.
pub fn validate_arguments(
    args: &serde_json::Value,
    schema: &serde_json::Value,
) -> Result<(), ParleyError> {
    let expects_object = schema.get("type").and_then(|v| v.as_str()) == Some("object");
    let Some(obj) = args.as_object() else {
        if expects_object {
            return Err(ParleyError::InvalidArgument(format!(
                "expected object arguments, got {}",
                json_type_name(args)
            )));
        }
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str());
    for name in required {
        if !obj.contains_key(name) {
            return Err(ParleyError::InvalidArgument(format!(
                "missing required field '{name}'"
            )));
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) {
        for (key, value) in obj {
            let expected = properties
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(|t| t.as_str());
            if let Some(expected) = expected {
                if !value_matches_type(value, expected) {
                    return Err(ParleyError::InvalidArgument(format!(
                        "field '{key}' expected type '{expected}', got {}",
                        json_type_name(value)
                    )));
                }
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
