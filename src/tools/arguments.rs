//! Typed access to tool call arguments.

use crate::error::ParleyError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Normalize whatever a backend handed us into an argument object.
    ///
    /// Providers sometimes deliver arguments as a JSON-encoded string. That
    /// string is decoded; blank, null or undecodable input becomes `{}`.
    pub fn from_raw(raw: &serde_json::Value) -> Self {
        let value = match raw {
            serde_json::Value::String(encoded) => {
                serde_json::from_str::<serde_json::Value>(encoded.trim())
                    .ok()
                    .filter(|v| !v.is_null())
                    .unwrap_or_else(|| serde_json::json!({}))
            }
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ParleyError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ParleyError::InvalidArgument(format!("Missing string argument: {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_string_encoded_arguments() {
        let args = ToolArguments::from_raw(&json!("{\"query\": \"rust\"}"));
        assert_eq!(args.get_str("query").unwrap(), "rust");
    }

    #[test]
    fn undecodable_or_empty_arguments_become_empty_object() {
        assert_eq!(ToolArguments::from_raw(&json!("")).raw(), &json!({}));
        assert_eq!(ToolArguments::from_raw(&json!("{oops")).raw(), &json!({}));
        assert_eq!(ToolArguments::from_raw(&serde_json::Value::Null).raw(), &json!({}));
    }

    #[test]
    fn missing_string_is_an_invalid_argument() {
        let args = ToolArguments::new(json!({ "query": 3 }));
        assert!(matches!(
            args.get_str("query"),
            Err(ParleyError::InvalidArgument(_))
        ));
    }
}
