//! Typed access to tool call arguments.

use crate::error::ThreadlineError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    /// Wrap raw arguments. A JSON-encoded string is decoded first, since some
    /// models send arguments as a string.
    pub fn new(value: serde_json::Value) -> Self {
        let value = match value {
            serde_json::Value::String(raw) if raw.trim().is_empty() => serde_json::json!({}),
            serde_json::Value::String(raw) => {
                serde_json::from_str(raw.trim()).unwrap_or(serde_json::Value::String(raw))
            }
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a required string argument.
    pub fn get_str(&self, key: &str) -> Result<&str, ThreadlineError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ThreadlineError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional integer argument.
    pub fn get_i64_opt(&self, key: &str) -> Option<i64> {
        self.value.get(key).and_then(|v| v.as_i64())
    }

    /// Get an optional list of strings. Non-string items are skipped.
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        self.value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get an argument of any shape.
    pub fn get_value(&self, key: &str) -> Result<&serde_json::Value, ThreadlineError> {
        self.value
            .get(key)
            .ok_or_else(|| ThreadlineError::InvalidArgument(format!("Missing argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ThreadlineError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            ThreadlineError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
