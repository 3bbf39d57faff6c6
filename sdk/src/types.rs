//! Tool input/output types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured result returned by a tool
pub type ToolOutput = Map<String, Value>;

/// Keyword parameters passed to a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolInput {
    pub params: Map<String, Value>,
}

impl ToolInput {
    /// Create an empty ToolInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a required string parameter
    pub fn param_str(&self, key: &str) -> Result<String, ToolError> {
        match self.params.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(ToolError::InvalidParameter {
                name: key.to_string(),
                reason: format!("expected a string, got {}", type_name(other)),
            }),
            None => Err(ToolError::MissingParameter(key.to_string())),
        }
    }

}

impl From<Map<String, Value>> for ToolInput {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
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

/// Tool-specific errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Division by zero")]
    DivisionByZero,
}
