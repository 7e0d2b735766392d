//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;

use crate::phase::ToolId;

use super::context::ToolContext;
use super::error::ToolError;

/// A schema-validated operation the model may request
///
/// Each tool declares an argument schema (validated before execution) and a
/// result schema (what its outcome data conforms to - also the
/// structured-output contract when the result is model-generated).
#[async_trait]
pub trait Tool: Send + Sync {
    /// Identifier; the wire name comes from [`ToolId::name`]
    fn id(&self) -> ToolId;

    /// Model-facing description
    fn description(&self) -> &'static str;

    /// JSON schema for the argument payload
    fn input_schema(&self) -> Value;

    /// JSON schema the outcome data conforms to
    fn result_schema(&self) -> Value;

    /// Execute the tool
    ///
    /// Arguments have already been validated against [`Tool::input_schema`].
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError>;
}

/// Result of a successful tool execution
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Human-readable summary, also folded into the assistant message
    pub message: String,

    /// Structured payload conforming to the tool's result schema
    pub data: Value,
}

impl ToolOutcome {
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_construction() {
        let outcome = ToolOutcome::new("Created roadmap with 5 goals", serde_json::json!({"goals": []}));
        assert_eq!(outcome.message, "Created roadmap with 5 goals");
        assert!(outcome.data["goals"].is_array());
    }
}
