//! Turn event stream types

use serde::Serialize;
use serde_json::Value;

use crate::llm::TokenUsage;
use crate::tools::{ToolError, ToolOutcome};

/// Reference to a tool call the model declared
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallSummary {
    pub id: String,
    pub name: String,
}

/// One frame of a turn's event stream
///
/// Frames arrive in the order work completed, not on a fixed schedule;
/// consumers must switch on the frame type, not its position. `Done` and
/// `Error` are terminal.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// The model's reply: free text plus any tool calls it declared
    ModelResponse {
        content: String,
        tool_calls: Vec<ToolCallSummary>,
    },

    /// Outcome of one tool call, emitted as soon as it finished
    ToolResult {
        call_id: String,
        tool: String,
        success: bool,
        message: String,
        data: Option<Value>,
        error_code: Option<&'static str>,
    },

    /// Turn-fatal failure; terminates the stream with no Done frame
    Error { code: &'static str, message: String },

    /// Terminal frame of a completed turn
    Done { usage: TokenUsage },
}

impl TurnEvent {
    /// Build a success frame from a tool outcome
    pub fn tool_success(call_id: impl Into<String>, tool: impl Into<String>, outcome: &ToolOutcome) -> Self {
        TurnEvent::ToolResult {
            call_id: call_id.into(),
            tool: tool.into(),
            success: true,
            message: outcome.message.clone(),
            data: Some(outcome.data.clone()),
            error_code: None,
        }
    }

    /// Build an error frame from a tool failure
    pub fn tool_error(call_id: impl Into<String>, tool: impl Into<String>, error: &ToolError) -> Self {
        TurnEvent::ToolResult {
            call_id: call_id.into(),
            tool: tool.into(),
            success: false,
            message: error.to_string(),
            data: None,
            error_code: Some(error.code()),
        }
    }

    /// Frame type tag used by the transport encoding
    pub fn kind(&self) -> &'static str {
        match self {
            TurnEvent::ModelResponse { .. } => "model_response",
            TurnEvent::ToolResult { .. } => "tool_result",
            TurnEvent::Error { .. } => "error",
            TurnEvent::Done { .. } => "done",
        }
    }

    /// JSON payload of this frame
    pub fn payload(&self) -> Value {
        match self {
            TurnEvent::ModelResponse { content, tool_calls } => serde_json::json!({
                "content": content,
                "tool_calls": tool_calls,
            }),
            TurnEvent::ToolResult {
                call_id,
                tool,
                success,
                message,
                data,
                error_code,
            } => serde_json::json!({
                "call_id": call_id,
                "tool": tool,
                "success": success,
                "message": message,
                "data": data,
                "error": error_code,
            }),
            TurnEvent::Error { code, message } => serde_json::json!({
                "error": code,
                "message": message,
            }),
            TurnEvent::Done { usage } => serde_json::json!({
                "usage": usage,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    #[test]
    fn test_tool_error_frame_carries_code() {
        let err = ToolError::PhaseViolation {
            tool: "createQuizForGoal".to_string(),
            phase: Phase::Roadmap,
        };
        let event = TurnEvent::tool_error("call_1", "createQuizForGoal", &err);

        assert_eq!(event.kind(), "tool_result");
        let payload = event.payload();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error"], "phase_violation");
        assert!(payload["data"].is_null());
    }

    #[test]
    fn test_tool_success_frame_carries_data() {
        let outcome = ToolOutcome::new("Created", serde_json::json!({"goals": []}));
        let event = TurnEvent::tool_success("call_1", "createRoadmapSkeleton", &outcome);

        let payload = event.payload();
        assert_eq!(payload["success"], true);
        assert!(payload["data"]["goals"].is_array());
        assert!(payload["error"].is_null());
    }

    #[test]
    fn test_done_frame_kind() {
        let event = TurnEvent::Done {
            usage: TokenUsage::default(),
        };
        assert_eq!(event.kind(), "done");
    }
}
