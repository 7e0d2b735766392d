//! LLM request/response types
//!
//! These types model an OpenAI-compatible chat-completions API but stay
//! provider-agnostic enough to support other backends.

use serde::{Deserialize, Serialize};

/// A completion request - everything needed for one model call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from a template)
    pub system_prompt: String,

    /// Conversation context
    pub messages: Vec<ChatMessage>,

    /// Tools offered to the model for this call (eligible set only)
    pub tools: Vec<ToolDefinition>,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Sampling temperature, if the prompt template specifies one
    pub temperature: Option<f32>,

    /// Structured-output contract: when set, the response content must
    /// validate against this schema
    pub response_format: Option<ResponseFormat>,
}

impl CompletionRequest {
    /// A plain request with no tools and no structured output
    pub fn new(system_prompt: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            tools: Vec::new(),
            max_tokens,
            temperature: None,
            response_format: None,
        }
    }
}

/// Named JSON schema for structured output mode
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: serde_json::Value,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Free-text content (if any)
    pub content: Option<String>,

    /// Tool calls requested by the model, in model order
    pub tool_calls: Vec<ToolCall>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

/// A tool call requested by the model
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
}

impl StopReason {
    /// Parse from an OpenAI-style finish_reason string
    pub fn from_finish_reason(s: &str) -> Self {
        match s {
            "tool_calls" => StopReason::ToolUse,
            "length" => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate usage from another call in the same turn
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Tool definition offered to the model
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Convert to the OpenAI function-calling wire format
    pub fn to_openai_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");

        let msg = ChatMessage::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_stop_reason_from_finish_reason() {
        assert_eq!(StopReason::from_finish_reason("stop"), StopReason::EndTurn);
        assert_eq!(StopReason::from_finish_reason("tool_calls"), StopReason::ToolUse);
        assert_eq!(StopReason::from_finish_reason("length"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_finish_reason("unknown"), StopReason::EndTurn);
    }

    #[test]
    fn test_tool_definition_to_openai_schema() {
        let tool = ToolDefinition::new(
            "createRoadmapSkeleton",
            "Create a learning roadmap",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "userRequest": { "type": "string" }
                },
                "required": ["userRequest"]
            }),
        );

        let schema = tool.to_openai_schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "createRoadmapSkeleton");
        assert!(schema["function"]["parameters"].is_object());
    }

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 20,
        };
        usage.add(TokenUsage {
            input_tokens: 50,
            output_tokens: 30,
        });
        assert_eq!(usage.input_tokens, 150);
        assert_eq!(usage.output_tokens, 50);
    }
}
