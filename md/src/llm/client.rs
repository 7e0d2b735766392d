//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless model client - each call is independent
///
/// The orchestration core holds the whole conversation; the client only
/// ships one request and returns one response. Structured-output mode is
/// requested via [`CompletionRequest::response_format`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Canned-response client for tests and offline development
pub mod mock {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm::{StopReason, TokenUsage, ToolCall};

    /// Mock LLM client returning canned responses in order
    pub struct MockLlmClient {
        responses: Mutex<Vec<Result<CompletionResponse, LlmError>>>,
        call_count: AtomicUsize,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<Result<CompletionResponse, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                call_count: AtomicUsize::new(0),
            }
        }

        /// A client that always answers with plain text
        pub fn text_only(text: impl Into<String>) -> Self {
            Self::new(vec![Ok(text_response(text, vec![]))])
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    /// Build a text response carrying the given tool calls
    pub fn text_response(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> CompletionResponse {
        let stop_reason = if tool_calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        };
        CompletionResponse {
            content: Some(text.into()),
            tool_calls,
            stop_reason,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 25,
            },
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap_or_else(|p| p.into_inner());
            if responses.is_empty() {
                return Err(LlmError::InvalidResponse("No more mock responses".to_string()));
            }
            responses.remove(0)
        }
    }

}
