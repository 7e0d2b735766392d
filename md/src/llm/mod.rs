//! LLM client module
//!
//! Provides the model-endpoint abstraction used by the turn coordinator and
//! by tools that generate content under a structured-output contract.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAiCompatClient;
pub use types::{
    ChatMessage, CompletionRequest, CompletionResponse, ResponseFormat, Role, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai-compat" => Ok(Arc::new(OpenAiCompatClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: openai-compat",
            other
        ))),
    }
}
