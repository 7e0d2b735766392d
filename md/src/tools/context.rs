//! ToolContext - execution context for tools

use std::sync::Arc;

use studystore::StudyStore;

use crate::llm::LlmClient;
use crate::prompts::PromptProvider;

/// Execution context for tools - scoped to a single session
///
/// Carries the collaborators a tool needs to do its work: the persistence
/// gateway, the model client for content generation, and the prompt
/// provider. Everything is injected; tools hold no global state.
#[derive(Clone)]
pub struct ToolContext {
    /// Session the turn belongs to
    pub session_id: i64,

    pub store: Arc<StudyStore>,
    pub llm: Arc<dyn LlmClient>,
    pub prompts: Arc<dyn PromptProvider>,

    /// Token budget for tool-internal model calls
    pub max_tokens: u32,
}

impl ToolContext {
    pub fn new(
        session_id: i64,
        store: Arc<StudyStore>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<dyn PromptProvider>,
        max_tokens: u32,
    ) -> Self {
        Self {
            session_id,
            store,
            llm,
            prompts,
            max_tokens,
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("session_id", &self.session_id)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
