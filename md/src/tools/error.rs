//! Tool error types

use studystore::StoreError;
use thiserror::Error;

use crate::llm::LlmError;
use crate::phase::Phase;
use crate::prompts::PromptError;
use crate::tools::schema::SchemaViolation;

/// Errors from validating or executing one tool invocation
///
/// All of these are local to the tool call that raised them: they are
/// reported back on the event stream as a tool-result-with-error frame and
/// never abort the rest of the turn.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{tool}' is not available in the {phase} phase")]
    PhaseViolation { tool: String, phase: Phase },

    #[error("Schema validation failed at {path}: {message}")]
    SchemaValidation { path: String, message: String },

    #[error("Answer length {length} is outside the allowed range {min}..={max} for question {question_id}")]
    AnswerLength {
        question_id: i64,
        length: usize,
        min: u32,
        max: u32,
    },

    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("Prompt template error: {0}")]
    Prompt(#[from] PromptError),
}

impl ToolError {
    /// Stable machine-readable discriminator for error frames
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::PhaseViolation { .. } => "phase_violation",
            ToolError::SchemaValidation { .. } => "schema_validation",
            ToolError::AnswerLength { .. } => "answer_length",
            ToolError::Model(_) => "model",
            ToolError::Persistence(StoreError::NotFound { .. }) => "not_found",
            ToolError::Persistence(StoreError::AttemptsExhausted { .. }) => "attempts_exhausted",
            ToolError::Persistence(_) => "persistence",
            ToolError::Prompt(_) => "internal",
        }
    }
}

impl From<SchemaViolation> for ToolError {
    fn from(violation: SchemaViolation) -> Self {
        ToolError::SchemaValidation {
            path: violation.path,
            message: violation.message,
        }
    }
}
