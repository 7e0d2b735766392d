//! Prompt templates
//!
//! Every model call renders a named template. Templates ship embedded in
//! the binary; a configured directory of `.prompt.yaml` files overrides
//! them per template for development and tuning.

mod embedded;
mod provider;

pub use provider::{EmbeddedPrompts, FilePrompts, PromptError, PromptProvider, RenderedPrompt};
