//! Streaming turn coordination
//!
//! One user message in, one assistant message out, with multiplexed events
//! streamed along the way: the model's response, one frame per tool result
//! in execution order, and a terminal done (or error) frame.

mod coordinator;
mod events;
pub mod transport;

pub use coordinator::{TurnConfig, TurnCoordinator};
pub use events::{ToolCallSummary, TurnEvent};
