//! SSE boundary encoding
//!
//! The core deals only in [`TurnEvent`]; this adapter renders frames in
//! Server-Sent-Events wire format for HTTP transports and the CLI's `--sse`
//! mode.

use super::events::TurnEvent;

/// Encode one event as an SSE frame
pub fn sse_frame(event: &TurnEvent) -> String {
    format!("event: {}\ndata: {}\n\n", event.kind(), event.payload())
}
