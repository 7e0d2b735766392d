//! Dispatcher - validates and executes one tool invocation

use tracing::{debug, warn};

use crate::llm::ToolCall;
use crate::phase::{PhaseDecision, ToolId};

use super::context::ToolContext;
use super::error::ToolError;
use super::registry::ToolRegistry;
use super::schema;
use super::traits::ToolOutcome;

/// Validates and executes tool calls proposed by the model
///
/// Eligibility is enforced here as the second line of defense; the first is
/// that ineligible tools are never offered to the model.
pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Validate and execute one tool call
    ///
    /// Failure is local to this call: the caller reports it as a
    /// tool-result-with-error frame and moves on to the next call.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        decision: &PhaseDecision,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        debug!(tool = %call.name, phase = %decision.phase, "dispatch: called");

        // Unknown names are trivially outside the eligible set
        let id = ToolId::parse(&call.name).ok_or_else(|| ToolError::PhaseViolation {
            tool: call.name.clone(),
            phase: decision.phase,
        })?;

        if !decision.is_eligible(id) {
            warn!(tool = %id, phase = %decision.phase, "dispatch: tool outside eligible set");
            return Err(ToolError::PhaseViolation {
                tool: call.name.clone(),
                phase: decision.phase,
            });
        }

        let tool = self.registry.get(id).ok_or_else(|| ToolError::PhaseViolation {
            tool: call.name.clone(),
            phase: decision.phase,
        })?;

        schema::validate(&call.arguments, &tool.input_schema())?;

        tool.execute(call.arguments.clone(), ctx).await
    }
}
