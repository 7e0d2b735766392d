//! The tool catalogue
//!
//! One module per domain area; every tool follows the same shape: validate,
//! generate under a structured-output contract where content is
//! model-written, persist atomically.

mod graduation;
mod material;
mod quiz;
mod roadmap;

pub use graduation::{CreateGraduationProjectTool, EvaluateGraduationAnswerTool};
pub use material::CreateLearningMaterialTool;
pub use quiz::CreateQuizForGoalTool;
pub use roadmap::{CreateRoadmapSkeletonTool, EditRoadmapSkeletonTool};

use serde_json::Value;
use studystore::StoreError;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmError, ResponseFormat};
use crate::tools::context::ToolContext;
use crate::tools::error::ToolError;
use crate::tools::schema;

/// Ask the model for content under a structured-output contract
///
/// Renders the named template, runs one completion with the schema as the
/// response format, and validates the returned JSON against that same
/// schema before handing it back. Anything that fails validation never
/// reaches the store.
pub(crate) async fn generate_structured(
    ctx: &ToolContext,
    template: &str,
    vars: &Value,
    schema_name: &str,
    response_schema: &Value,
) -> Result<Value, ToolError> {
    debug!(%template, %schema_name, "generate_structured: called");
    let prompt = ctx.prompts.render(template, vars)?;

    let request = CompletionRequest {
        system_prompt: prompt.system,
        messages: vec![ChatMessage::user(prompt.user)],
        tools: vec![],
        max_tokens: ctx.max_tokens,
        temperature: prompt.temperature,
        response_format: Some(ResponseFormat {
            name: schema_name.to_string(),
            schema: response_schema.clone(),
        }),
    };

    let response = ctx.llm.complete(request).await?;
    let content = response
        .content
        .ok_or_else(|| ToolError::Model(LlmError::InvalidResponse("empty structured response".to_string())))?;

    let value: Value = serde_json::from_str(&content).map_err(|e| ToolError::SchemaValidation {
        path: "$".to_string(),
        message: format!("response is not valid JSON: {e}"),
    })?;

    schema::validate(&value, response_schema)?;
    Ok(value)
}

/// Resolve a goal and check it belongs to this session's roadmap
///
/// Goals from other sessions' roadmaps are reported as missing.
pub(crate) fn goal_for_session(
    ctx: &ToolContext,
    goal_id: i64,
) -> Result<(studystore::Goal, Vec<studystore::Goal>), ToolError> {
    let roadmap = ctx
        .store
        .roadmap_by_session(ctx.session_id)?
        .ok_or(StoreError::NotFound {
            entity: "roadmap",
            id: ctx.session_id,
        })?;
    let goal = ctx.store.get_goal(goal_id)?;
    if goal.roadmap_id != roadmap.id {
        return Err(ToolError::Persistence(StoreError::NotFound {
            entity: "goal",
            id: goal_id,
        }));
    }
    let siblings = ctx.store.goals_by_roadmap(roadmap.id)?;
    Ok((goal, siblings))
}

/// Run a persistence operation, retrying once on transient failure
///
/// Busy and constraint errors get exactly one immediate retry, no backoff;
/// a second failure is final for this tool call.
pub(crate) fn persist_with_retry<T>(mut op: impl FnMut() -> Result<T, StoreError>) -> Result<T, StoreError> {
    match op() {
        Err(e) if e.is_retryable() => {
            warn!(error = %e, "persist_with_retry: retrying after transient store error");
            op()
        }
        other => other,
    }
}
