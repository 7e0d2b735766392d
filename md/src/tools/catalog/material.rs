//! Learning material tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use studystore::NewMaterial;
use tracing::info;

use crate::phase::ToolId;
use crate::tools::context::ToolContext;
use crate::tools::error::ToolError;
use crate::tools::traits::{Tool, ToolOutcome};

use super::{generate_structured, goal_for_session, persist_with_retry};

#[derive(Debug, Deserialize)]
struct MaterialPayload {
    title: String,
    description: String,
    content: String,
    estimated_time_minutes: u32,
}

/// Generate one learning material for a goal
pub struct CreateLearningMaterialTool;

#[async_trait]
impl Tool for CreateLearningMaterialTool {
    fn id(&self) -> ToolId {
        ToolId::CreateLearningMaterial
    }

    fn description(&self) -> &'static str {
        "Create a comprehensive learning material for one roadmap goal: explanations, examples, and \
         exercises in Markdown, contextualized with the previous and next goals for smooth progression. \
         Use this after a roadmap exists and the learner wants to start studying a goal."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goal_id": {
                    "type": "integer",
                    "description": "Database id of the goal to create the material for, from the goals list"
                }
            },
            "required": ["goal_id"]
        })
    }

    fn result_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "description": { "type": "string", "description": "What this material covers" },
                "content": { "type": "string", "description": "Main learning content in Markdown" },
                "exercises": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "estimated_time_minutes": { "type": "integer", "minimum": 1 }
            },
            "required": ["title", "description", "content", "estimated_time_minutes"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError> {
        let goal_id = args["goal_id"].as_i64().unwrap_or_default();
        let (goal, siblings) = goal_for_session(ctx, goal_id)?;

        let previous = siblings.iter().find(|g| g.goal_number + 1 == goal.goal_number);
        let next = siblings.iter().find(|g| g.goal_number == goal.goal_number + 1);

        let vars = json!({
            "currentGoalTitle": goal.title,
            "currentGoalDescription": goal.description,
            "previousGoalTitle": previous.map(|g| g.title.as_str()).unwrap_or("None (first goal)"),
            "previousGoalDescription": previous.map(|g| g.description.as_str()).unwrap_or(""),
            "nextGoalTitle": next.map(|g| g.title.as_str()).unwrap_or("None (final goal)"),
            "nextGoalDescription": next.map(|g| g.description.as_str()).unwrap_or(""),
        });

        let schema = self.result_schema();
        let generated =
            generate_structured(ctx, "createlearningmaterial", &vars, "learning_material", &schema).await?;
        let payload: MaterialPayload = serde_json::from_value(generated.clone()).map_err(|e| {
            ToolError::SchemaValidation {
                path: "$".to_string(),
                message: format!("material payload did not deserialize: {e}"),
            }
        })?;

        let new_material = NewMaterial {
            goal_id,
            title: payload.title.clone(),
            material_type: "lesson".to_string(),
            description: payload.description,
            content: payload.content,
            estimated_minutes: payload.estimated_time_minutes,
            difficulty: goal.skill_level,
        };
        let material = persist_with_retry(|| ctx.store.create_material(&new_material))?;

        info!(goal_id, material_id = material.id, "learning material created");
        Ok(ToolOutcome::new(
            format!("Created learning material \"{}\" for goal {}", payload.title, goal.goal_number),
            generated,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use studystore::{Goal, NewGoal, SkillLevel, StudyStore};

    use super::*;
    use crate::llm::client::mock::{MockLlmClient, text_response};
    use crate::prompts::EmbeddedPrompts;

    fn material_response() -> String {
        json!({
            "title": "Intro to Ownership",
            "description": "Covers moves and borrows",
            "content": "# Ownership\n...",
            "exercises": ["Explain a move"],
            "estimated_time_minutes": 45,
        })
        .to_string()
    }

    fn ctx_with_goals(llm: MockLlmClient, goal_count: u32) -> (ToolContext, Vec<Goal>) {
        let store = Arc::new(StudyStore::open_in_memory().unwrap());
        let session = store.create_session("u", "s", None).unwrap();
        let goals: Vec<NewGoal> = (1..=goal_count)
            .map(|n| NewGoal {
                goal_number: n,
                title: format!("Goal {n}"),
                description: "d".to_string(),
                priority: 2,
                skill_level: SkillLevel::Advanced,
                estimated_hours: 10,
            })
            .collect();
        let (_, stored) = store
            .create_roadmap_with_goals(session.id, "r", 3, "p", "t", &goals)
            .unwrap();
        (
            ToolContext::new(session.id, store, Arc::new(llm), Arc::new(EmbeddedPrompts::new()), 4096),
            stored,
        )
    }

    #[tokio::test]
    async fn test_material_is_persisted_with_goal_difficulty() {
        let llm = MockLlmClient::new(vec![Ok(text_response(material_response(), vec![]))]);
        let (ctx, goals) = ctx_with_goals(llm, 2);

        let outcome = CreateLearningMaterialTool
            .execute(json!({"goal_id": goals[0].id}), &ctx)
            .await
            .unwrap();

        assert!(outcome.message.contains("Intro to Ownership"));
        let materials = ctx.store.materials_by_goal(goals[0].id).unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].difficulty, SkillLevel::Advanced);
        assert_eq!(materials[0].estimated_minutes, 45);
    }

    #[tokio::test]
    async fn test_unknown_goal_is_not_found() {
        let llm = MockLlmClient::new(vec![]);
        let (ctx, _) = ctx_with_goals(llm, 1);

        let err = CreateLearningMaterialTool
            .execute(json!({"goal_id": 9999}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn test_goal_from_another_session_is_rejected() {
        let store = Arc::new(StudyStore::open_in_memory().unwrap());
        let session_a = store.create_session("u", "a", None).unwrap();
        let session_b = store.create_session("u", "b", None).unwrap();
        let goals = vec![NewGoal {
            goal_number: 1,
            title: "g".to_string(),
            description: "d".to_string(),
            priority: 3,
            skill_level: SkillLevel::Intermediate,
            estimated_hours: 5,
        }];
        let (_, stored_a) = store
            .create_roadmap_with_goals(session_a.id, "r", 1, "p", "t", &goals)
            .unwrap();
        store
            .create_roadmap_with_goals(session_b.id, "r", 1, "p", "t", &goals)
            .unwrap();

        let ctx = ToolContext::new(
            session_b.id,
            store,
            Arc::new(MockLlmClient::new(vec![])),
            Arc::new(EmbeddedPrompts::new()),
            4096,
        );
        // Session B asks for session A's goal
        let err = CreateLearningMaterialTool
            .execute(json!({"goal_id": stored_a[0].id}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}
