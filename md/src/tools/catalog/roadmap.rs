//! Roadmap skeleton tools

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use studystore::{Goal, NewGoal, Roadmap, SkillLevel};
use tracing::info;

use crate::phase::ToolId;
use crate::tools::context::ToolContext;
use crate::tools::error::ToolError;
use crate::tools::traits::{Tool, ToolOutcome};

use super::{generate_structured, persist_with_retry};

/// Assumed study pace when turning goal hours into a week estimate
const HOURS_PER_WEEK: u32 = 10;

/// Model-generated skeleton, already schema-validated
#[derive(Debug, Deserialize)]
struct SkeletonPayload {
    goals: Vec<SkeletonGoal>,
    graduation_project: String,
    graduation_project_title: String,
}

#[derive(Debug, Deserialize)]
struct SkeletonGoal {
    goal_number: u32,
    title: String,
    description: String,
    priority: u8,
    estimated_hours: u32,
}

/// Structured-output contract shared by both roadmap tools
fn skeleton_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "goals": {
                "type": "array",
                "description": "Learning goals ordered by priority and dependencies",
                "items": {
                    "type": "object",
                    "properties": {
                        "goal_number": { "type": "integer", "description": "Sequential goal number (1, 2, 3, ...)" },
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "priority": { "type": "integer", "minimum": 1, "maximum": 5 },
                        "estimated_hours": { "type": "integer", "minimum": 1 }
                    },
                    "required": ["goal_number", "title", "description", "priority", "estimated_hours"]
                }
            },
            "graduation_project": { "type": "string" },
            "graduation_project_title": { "type": "string" }
        },
        "required": ["goals", "graduation_project", "graduation_project_title"]
    })
}

/// Serialize a persisted roadmap back into the skeleton wire shape
fn skeleton_json(roadmap: &Roadmap, goals: &[Goal]) -> Value {
    json!({
        "goals": goals
            .iter()
            .map(|g| {
                json!({
                    "goal_number": g.goal_number,
                    "title": g.title,
                    "description": g.description,
                    "priority": g.priority,
                    "estimated_hours": g.estimated_hours,
                })
            })
            .collect::<Vec<_>>(),
        "graduation_project": roadmap.graduation_project,
        "graduation_project_title": roadmap.graduation_project_title,
    })
}

fn parse_skeleton(value: Value) -> Result<SkeletonPayload, ToolError> {
    serde_json::from_value(value).map_err(|e| ToolError::SchemaValidation {
        path: "$".to_string(),
        message: format!("skeleton payload did not deserialize: {e}"),
    })
}

fn to_new_goals(payload: &SkeletonPayload) -> Vec<NewGoal> {
    payload
        .goals
        .iter()
        .map(|g| NewGoal {
            goal_number: g.goal_number,
            title: g.title.clone(),
            description: g.description.clone(),
            priority: g.priority,
            skill_level: SkillLevel::from_priority(g.priority),
            estimated_hours: g.estimated_hours,
        })
        .collect()
}

fn estimated_weeks(payload: &SkeletonPayload) -> u32 {
    let total_hours: u32 = payload.goals.iter().map(|g| g.estimated_hours).sum();
    (total_hours / HOURS_PER_WEEK).max(1)
}

/// Create the learning roadmap for a session
pub struct CreateRoadmapSkeletonTool;

#[async_trait]
impl Tool for CreateRoadmapSkeletonTool {
    fn id(&self) -> ToolId {
        ToolId::CreateRoadmapSkeleton
    }

    fn description(&self) -> &'static str {
        "Create a personalized learning roadmap based on the learner's goals, experience, and optional job \
         listings. Generates an ordered list of learning goals with priorities and time estimates, plus a \
         capstone graduation project. Use this when the learner wants a learning path, is preparing for a \
         role, or wants to skill up in a domain."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "userRequest": {
                    "type": "string",
                    "description": "The learner's specific request or goal (e.g., 'I want to become a Python backend developer')"
                },
                "userExperience": {
                    "type": "string",
                    "description": "The learner's current experience and background (optional)"
                },
                "userDomains": {
                    "type": "string",
                    "description": "Domains the learner is interested in or has experience with (optional)"
                },
                "jobListings": {
                    "type": "string",
                    "description": "Job listings the learner wants to prepare for (optional)"
                },
                "numberOfGoals": {
                    "type": "integer",
                    "description": "Number of learning goals to generate",
                    "minimum": 3,
                    "maximum": 15
                }
            },
            "required": ["userRequest"]
        })
    }

    fn result_schema(&self) -> Value {
        skeleton_schema()
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError> {
        // Idempotent bootstrap: a second create returns the existing
        // skeleton instead of duplicating it
        if let Some(existing) = ctx.store.roadmap_by_session(ctx.session_id)? {
            let goals = ctx.store.goals_by_roadmap(existing.id)?;
            info!(session_id = ctx.session_id, roadmap_id = existing.id, "roadmap already exists, returning it");
            return Ok(ToolOutcome::new(
                format!("A roadmap with {} goals already exists for this session", goals.len()),
                skeleton_json(&existing, &goals),
            ));
        }

        let user_request = args["userRequest"].as_str().unwrap_or_default().to_string();
        let vars = json!({
            "userRequest": user_request,
            "userExperience": args["userExperience"].as_str().unwrap_or("Not provided"),
            "userDomains": args["userDomains"].as_str().unwrap_or("Not specified"),
            "jobListings": args["jobListings"].as_str().unwrap_or("None"),
            "numberOfGoals": args["numberOfGoals"].as_i64().unwrap_or(6),
        });

        let schema = self.result_schema();
        let generated = generate_structured(ctx, "createroadmapskeleton", &vars, "roadmap_skeleton", &schema).await?;
        let payload = parse_skeleton(generated.clone())?;
        let new_goals = to_new_goals(&payload);

        let (roadmap, goals) = persist_with_retry(|| {
            ctx.store.create_roadmap_with_goals(
                ctx.session_id,
                &user_request,
                estimated_weeks(&payload),
                &payload.graduation_project,
                &payload.graduation_project_title,
                &new_goals,
            )
        })?;

        info!(
            session_id = ctx.session_id,
            roadmap_id = roadmap.id,
            goal_count = goals.len(),
            "roadmap created"
        );
        Ok(ToolOutcome::new(
            format!("Created a roadmap with {} goals", goals.len()),
            generated,
        ))
    }
}

/// Revise the existing roadmap skeleton
pub struct EditRoadmapSkeletonTool;

#[async_trait]
impl Tool for EditRoadmapSkeletonTool {
    fn id(&self) -> ToolId {
        ToolId::EditRoadmapSkeleton
    }

    fn description(&self) -> &'static str {
        "Revise the session's existing learning roadmap: add, remove, reorder, or rescope goals based on \
         the learner's feedback. The whole revised goal set replaces the current one."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "userRequest": {
                    "type": "string",
                    "description": "The change the learner is asking for"
                }
            },
            "required": ["userRequest"]
        })
    }

    fn result_schema(&self) -> Value {
        skeleton_schema()
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError> {
        let roadmap = ctx
            .store
            .roadmap_by_session(ctx.session_id)?
            .ok_or(studystore::StoreError::NotFound {
                entity: "roadmap",
                id: ctx.session_id,
            })?;
        let goals = ctx.store.goals_by_roadmap(roadmap.id)?;

        let current = serde_json::to_string_pretty(&skeleton_json(&roadmap, &goals))
            .unwrap_or_else(|_| "{}".to_string());
        let vars = json!({
            "userRequest": args["userRequest"].as_str().unwrap_or_default(),
            "currentRoadmap": current,
        });

        let schema = self.result_schema();
        let generated = generate_structured(ctx, "editroadmapskeleton", &vars, "roadmap_skeleton", &schema).await?;
        let payload = parse_skeleton(generated.clone())?;
        let new_goals = to_new_goals(&payload);

        let (updated, stored) = persist_with_retry(|| {
            ctx.store.replace_roadmap_goals(
                roadmap.id,
                estimated_weeks(&payload),
                &payload.graduation_project,
                &payload.graduation_project_title,
                &new_goals,
            )
        })?;

        info!(roadmap_id = updated.id, goal_count = stored.len(), "roadmap revised");
        Ok(ToolOutcome::new(
            format!("Updated the roadmap; it now has {} goals", stored.len()),
            generated,
        ))
    }
}
