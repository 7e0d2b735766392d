//! Quiz generation tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use studystore::NewQuizQuestion;
use tracing::info;

use crate::phase::ToolId;
use crate::tools::context::ToolContext;
use crate::tools::error::ToolError;
use crate::tools::traits::{Tool, ToolOutcome};

use super::{generate_structured, goal_for_session, persist_with_retry};

/// Quiz defaults matching the platform's assessment policy
const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;
const DEFAULT_PASSING_SCORE: f64 = 70.0;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
struct QuizPayload {
    questions: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    question: String,
    options: Vec<String>,
    correct_answer: u32,
    explanation: String,
}

/// Generate a quiz for a roadmap goal
pub struct CreateQuizForGoalTool;

#[async_trait]
impl Tool for CreateQuizForGoalTool {
    fn id(&self) -> ToolId {
        ToolId::CreateQuizForGoal
    }

    fn description(&self) -> &'static str {
        "Create a multiple-choice quiz testing one roadmap goal. Each question has four options, one \
         correct answer, and an explanation. Use this when the learner wants to check their understanding \
         of a goal they have studied."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goal_id": {
                    "type": "integer",
                    "description": "Database id of the goal to quiz, from the goals list"
                }
            },
            "required": ["goal_id"]
        })
    }

    fn result_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string" },
                            "options": {
                                "type": "array",
                                "items": { "type": "string" }
                            },
                            "correct_answer": {
                                "type": "integer",
                                "description": "Zero-based index into options",
                                "minimum": 0,
                                "maximum": 3
                            },
                            "explanation": { "type": "string" }
                        },
                        "required": ["question", "options", "correct_answer", "explanation"]
                    }
                }
            },
            "required": ["questions"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError> {
        let goal_id = args["goal_id"].as_i64().unwrap_or_default();
        let (goal, _) = goal_for_session(ctx, goal_id)?;

        let vars = json!({
            "learningGoal": goal.title,
            "goalDescription": goal.description,
        });

        let schema = self.result_schema();
        let generated = generate_structured(ctx, "createquizforgoal", &vars, "quiz_for_goal", &schema).await?;
        let payload: QuizPayload = serde_json::from_value(generated.clone()).map_err(|e| {
            ToolError::SchemaValidation {
                path: "$".to_string(),
                message: format!("quiz payload did not deserialize: {e}"),
            }
        })?;

        let questions: Vec<NewQuizQuestion> = payload
            .questions
            .into_iter()
            .map(|q| NewQuizQuestion {
                question: q.question,
                options: q.options,
                correct_answer: q.correct_answer,
                explanation: q.explanation,
                points: 1,
            })
            .collect();

        let (quiz, stored) = persist_with_retry(|| {
            ctx.store.create_quiz_with_questions(
                goal_id,
                &format!("Quiz: {}", goal.title),
                &format!("Generated quiz for goal {}", goal.goal_number),
                DEFAULT_TIME_LIMIT_MINUTES,
                DEFAULT_PASSING_SCORE,
                DEFAULT_MAX_ATTEMPTS,
                &questions,
            )
        })?;

        info!(goal_id, quiz_id = quiz.id, question_count = stored.len(), "quiz created");
        Ok(ToolOutcome::new(
            format!("Created a {}-question quiz for goal {}", stored.len(), goal.goal_number),
            generated,
        ))
    }
}
