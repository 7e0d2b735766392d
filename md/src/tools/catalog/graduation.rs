//! Graduation project tools

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use studystore::{GraduationQuestion, NewGraduationQuestion, StoreError};
use tracing::{info, warn};

use crate::phase::ToolId;
use crate::tools::context::ToolContext;
use crate::tools::error::ToolError;
use crate::tools::traits::{Tool, ToolOutcome};

use super::{generate_structured, persist_with_retry};

#[derive(Debug, Deserialize)]
struct ProjectPayload {
    questions: Vec<ProjectQuestionPayload>,
}

#[derive(Debug, Deserialize)]
struct ProjectQuestionPayload {
    prompt: String,
    rationale: String,
    difficulty: String,
    evaluation_rubric: Vec<String>,
    answer_min_chars: u32,
    answer_max_chars: u32,
    estimated_time_minutes: u32,
}

#[derive(Debug, Deserialize)]
struct EvaluationPayload {
    overall_score: f64,
    feedback: String,
}

fn questions_json(questions: &[GraduationQuestion]) -> Value {
    json!({
        "questions": questions
            .iter()
            .map(|q| {
                json!({
                    "prompt": q.prompt,
                    "rationale": q.rationale,
                    "difficulty": q.difficulty,
                    "evaluation_rubric": q.evaluation_rubric,
                    "answer_min_chars": q.answer_min_chars,
                    "answer_max_chars": q.answer_max_chars,
                    "estimated_time_minutes": q.estimated_minutes,
                })
            })
            .collect::<Vec<_>>()
    })
}

/// Generate the graduation project assessment for a finished roadmap
pub struct CreateGraduationProjectTool;

#[async_trait]
impl Tool for CreateGraduationProjectTool {
    fn id(&self) -> ToolId {
        ToolId::CreateGraduationProject
    }

    fn description(&self) -> &'static str {
        "Generate the graduation project assessment: open-ended questions testing synthesis and application \
         across all completed goals, each with an evaluation rubric and an answer length window. Use this \
         when the learner has finished their roadmap materials and is ready for the final assessment."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
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
                            "prompt": { "type": "string" },
                            "rationale": { "type": "string" },
                            "difficulty": {
                                "type": "string",
                                "enum": ["introductory", "intermediate", "advanced"]
                            },
                            "evaluation_rubric": {
                                "type": "array",
                                "items": { "type": "string" }
                            },
                            "answer_min_chars": { "type": "integer", "minimum": 1 },
                            "answer_max_chars": { "type": "integer", "minimum": 1 },
                            "estimated_time_minutes": { "type": "integer", "minimum": 1 }
                        },
                        "required": [
                            "prompt", "rationale", "difficulty", "evaluation_rubric",
                            "answer_min_chars", "answer_max_chars", "estimated_time_minutes"
                        ]
                    }
                }
            },
            "required": ["questions"]
        })
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError> {
        let roadmap = ctx
            .store
            .roadmap_by_session(ctx.session_id)?
            .ok_or(StoreError::NotFound {
                entity: "roadmap",
                id: ctx.session_id,
            })?;

        // One graduation project per roadmap
        if let Some(existing) = ctx.store.graduation_project_by_roadmap(roadmap.id)? {
            let questions = ctx.store.questions_by_project(existing.id)?;
            info!(roadmap_id = roadmap.id, project_id = existing.id, "graduation project already exists");
            return Ok(ToolOutcome::new(
                format!("The graduation project \"{}\" already has {} questions", existing.title, questions.len()),
                questions_json(&questions),
            ));
        }

        let goals = ctx.store.goals_by_roadmap(roadmap.id)?;
        let mut summary = String::new();
        for goal in &goals {
            summary.push_str(&format!("{}. {} - {}\n", goal.goal_number, goal.title, goal.description));
            for material in ctx.store.materials_by_goal(goal.id)? {
                summary.push_str(&format!("   material: {}\n", material.title));
            }
        }

        let vars = json!({
            "projectTitle": roadmap.graduation_project_title,
            "projectDescription": roadmap.graduation_project,
            "goalsSummary": summary,
        });

        let schema = self.result_schema();
        let generated =
            generate_structured(ctx, "creategraduationproject", &vars, "graduation_project", &schema).await?;
        let payload: ProjectPayload = serde_json::from_value(generated.clone()).map_err(|e| {
            ToolError::SchemaValidation {
                path: "$".to_string(),
                message: format!("graduation payload did not deserialize: {e}"),
            }
        })?;

        let questions: Vec<NewGraduationQuestion> = payload
            .questions
            .into_iter()
            .map(|q| NewGraduationQuestion {
                prompt: q.prompt,
                rationale: q.rationale,
                difficulty: q.difficulty,
                evaluation_rubric: q.evaluation_rubric,
                answer_min_chars: q.answer_min_chars,
                answer_max_chars: q.answer_max_chars,
                estimated_minutes: q.estimated_time_minutes,
            })
            .collect();

        let (project, stored) = persist_with_retry(|| {
            ctx.store.create_graduation_project_with_questions(
                roadmap.id,
                &roadmap.graduation_project_title,
                &roadmap.graduation_project,
                &questions,
            )
        })?;

        info!(project_id = project.id, question_count = stored.len(), "graduation project created");
        Ok(ToolOutcome::new(
            format!("Generated the graduation project with {} assessment questions", stored.len()),
            generated,
        ))
    }
}

/// Evaluate a learner's answer to one graduation question
pub struct EvaluateGraduationAnswerTool;

#[async_trait]
impl Tool for EvaluateGraduationAnswerTool {
    fn id(&self) -> ToolId {
        ToolId::EvaluateGraduationAnswer
    }

    fn description(&self) -> &'static str {
        "Evaluate the learner's answer to one graduation project question against its rubric: a score \
         between 0 and 1 plus constructive feedback. Use this when the learner submits an answer."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question_id": {
                    "type": "integer",
                    "description": "Database id of the graduation question being answered"
                },
                "answer_text": {
                    "type": "string",
                    "description": "The learner's full answer"
                }
            },
            "required": ["question_id", "answer_text"]
        })
    }

    fn result_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "overall_score": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                "feedback": { "type": "string" },
                "strengths": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "areas_for_improvement": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            },
            "required": ["overall_score", "feedback"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutcome, ToolError> {
        let question_id = args["question_id"].as_i64().unwrap_or_default();
        let answer_text = args["answer_text"].as_str().unwrap_or_default().to_string();

        let question = ctx.store.get_graduation_question(question_id)?;

        // Length window is checked before any model call; both bounds are
        // inclusive
        let length = answer_text.chars().count();
        if length < question.answer_min_chars as usize || length > question.answer_max_chars as usize {
            return Err(ToolError::AnswerLength {
                question_id,
                length,
                min: question.answer_min_chars,
                max: question.answer_max_chars,
            });
        }

        let vars = json!({
            "questionPrompt": question.prompt,
            "rubric": question.evaluation_rubric.join("\n"),
            "answerText": answer_text,
        });

        let schema = self.result_schema();
        let generated =
            match generate_structured(ctx, "evaluategraduationanswer", &vars, "answer_evaluation", &schema).await {
                Ok(value) => value,
                Err(e) => {
                    // Record the failed evaluation so the answer is not lost
                    warn!(question_id, error = %e, "evaluation failed, recording submission with error");
                    let _ = ctx
                        .store
                        .create_submission(question_id, &answer_text, None, None, Some(&e.to_string()));
                    return Err(e);
                }
            };
        let payload: EvaluationPayload = serde_json::from_value(generated.clone()).map_err(|e| {
            ToolError::SchemaValidation {
                path: "$".to_string(),
                message: format!("evaluation payload did not deserialize: {e}"),
            }
        })?;

        let submission = persist_with_retry(|| {
            ctx.store
                .create_submission(question_id, &answer_text, Some(payload.overall_score), Some(&payload.feedback), None)
        })?;

        info!(question_id, submission_id = submission.id, score = payload.overall_score, "answer evaluated");
        Ok(ToolOutcome::new(
            format!("Scored {:.0}% on question {}", payload.overall_score * 100.0, question.position),
            generated,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use studystore::{NewGoal, SkillLevel, StudyStore};

    use super::*;
    use crate::llm::client::mock::{MockLlmClient, text_response};
    use crate::prompts::EmbeddedPrompts;

    fn project_response() -> String {
        json!({
            "questions": [{
                "prompt": "Design the capstone system end to end.",
                "rationale": "Tests synthesis across goals",
                "difficulty": "advanced",
                "evaluation_rubric": ["covers architecture", "justifies tradeoffs"],
                "answer_min_chars": 50,
                "answer_max_chars": 500,
                "estimated_time_minutes": 60
            }]
        })
        .to_string()
    }

    fn evaluation_response(score: f64) -> String {
        json!({
            "overall_score": score,
            "feedback": "Solid coverage of the architecture.",
            "strengths": ["clear structure"],
            "areas_for_improvement": ["more depth on tradeoffs"]
        })
        .to_string()
    }

    fn ctx_with_roadmap(llm: MockLlmClient) -> ToolContext {
        let store = Arc::new(StudyStore::open_in_memory().unwrap());
        let session = store.create_session("u", "s", None).unwrap();
        store
            .create_roadmap_with_goals(
                session.id,
                "r",
                2,
                "Build a job board",
                "Job Board Capstone",
                &[NewGoal {
                    goal_number: 1,
                    title: "Backend".to_string(),
                    description: "APIs".to_string(),
                    priority: 2,
                    skill_level: SkillLevel::Advanced,
                    estimated_hours: 20,
                }],
            )
            .unwrap();
        ToolContext::new(session.id, store, Arc::new(llm), Arc::new(EmbeddedPrompts::new()), 4096)
    }

    async fn seed_project(ctx: &ToolContext) -> i64 {
        CreateGraduationProjectTool.execute(json!({}), ctx).await.unwrap();
        let roadmap = ctx.store.roadmap_by_session(ctx.session_id).unwrap().unwrap();
        let project = ctx.store.graduation_project_by_roadmap(roadmap.id).unwrap().unwrap();
        ctx.store.questions_by_project(project.id).unwrap()[0].id
    }

    #[tokio::test]
    async fn test_project_questions_are_persisted() {
        let llm = MockLlmClient::new(vec![Ok(text_response(project_response(), vec![]))]);
        let ctx = ctx_with_roadmap(llm);

        let question_id = seed_project(&ctx).await;
        let question = ctx.store.get_graduation_question(question_id).unwrap();
        assert_eq!(question.answer_min_chars, 50);
        assert_eq!(question.evaluation_rubric.len(), 2);
    }

    #[tokio::test]
    async fn test_second_generation_returns_existing_project() {
        let llm = MockLlmClient::new(vec![Ok(text_response(project_response(), vec![]))]);
        let ctx = ctx_with_roadmap(llm);

        seed_project(&ctx).await;
        // No second mock response: the tool must not call the model again
        let outcome = CreateGraduationProjectTool.execute(json!({}), &ctx).await.unwrap();
        assert!(outcome.message.contains("already"));
    }

    #[tokio::test]
    async fn test_answer_length_boundaries_are_inclusive() {
        let llm = MockLlmClient::new(vec![
            Ok(text_response(project_response(), vec![])),
            Ok(text_response(evaluation_response(0.8), vec![])),
            Ok(text_response(evaluation_response(0.9), vec![])),
        ]);
        let ctx = ctx_with_roadmap(llm);
        let question_id = seed_project(&ctx).await;

        // 49 chars: rejected before any model call
        let err = EvaluateGraduationAnswerTool
            .execute(json!({"question_id": question_id, "answer_text": "a".repeat(49)}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "answer_length");

        // 50 and 500 chars: both accepted
        EvaluateGraduationAnswerTool
            .execute(json!({"question_id": question_id, "answer_text": "a".repeat(50)}), &ctx)
            .await
            .unwrap();
        EvaluateGraduationAnswerTool
            .execute(json!({"question_id": question_id, "answer_text": "a".repeat(500)}), &ctx)
            .await
            .unwrap();

        // 501 chars: rejected again
        let err = EvaluateGraduationAnswerTool
            .execute(json!({"question_id": question_id, "answer_text": "a".repeat(501)}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "answer_length");
    }

    #[tokio::test]
    async fn test_too_short_answer_is_rejected_before_evaluation() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(text_response(project_response(), vec![]))]));
        let store = Arc::new(StudyStore::open_in_memory().unwrap());
        let session = store.create_session("u", "s", None).unwrap();
        store
            .create_roadmap_with_goals(session.id, "r", 2, "p", "t", &[])
            .unwrap();
        let ctx = ToolContext::new(session.id, store, mock.clone(), Arc::new(EmbeddedPrompts::new()), 4096);
        let question_id = seed_project(&ctx).await;
        let calls_after_seed = mock.call_count();

        let err = EvaluateGraduationAnswerTool
            .execute(json!({"question_id": question_id, "answer_text": "too short"}), &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "answer_length");
        // The rejection happened before the model was consulted
        assert_eq!(mock.call_count(), calls_after_seed);
    }

    #[tokio::test]
    async fn test_evaluation_score_out_of_range_is_rejected() {
        let llm = MockLlmClient::new(vec![
            Ok(text_response(project_response(), vec![])),
            Ok(text_response(evaluation_response(1.5), vec![])),
        ]);
        let ctx = ctx_with_roadmap(llm);
        let question_id = seed_project(&ctx).await;

        let err = EvaluateGraduationAnswerTool
            .execute(json!({"question_id": question_id, "answer_text": "a".repeat(100)}), &ctx)
            .await
            .unwrap_err();
        match err {
            ToolError::SchemaValidation { path, .. } => assert_eq!(path, "overall_score"),
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }
}
