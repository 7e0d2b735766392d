//! End-to-end turn coordination tests
//!
//! Drive full turns against an in-memory store and a canned model client,
//! and assert on the event stream plus the persisted state.

use std::sync::Arc;

use serde_json::json;

use mentord::llm::client::mock::{MockLlmClient, text_response};
use mentord::llm::{LlmError, ToolCall};
use mentord::prompts::EmbeddedPrompts;
use mentord::tools::{Dispatcher, ToolRegistry};
use mentord::turn::{TurnConfig, TurnCoordinator, TurnEvent};
use studystore::{MessageRole, NewGoal, SkillLevel, StudyStore};

fn coordinator_with(
    store: Arc<StudyStore>,
    responses: Vec<Result<mentord::llm::CompletionResponse, LlmError>>,
) -> Arc<TurnCoordinator> {
    Arc::new(TurnCoordinator::new(
        store,
        Arc::new(MockLlmClient::new(responses)),
        Arc::new(EmbeddedPrompts::new()),
        Dispatcher::new(ToolRegistry::standard()),
        TurnConfig::default(),
    ))
}

async fn collect_events(mut rx: tokio::sync::mpsc::Receiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

fn skeleton_response(goal_count: u32) -> String {
    let goals: Vec<serde_json::Value> = (1..=goal_count)
        .map(|n| {
            json!({
                "goal_number": n,
                "title": format!("Goal {n}"),
                "description": format!("Learn part {n}"),
                "priority": 3,
                "estimated_hours": 10,
            })
        })
        .collect();
    json!({
        "goals": goals,
        "graduation_project": "Build a React application",
        "graduation_project_title": "React Capstone",
    })
    .to_string()
}

fn material_response(title: &str) -> String {
    json!({
        "title": title,
        "description": "d",
        "content": "# Content",
        "estimated_time_minutes": 30,
    })
    .to_string()
}

fn quiz_response() -> String {
    json!({
        "questions": [{
            "question": "q",
            "options": ["a", "b", "c", "d"],
            "correct_answer": 0,
            "explanation": "e"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_first_message_bootstraps_a_roadmap() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "Learn React", None).unwrap();

    // Turn call: the model answers and requests createRoadmapSkeleton;
    // the tool then makes its own structured generation call
    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![
            Ok(text_response(
                "Let me set up a roadmap for you.",
                vec![tool_call(
                    "call_1",
                    "createRoadmapSkeleton",
                    json!({"userRequest": "I want to learn React, 5 hours/week, beginner"}),
                )],
            )),
            Ok(text_response(skeleton_response(5), vec![])),
        ],
    );

    let events = collect_events(
        coordinator.submit_turn(session.id, "I want to learn React, 5 hours/week, beginner"),
    )
    .await;

    // model_response, tool_result, done
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], TurnEvent::ModelResponse { tool_calls, .. } if tool_calls.len() == 1));
    match &events[1] {
        TurnEvent::ToolResult { tool, success, .. } => {
            assert_eq!(tool, "createRoadmapSkeleton");
            assert!(*success);
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    assert!(matches!(&events[2], TurnEvent::Done { .. }));

    // The roadmap and its goals are persisted
    let roadmap = store.roadmap_by_session(session.id).unwrap().unwrap();
    assert_eq!(store.goals_by_roadmap(roadmap.id).unwrap().len(), 5);

    // Transcript: the user message plus the aggregated assistant message
    let messages = store.recent_messages(session.id, 10).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert!(messages[1].content.contains("Let me set up a roadmap"));
    assert!(messages[1].content.contains("5 goals"));
    let metadata = messages[1].metadata.as_ref().unwrap();
    assert_eq!(metadata["tool_calls"][0]["success"], true);
}

#[tokio::test]
async fn test_illegal_tool_call_is_rejected_without_aborting_the_turn() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "s", None).unwrap();

    // No roadmap yet: the session is in the roadmap phase, but the
    // (simulated) model asks for a quiz anyway
    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![Ok(text_response(
            "Making a quiz now.",
            vec![tool_call("call_1", "createQuizForGoal", json!({"goal_id": 1}))],
        ))],
    );

    let events = collect_events(coordinator.submit_turn(session.id, "quiz me")).await;

    assert_eq!(events.len(), 3);
    match &events[1] {
        TurnEvent::ToolResult {
            success, error_code, ..
        } => {
            assert!(!success);
            assert_eq!(*error_code, Some("phase_violation"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    // The turn still completes normally
    assert!(matches!(&events[2], TurnEvent::Done { .. }));

    // Zero entity mutations from the rejected call
    assert!(store.roadmap_by_session(session.id).unwrap().is_none());

    // The assistant message is persisted, with the failure recorded
    let messages = store.recent_messages(session.id, 10).unwrap();
    assert_eq!(messages.len(), 2);
    let metadata = messages[1].metadata.as_ref().unwrap();
    assert_eq!(metadata["tool_calls"][0]["success"], false);
    assert_eq!(metadata["tool_calls"][0]["error"], "phase_violation");
}

#[tokio::test]
async fn test_tool_results_stream_in_model_order() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "s", None).unwrap();
    let goals: Vec<NewGoal> = (1..=2)
        .map(|n| NewGoal {
            goal_number: n,
            title: format!("Goal {n}"),
            description: "d".to_string(),
            priority: 3,
            skill_level: SkillLevel::Intermediate,
            estimated_hours: 10,
        })
        .collect();
    let (_, stored) = store
        .create_roadmap_with_goals(session.id, "r", 2, "p", "t", &goals)
        .unwrap();
    let (g1, g2) = (stored[0].id, stored[1].id);

    // Learning phase; the model requests A, B, C in one turn
    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![
            Ok(text_response(
                "Working through goal one.",
                vec![
                    tool_call("call_a", "createLearningMaterial", json!({"goal_id": g1})),
                    tool_call("call_b", "createQuizForGoal", json!({"goal_id": g1})),
                    tool_call("call_c", "createLearningMaterial", json!({"goal_id": g2})),
                ],
            )),
            Ok(text_response(material_response("Material A"), vec![])),
            Ok(text_response(quiz_response(), vec![])),
            Ok(text_response(material_response("Material C"), vec![])),
        ],
    );

    let events = collect_events(coordinator.submit_turn(session.id, "teach me")).await;

    let result_ids: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::ToolResult { call_id, .. } => Some(call_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(result_ids, vec!["call_a", "call_b", "call_c"]);

    assert_eq!(store.materials_by_goal(g1).unwrap().len(), 1);
    assert_eq!(store.quizzes_by_goal(g1).unwrap().len(), 1);
    assert_eq!(store.materials_by_goal(g2).unwrap().len(), 1);
}

#[tokio::test]
async fn test_one_failed_tool_does_not_stop_the_rest() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "s", None).unwrap();
    let (_, stored) = store
        .create_roadmap_with_goals(
            session.id,
            "r",
            1,
            "p",
            "t",
            &[NewGoal {
                goal_number: 1,
                title: "Goal".to_string(),
                description: "d".to_string(),
                priority: 3,
                skill_level: SkillLevel::Intermediate,
                estimated_hours: 10,
            }],
        )
        .unwrap();
    let goal_id = stored[0].id;

    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![
            Ok(text_response(
                "On it.",
                vec![
                    // References a goal that does not exist
                    tool_call("call_1", "createLearningMaterial", json!({"goal_id": 9999})),
                    tool_call("call_2", "createQuizForGoal", json!({"goal_id": goal_id})),
                ],
            )),
            Ok(text_response(quiz_response(), vec![])),
        ],
    );

    let events = collect_events(coordinator.submit_turn(session.id, "go")).await;

    let outcomes: Vec<(bool, Option<&'static str>)> = events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::ToolResult {
                success, error_code, ..
            } => Some((*success, *error_code)),
            _ => None,
        })
        .collect();
    assert_eq!(outcomes, vec![(false, Some("not_found")), (true, None)]);
    assert!(matches!(events.last(), Some(TurnEvent::Done { .. })));
    assert_eq!(store.quizzes_by_goal(goal_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_model_transport_failure_is_fatal_and_persists_nothing() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "s", None).unwrap();

    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![Err(LlmError::ApiError {
            status: 500,
            message: "upstream down".to_string(),
        })],
    );

    let events = collect_events(coordinator.submit_turn(session.id, "hello")).await;

    // A single error frame terminates the stream; no done frame follows
    assert_eq!(events.len(), 1);
    match &events[0] {
        TurnEvent::Error { code, .. } => assert_eq!(*code, "model_transport"),
        other => panic!("expected error frame, got {other:?}"),
    }

    // The user message was recorded, but no assistant message was
    let messages = store.recent_messages(session.id, 10).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_unknown_session_yields_error_frame() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let coordinator = coordinator_with(store, vec![]);

    let events = collect_events(coordinator.submit_turn(404, "hello")).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        TurnEvent::Error { code, .. } => assert_eq!(*code, "session_not_found"),
        other => panic!("expected error frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dropped_receiver_does_not_stop_persistence() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "s", None).unwrap();

    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![
            Ok(text_response(
                "Setting up.",
                vec![tool_call(
                    "call_1",
                    "createRoadmapSkeleton",
                    json!({"userRequest": "learn rust"}),
                )],
            )),
            Ok(text_response(skeleton_response(3), vec![])),
        ],
    );

    // Client disconnects immediately
    let rx = coordinator.submit_turn(session.id, "learn rust");
    drop(rx);

    // The turn still runs to completion: poll until the assistant message
    // lands or we give up
    let mut done = false;
    for _ in 0..100 {
        if store.message_count(session.id).unwrap() == 2 {
            done = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(done, "assistant message was not persisted after disconnect");
    assert!(store.roadmap_by_session(session.id).unwrap().is_some());
}

#[tokio::test]
async fn test_consecutive_turns_share_one_transcript() {
    let store = Arc::new(StudyStore::open_in_memory().unwrap());
    let session = store.create_session("u", "s", None).unwrap();

    let coordinator = coordinator_with(
        Arc::clone(&store),
        vec![
            Ok(text_response("First answer.", vec![])),
            Ok(text_response("Second answer.", vec![])),
        ],
    );

    collect_events(coordinator.submit_turn(session.id, "first")).await;
    collect_events(coordinator.submit_turn(session.id, "second")).await;

    let messages = store.recent_messages(session.id, 10).unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "First answer.", "second", "Second answer."]);
}
