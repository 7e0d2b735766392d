//! TurnCoordinator - drives one conversational turn end to end
//!
//! One turn: persist the user message, assemble context, make a single
//! model call with the phase's eligible tool catalogue, execute requested
//! tools strictly in model order while streaming each result, then persist
//! the assistant message. Tool failures are local; a failed model call is
//! fatal for the turn and persists nothing.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use studystore::{Message, MessageRole, SessionSnapshot, StudyStore};

use crate::config::Config;
use crate::llm::{ChatMessage, CompletionRequest, LlmClient};
use crate::phase::{self, PhaseDecision};
use crate::prompts::PromptProvider;
use crate::tools::{Dispatcher, ToolContext};

use super::events::{ToolCallSummary, TurnEvent};

/// Size of the per-turn event channel
const EVENT_BUFFER: usize = 32;

/// Turn coordinator settings
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Recent messages included as context
    pub history_window: u32,

    /// Token budget for the turn's model call
    pub max_tokens: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            history_window: 20,
            max_tokens: 8192,
        }
    }
}

impl TurnConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            history_window: config.history.window,
            max_tokens: config.llm.max_tokens,
        }
    }
}

/// Per-turn state machine, logged for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Received,
    ContextAssembled,
    ModelInvoked,
    ToolsExecuting,
    ResultsAggregated,
    Persisted,
    Complete,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnState::Received => "received",
            TurnState::ContextAssembled => "context_assembled",
            TurnState::ModelInvoked => "model_invoked",
            TurnState::ToolsExecuting => "tools_executing",
            TurnState::ResultsAggregated => "results_aggregated",
            TurnState::Persisted => "persisted",
            TurnState::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

/// Advisory per-session locks serializing concurrent turns
///
/// Held from context assembly through persistence so two turns for the same
/// session cannot interleave their writes.
#[derive(Default)]
struct SessionLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(session_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        lock.lock_owned().await
    }
}

/// Tool call record stored in assistant message metadata
#[derive(Debug, Clone, Serialize)]
struct ToolCallRecord {
    id: String,
    name: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

/// Drives conversational turns for all sessions
///
/// Every collaborator is injected; the coordinator owns no global state
/// beyond the advisory session locks. Clones share the same collaborators
/// and lock registry.
#[derive(Clone)]
pub struct TurnCoordinator {
    store: Arc<StudyStore>,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<dyn PromptProvider>,
    dispatcher: Arc<Dispatcher>,
    config: TurnConfig,
    locks: Arc<SessionLocks>,
}

impl TurnCoordinator {
    pub fn new(
        store: Arc<StudyStore>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<dyn PromptProvider>,
        dispatcher: Dispatcher,
        config: TurnConfig,
    ) -> Self {
        Self {
            store,
            llm,
            prompts,
            dispatcher: Arc::new(dispatcher),
            config,
            locks: Arc::new(SessionLocks::default()),
        }
    }

    /// Start one turn and return its event stream
    ///
    /// The turn runs to completion even if the receiver is dropped:
    /// dispatched tools have already mutated persistent state, and the
    /// assistant message is persisted with whatever was aggregated.
    pub fn submit_turn(&self, session_id: i64, user_text: impl Into<String>) -> mpsc::Receiver<TurnEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let coordinator = self.clone();
        let text = user_text.into();
        tokio::spawn(async move {
            coordinator.run_turn(session_id, text, tx).await;
        });
        rx
    }

    async fn run_turn(&self, session_id: i64, user_text: String, tx: mpsc::Sender<TurnEvent>) {
        let turn_id = Uuid::now_v7();
        let mut state = TurnState::Received;
        info!(%turn_id, session_id, "turn started");

        if self.store.get_session(session_id).is_err() {
            let _ = tx
                .send(TurnEvent::Error {
                    code: "session_not_found",
                    message: format!("Session {session_id} not found"),
                })
                .await;
            return;
        }

        // Serialize turns per session until the assistant message lands
        let _guard = self.locks.acquire(session_id).await;

        if let Err(e) = self.store.append_message(session_id, MessageRole::User, &user_text, None) {
            let _ = tx
                .send(TurnEvent::Error {
                    code: "persistence",
                    message: format!("Failed to record user message: {e}"),
                })
                .await;
            return;
        }

        // Context assembly: history window, phase decision, tool catalogue
        let (request, decision) = match self.assemble(session_id, &user_text).await {
            Ok(assembled) => assembled,
            Err(message) => {
                let _ = tx.send(TurnEvent::Error { code: "internal", message }).await;
                return;
            }
        };
        state = advance(turn_id, state, TurnState::ContextAssembled);

        state = advance(turn_id, state, TurnState::ModelInvoked);
        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                // Fatal for the turn: no assistant message is persisted
                warn!(%turn_id, error = %e, "model call failed, aborting turn");
                let _ = tx
                    .send(TurnEvent::Error {
                        code: e.code(),
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        let content = response.content.clone().unwrap_or_default();
        let _ = tx
            .send(TurnEvent::ModelResponse {
                content: content.clone(),
                tool_calls: response
                    .tool_calls
                    .iter()
                    .map(|c| ToolCallSummary {
                        id: c.id.clone(),
                        name: c.name.clone(),
                    })
                    .collect(),
            })
            .await;

        // Execute tool calls sequentially, in model order, streaming each
        // result as it completes
        let mut records: Vec<ToolCallRecord> = Vec::with_capacity(response.tool_calls.len());
        let mut summaries: Vec<String> = Vec::new();
        if !response.tool_calls.is_empty() {
            state = advance(turn_id, state, TurnState::ToolsExecuting);
            let ctx = ToolContext::new(
                session_id,
                Arc::clone(&self.store),
                Arc::clone(&self.llm),
                Arc::clone(&self.prompts),
                self.config.max_tokens,
            );

            for call in &response.tool_calls {
                debug!(%turn_id, tool = %call.name, "executing tool call");
                match self.dispatcher.dispatch(call, &decision, &ctx).await {
                    Ok(outcome) => {
                        summaries.push(outcome.message.clone());
                        records.push(ToolCallRecord {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            success: true,
                            error: None,
                        });
                        let _ = tx.send(TurnEvent::tool_success(&call.id, &call.name, &outcome)).await;
                    }
                    Err(e) => {
                        // Local failure: report it and keep going with the
                        // remaining calls
                        warn!(%turn_id, tool = %call.name, error = %e, "tool call failed");
                        summaries.push(format!("{} failed: {e}", call.name));
                        records.push(ToolCallRecord {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            success: false,
                            error: Some(e.code()),
                        });
                        let _ = tx.send(TurnEvent::tool_error(&call.id, &call.name, &e)).await;
                    }
                }
            }
        }

        state = advance(turn_id, state, TurnState::ResultsAggregated);
        let mut final_content = content;
        if !summaries.is_empty() {
            if !final_content.is_empty() {
                final_content.push_str("\n\n");
            }
            final_content.push_str(&summaries.join("\n"));
        }

        let metadata = serde_json::json!({
            "tool_calls": records,
            "usage": response.usage,
        });
        if let Err(e) = self
            .store
            .append_message(session_id, MessageRole::Assistant, &final_content, Some(&metadata))
        {
            warn!(%turn_id, error = %e, "failed to persist assistant message");
            let _ = tx
                .send(TurnEvent::Error {
                    code: "persistence",
                    message: format!("Failed to record assistant message: {e}"),
                })
                .await;
            return;
        }
        state = advance(turn_id, state, TurnState::Persisted);

        state = advance(turn_id, state, TurnState::Complete);
        let _ = tx.send(TurnEvent::Done { usage: response.usage }).await;
        info!(%turn_id, state = %state, "turn finished");
    }

    /// Load history and session state, resolve the phase, and build the
    /// outbound model request
    async fn assemble(&self, session_id: i64, user_text: &str) -> Result<(CompletionRequest, PhaseDecision), String> {
        let history = self
            .store
            .recent_messages(session_id, self.config.history_window)
            .map_err(|e| e.to_string())?;
        let snapshot = self.store.session_snapshot(session_id).map_err(|e| e.to_string())?;
        let decision = phase::resolve(&snapshot);
        debug!(session_id, phase = %decision.phase, eligible = decision.eligible.len(), "phase resolved");

        let context = self.describe_session(&snapshot).map_err(|e| e.to_string())?;
        let vars = serde_json::json!({
            "previousMessages": format_history(&history, user_text),
            "userPrompt": user_text,
            "context": context,
            "phase": decision.phase.to_string(),
        });
        let prompt = self.prompts.render("master", &vars).map_err(|e| e.to_string())?;

        // Only the eligible set is ever offered to the model
        let tools = self.dispatcher.registry().definitions_for(&decision.eligible);

        let request = CompletionRequest {
            system_prompt: prompt.system,
            messages: vec![ChatMessage::user(prompt.user)],
            tools,
            max_tokens: self.config.max_tokens,
            temperature: prompt.temperature,
            response_format: None,
        };
        Ok((request, decision))
    }

    /// Human-readable session state block for the master prompt
    fn describe_session(&self, snapshot: &SessionSnapshot) -> Result<String, studystore::StoreError> {
        let mut out = format!("Session #{}", snapshot.session_id);
        let Some(roadmap_id) = snapshot.roadmap_id else {
            out.push_str("\n- No roadmap exists yet.");
            return Ok(out);
        };

        let roadmap = match self.store.roadmap_by_session(snapshot.session_id)? {
            Some(roadmap) => roadmap,
            None => return Ok(out),
        };
        let goals = self.store.goals_by_roadmap(roadmap_id)?;
        let completed = goals.iter().filter(|g| g.completion_percentage == 100).count();

        out.push_str(&format!("\n- Roadmap: {} [{}]", roadmap.graduation_project_title, roadmap.status));
        out.push_str(&format!("\n- Total goals: {}", goals.len()));
        out.push_str(&format!("\n- Completed goals: {completed}"));
        if !goals.is_empty() {
            out.push_str("\n- Goals:");
            for goal in &goals {
                out.push_str(&format!(
                    "\n  * Goal ID {}: {} [{}% complete]",
                    goal.id, goal.title, goal.completion_percentage
                ));
            }
        }
        Ok(out)
    }
}

/// Log a state transition and return the new state
fn advance(turn_id: Uuid, from: TurnState, to: TurnState) -> TurnState {
    debug!(%turn_id, %from, %to, "turn state transition");
    to
}

/// Format the recent-history window for the master prompt
///
/// The just-persisted user message is excluded so it only appears in the
/// prompt's dedicated slot.
fn format_history(history: &[Message], current_user_text: &str) -> String {
    let mut window: &[Message] = history;
    if let Some(last) = window.last() {
        if last.role == MessageRole::User && last.content == current_user_text {
            window = &window[..window.len() - 1];
        }
    }

    if window.is_empty() {
        return "(No previous conversation - this is the first message)".to_string();
    }

    let mut out = String::new();
    for (i, msg) in window.iter().enumerate() {
        let label = match msg.role {
            MessageRole::User => "User said",
            MessageRole::Assistant => "You replied",
        };
        out.push_str(&format!("{}. {}: {}\n", i + 1, label, msg.content));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64, role: MessageRole, content: &str) -> Message {
        Message {
            id,
            session_id: 1,
            role,
            content: content.to_string(),
            metadata: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_format_history_empty() {
        let formatted = format_history(&[], "hello");
        assert!(formatted.contains("first message"));
    }

    #[test]
    fn test_format_history_excludes_current_user_message() {
        let history = vec![
            message(1, MessageRole::User, "earlier question"),
            message(2, MessageRole::Assistant, "earlier answer"),
            message(3, MessageRole::User, "current question"),
        ];
        let formatted = format_history(&history, "current question");

        assert!(formatted.contains("1. User said: earlier question"));
        assert!(formatted.contains("2. You replied: earlier answer"));
        assert!(!formatted.contains("current question"));
    }

    #[test]
    fn test_format_history_keeps_unrelated_trailing_message() {
        let history = vec![message(1, MessageRole::User, "something else")];
        let formatted = format_history(&history, "current question");
        assert!(formatted.contains("something else"));
    }

    #[tokio::test]
    async fn test_session_locks_serialize_acquisition() {
        let locks = SessionLocks::default();

        let guard = locks.acquire(1).await;
        // A different session is not blocked
        let _other = locks.acquire(2).await;

        // The same session's lock is held
        let try_again = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(1)).await;
        assert!(try_again.is_err(), "second acquire should block while guard is held");

        drop(guard);
        let reacquired = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(1)).await;
        assert!(reacquired.is_ok());
    }
}
