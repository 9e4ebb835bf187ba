//! A chat session: one conversation with its memory and its agent.
//!
//! The session owns two views of the conversation. The memory window holds
//! the last few turns and is what the agent sees; the chat history holds
//! everything shown to the user. Every submitted question adds exactly one
//! user turn and one assistant turn to both, whether the agent succeeds or
//! not.

use chrono::{DateTime, Utc};
use mathwise_config::{AppConfig, UiConfig};
use mathwise_core::message::{Message, SessionId};
use mathwise_memory::{ChatHistory, MemoryDebugLine, MemoryWindow};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::stream_event::AgentStreamEvent;

/// How a submitted question ended. Either way the reply is already recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered(String),
    /// The agent failed; the text is the error message shown as the reply.
    Failed(String),
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Answered(text) | TurnOutcome::Failed(text) => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Answered(_))
    }
}

pub struct ChatSession {
    id: SessionId,
    memory: MemoryWindow,
    history: ChatHistory,
    agent: Arc<dyn Agent>,
    welcome_message: String,
    clear_message: String,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(agent: Arc<dyn Agent>, window_size: usize, ui: &UiConfig) -> Self {
        let id = SessionId::new();
        info!(session_id = %id, window_size, "Session started");
        Self {
            id,
            memory: MemoryWindow::new(window_size),
            history: ChatHistory::with_greeting(ui.welcome_message.clone()),
            agent,
            welcome_message: ui.welcome_message.clone(),
            clear_message: ui.clear_message.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn from_config(agent: Arc<dyn Agent>, config: &AppConfig) -> Self {
        Self::new(agent, config.memory.window_size, &config.ui)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Every turn shown to the user, oldest first.
    pub fn history(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn memory(&self) -> &MemoryWindow {
        &self.memory
    }

    pub fn welcome_message(&self) -> &str {
        &self.welcome_message
    }

    /// Ask a question. Never fails: agent errors become the reply text.
    pub async fn submit(&mut self, text: &str) -> TurnOutcome {
        self.submit_with_events(text, None).await
    }

    /// Like [`submit`](Self::submit), reporting agent progress on `events`
    /// and finishing with a `done` event once the reply is stored.
    pub async fn submit_with_events(
        &mut self,
        text: &str,
        events: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> TurnOutcome {
        // The agent gets the window as it was before this question.
        let context = self.memory.snapshot();

        let question = Message::user(text);
        self.memory.append(question.clone());
        self.history.push(question);

        let outcome = match self.agent.run(text, &context, events).await {
            Ok(run) => {
                info!(
                    session_id = %self.id,
                    iterations = run.iterations,
                    tool_calls = run.tool_calls_made,
                    "Turn answered"
                );
                TurnOutcome::Answered(run.answer)
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Turn failed");
                TurnOutcome::Failed(format!("An error occurred: {e}"))
            }
        };

        let reply = Message::assistant(outcome.text());
        self.memory.append(reply.clone());
        self.history.push(reply);

        if let Some(tx) = events {
            let _ = tx
                .send(AgentStreamEvent::Done {
                    session_id: self.id.to_string(),
                    success: outcome.is_success(),
                })
                .await;
        }
        outcome
    }

    /// Forget the conversation and show only the clear message.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.history.reset(self.clear_message.clone());
        info!(session_id = %self.id, "Session cleared");
    }

    /// The memory window as the agent would see it, for debugging.
    pub fn memory_debug(&self) -> Vec<MemoryDebugLine> {
        self.memory.debug_view()
    }
}
