//! The seam between a chat session and whatever answers its questions.

use async_trait::async_trait;
use mathwise_core::error::AgentError;
use mathwise_core::message::Message;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::scratchpad::TraceEntry;
use crate::stream_event::AgentStreamEvent;

/// The outcome of one successful agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    /// The final answer text.
    pub answer: String,
    /// Every thought, action and observation, in order.
    pub trace: Vec<TraceEntry>,
    /// LLM calls used.
    pub iterations: usize,
    /// Tool invocations made, including ones that failed.
    pub tool_calls_made: usize,
}

/// Answers one question given the conversation so far.
///
/// Sessions only see this trait, so tests can swap the LLM-driven loop for
/// a scripted one.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run until a final answer or a failure.
    ///
    /// `memory` is the conversation before this question, oldest first.
    /// When `events` is given, progress is reported on it as it happens; a
    /// closed receiver does not stop the run.
    async fn run(
        &self,
        input: &str,
        memory: &[Message],
        events: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Result<AgentRun, AgentError>;
}
