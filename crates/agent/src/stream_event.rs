//! Agent progress events.
//!
//! `AgentStreamEvent` reports each step of a run as it happens, so the
//! gateway can forward the agent's thoughts over SSE and the CLI can print
//! them.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent while answering a question.
///
/// - `thought`      — reasoning text that preceded an action
/// - `tool_call`    — agent is invoking a tool
/// - `tool_result`  — tool execution completed (or failed)
/// - `final_answer` — the answer the turn ends with
/// - `error`        — the run failed
/// - `done`         — the turn is recorded; nothing follows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    Thought { content: String },

    ToolCall { id: String, name: String, input: String },

    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    FinalAnswer { content: String },

    Error { message: String },

    /// Sent by the session once the assistant turn has been stored.
    Done { session_id: String, success: bool },
}

impl AgentStreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thought { .. } => "thought",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::FinalAnswer { .. } => "final_answer",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }

    /// Single-line rendering for terminals.
    pub fn display_line(&self) -> Option<String> {
        match self {
            Self::Thought { content } => Some(format!("💭 {content}")),
            Self::ToolCall { name, input, .. } => Some(format!("🔧 {name}: {input}")),
            Self::ToolResult { output, success, .. } => {
                let mark = if *success { "✓" } else { "✗" };
                Some(format!("{mark} {output}"))
            }
            Self::Error { message } => Some(format!("⚠ {message}")),
            Self::FinalAnswer { .. } | Self::Done { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_thought() {
        let event = AgentStreamEvent::Thought {
            content: "Use the calculator".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"thought""#));
        assert!(json.contains(r#""content":"Use the calculator""#));
    }

    #[test]
    fn event_serialization_tool_call() {
        let event = AgentStreamEvent::ToolCall {
            id: "call_1".into(),
            name: "Calculator".into(),
            input: "2+2".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains(r#""input":"2+2""#));
    }

    #[test]
    fn event_serialization_final_answer() {
        let event = AgentStreamEvent::FinalAnswer { content: "x = 2".into() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"final_answer""#));
    }

    #[test]
    fn event_roundtrip_done() {
        let event = AgentStreamEvent::Done {
            session_id: "s-1".into(),
            success: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: AgentStreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn event_type_names() {
        assert_eq!(AgentStreamEvent::Error { message: "x".into() }.event_type(), "error");
        assert_eq!(
            AgentStreamEvent::ToolResult {
                id: "1".into(),
                name: "Wikipedia".into(),
                output: "o".into(),
                success: true
            }
            .event_type(),
            "tool_result"
        );
    }

    #[test]
    fn display_lines() {
        let failed = AgentStreamEvent::ToolResult {
            id: "1".into(),
            name: "Calculator".into(),
            output: "Error: bad input".into(),
            success: false,
        };
        assert_eq!(failed.display_line().as_deref(), Some("✗ Error: bad input"));
        assert!(AgentStreamEvent::FinalAnswer { content: "4".into() }.display_line().is_none());
    }
}
