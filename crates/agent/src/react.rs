//! ReAct pattern — Thought → Action → Observation loop.
//!
//! The model reasons in plain text, picks a tool by name, and gets the
//! tool's output back as an observation on the next iteration. The loop ends
//! with a `Final Answer:` or fails once `max_iterations` LLM calls have not
//! produced one.
//!
//! # Trace Format
//!
//! Each iteration records:
//! - **Thought**: the text before the chosen action
//! - **Action**: which tool was called with what input
//! - **Observation**: the tool output, or why the step was rejected
//!
//! Providers that answer with native tool calls are honored as well; those
//! calls are replayed to the model in the same text form.

use async_trait::async_trait;
use mathwise_config::AppConfig;
use mathwise_core::agent::AgentConfig;
use mathwise_core::error::{AgentError, ToolError};
use mathwise_core::message::{Message, Role};
use mathwise_core::tool::{ToolCall, ToolRegistry};
use mathwise_providers::LlmClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentRun};
use crate::output_parser::{self, ParsedOutput};
use crate::prompts;
use crate::scratchpad::{Scratchpad, TraceKind};
use crate::stream_event::AgentStreamEvent;

pub struct ReactAgent {
    llm: LlmClient,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
    /// Also send tool definitions so the provider may answer with native
    /// tool calls.
    native_tools: bool,
}

impl ReactAgent {
    pub fn new(llm: LlmClient, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            llm,
            tools,
            config,
            native_tools: false,
        }
    }

    /// Build the provider, the LLM client and the math tool set from config.
    pub fn from_config(config: &AppConfig) -> mathwise_core::Result<Self> {
        let provider = mathwise_providers::router::build_from_config(config)?;
        let agent_config = config.agent_config();
        let llm = LlmClient::from_agent_config(provider, &agent_config);
        let tools = mathwise_tools::math_registry(&llm, &config.wikipedia)?;
        info!(
            provider = %config.provider,
            model = %agent_config.model,
            tools = tools.len(),
            "ReAct agent ready"
        );
        Ok(Self::new(llm, Arc::new(tools), agent_config))
    }

    pub fn with_native_tools(mut self, enabled: bool) -> Self {
        self.native_tools = enabled;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// System prompt, then the remembered turns, then the question with the
    /// steps taken so far.
    fn build_messages(&self, input: &str, memory: &[Message], pad: &Scratchpad) -> Vec<Message> {
        let mut messages = Vec::with_capacity(memory.len() + 2);
        messages.push(Message::system(prompts::system_prompt(
            &self.config.system_message,
            &self.tools,
        )));
        messages.extend(
            memory
                .iter()
                .filter(|m| matches!(m.role, Role::User | Role::Assistant))
                .cloned(),
        );
        messages.push(Message::user(prompts::question_prompt(input, &pad.render())));
        messages
    }

    fn record(&self, pad: &mut Scratchpad, kind: TraceKind, content: &str) {
        if self.config.verbose {
            info!(iteration = pad.iterations(), "{}: {}", kind.label(), content);
        } else {
            debug!(iteration = pad.iterations(), "{}: {}", kind.label(), content);
        }
        pad.record(kind, content);
    }

    /// Run one tool call and return the observation.
    async fn act(
        &self,
        pad: &mut Scratchpad,
        call: &ToolCall,
        events: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> String {
        self.record(pad, TraceKind::Action, &format!("{}({})", call.name, call.input));
        emit(
            events,
            AgentStreamEvent::ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            },
        )
        .await;

        let (output, success) = match self.tools.execute(call).await {
            Ok(result) => (result.output, result.success),
            Err(ToolError::NotFound(name)) => {
                warn!(tool = %name, "Model asked for an unknown tool");
                (prompts::invalid_tool(&name, &self.tools), false)
            }
            Err(e) => (format!("Error: {e}"), false),
        };

        self.record(pad, TraceKind::Observation, &output);
        emit(
            events,
            AgentStreamEvent::ToolResult {
                id: call.id.clone(),
                name: call.name.clone(),
                output: output.clone(),
                success,
            },
        )
        .await;
        output
    }
}

async fn emit(events: Option<&mpsc::Sender<AgentStreamEvent>>, event: AgentStreamEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

/// The query inside native tool-call arguments: `{"query": ...}`, the first
/// string field, a bare JSON string, or the raw text.
fn native_query(arguments: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(arguments) {
        Ok(serde_json::Value::Object(map)) => map
            .get("query")
            .and_then(|v| v.as_str())
            .or_else(|| map.values().find_map(|v| v.as_str()))
            .unwrap_or_default()
            .to_string(),
        Ok(serde_json::Value::String(s)) => s,
        _ => arguments.trim().to_string(),
    }
}

#[async_trait]
impl Agent for ReactAgent {
    async fn run(
        &self,
        input: &str,
        memory: &[Message],
        events: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Result<AgentRun, AgentError> {
        let max_iterations = self.config.max_iterations;
        let mut pad = Scratchpad::new(max_iterations as usize);
        let mut tool_calls_made = 0usize;

        info!(
            model = %self.llm.model(),
            memory_turns = memory.len(),
            "ReAct: starting"
        );

        loop {
            if !pad.tick() {
                let err = AgentError::IterationLimit { max_iterations };
                warn!(max_iterations, "ReAct: max iterations reached");
                emit(events, AgentStreamEvent::Error { message: err.to_string() }).await;
                return Err(err);
            }

            let messages = self.build_messages(input, memory, &pad);
            let tool_defs = if self.native_tools {
                self.tools.definitions()
            } else {
                Vec::new()
            };

            let response = match self
                .llm
                .complete(messages, tool_defs, vec![prompts::STOP_SEQUENCE.to_string()])
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(iteration = pad.iterations(), error = %e, "ReAct: provider call failed");
                    emit(events, AgentStreamEvent::Error { message: e.to_string() }).await;
                    return Err(e.into());
                }
            };
            let reply = response.message;

            // Native tool calls take precedence over whatever text came along.
            if !reply.tool_calls.is_empty() {
                let thought = reply.content.trim();
                if !thought.is_empty() {
                    self.record(&mut pad, TraceKind::Thought, thought);
                    emit(events, AgentStreamEvent::Thought { content: thought.to_string() }).await;
                }
                for (n, tc) in reply.tool_calls.iter().enumerate() {
                    let call = ToolCall {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        input: native_query(&tc.arguments),
                    };
                    let observation = self.act(&mut pad, &call, events).await;
                    tool_calls_made += 1;

                    let lead = if n == 0 { thought } else { "" };
                    let log = format!("{lead}\nAction: {}\nAction Input: {}", call.name, call.input);
                    pad.push_step(&log, &observation);
                }
                continue;
            }

            match output_parser::parse(&reply.content) {
                Ok(ParsedOutput::Finish { answer }) => {
                    self.record(&mut pad, TraceKind::FinalAnswer, &answer);
                    emit(events, AgentStreamEvent::FinalAnswer { content: answer.clone() }).await;
                    let iterations = pad.iterations();
                    info!(iterations, tool_calls_made, "ReAct: completed");
                    return Ok(AgentRun {
                        answer,
                        trace: pad.into_trace(),
                        iterations,
                        tool_calls_made,
                    });
                }
                Ok(ParsedOutput::Action { tool, input: tool_input, thought }) => {
                    if !thought.is_empty() {
                        self.record(&mut pad, TraceKind::Thought, &thought);
                        emit(events, AgentStreamEvent::Thought { content: thought.clone() }).await;
                    }
                    let call = ToolCall {
                        id: format!("step_{}", pad.iterations()),
                        name: tool,
                        input: tool_input,
                    };
                    let observation = self.act(&mut pad, &call, events).await;
                    tool_calls_made += 1;
                    pad.push_step(&reply.content, &observation);
                }
                Err(e) => {
                    debug!(iteration = pad.iterations(), output = %reply.content, "ReAct: unparseable output");
                    let observation = e.to_string();
                    self.record(&mut pad, TraceKind::Observation, &observation);
                    pad.push_step(&reply.content, &observation);
                }
            }
        }
    }
}
