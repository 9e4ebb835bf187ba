//! Scratchpad: the agent's working record for a single question.
//!
//! Holds the reasoning trace (Thought/Action/Observation) for inspection and
//! the raw steps that are replayed to the model on the next iteration. A new
//! scratchpad is made for every question; nothing here outlives the turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The kind of reasoning trace entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Thought,
    Action,
    Observation,
    FinalAnswer,
}

impl TraceKind {
    pub fn label(self) -> &'static str {
        match self {
            TraceKind::Thought => "Thought",
            TraceKind::Action => "Action",
            TraceKind::Observation => "Observation",
            TraceKind::FinalAnswer => "Final Answer",
        }
    }
}

/// One completed step: what the model wrote and what came back.
#[derive(Debug, Clone)]
struct Step {
    log: String,
    observation: String,
}

#[derive(Debug, Clone)]
pub struct Scratchpad {
    steps: Vec<Step>,
    trace: Vec<TraceEntry>,
    iterations: usize,
    max_iterations: usize,
}

impl Scratchpad {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            steps: Vec::new(),
            trace: Vec::new(),
            iterations: 0,
            max_iterations,
        }
    }

    /// Increment the iteration counter. Returns `false` if max exceeded.
    pub fn tick(&mut self) -> bool {
        self.iterations += 1;
        self.iterations <= self.max_iterations
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn record(&mut self, kind: TraceKind, content: &str) {
        self.trace.push(TraceEntry {
            kind,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Store a finished step for replay. `log` is the model output that led
    /// to the action, verbatim.
    pub fn push_step(&mut self, log: &str, observation: &str) {
        self.steps.push(Step {
            log: log.to_string(),
            observation: observation.to_string(),
        });
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<TraceEntry> {
        self.trace
    }

    /// Render the steps so far as the continuation of a `Thought:` prompt.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&step.log);
            out.push_str("\nObservation: ");
            out.push_str(&step.observation);
            out.push_str("\nThought: ");
        }
        out
    }
}
