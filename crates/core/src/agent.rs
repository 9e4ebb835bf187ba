//! Agent configuration.
//!
//! Built once per session from the loaded config and never mutated while the
//! conversation runs.

use serde::{Deserialize, Serialize};

/// The tutor persona sent as the first message of every agent request.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "\
You are an advanced AI math tutor with expertise in all fields of mathematics including:
- Elementary math
- Algebra (basic through advanced)
- Geometry and trigonometry
- Calculus (single and multivariable)
- Linear algebra
- Differential equations
- Statistics and probability
- Number theory
- Graph theory
- Optimization

You have recall of the recent conversation history and keep context throughout the discussion. \
When answering new questions, reference previous exchanges when relevant, especially when:
- variables or constants were defined earlier
- a particular mathematical framework was established
- the question builds on a previous problem
- the user refers to something discussed earlier

Explain concepts clearly with step-by-step reasoning and show all work. \
Break complex problems down methodically. When appropriate, help the user develop \
problem-solving skills rather than just providing answers, and adapt explanations to \
the complexity of the question.";

/// Configuration for the agent's behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model to use for every agent step
    pub model: String,

    #[serde(default = "default_temp")]
    pub temperature: f32,

    /// Token cap per completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum reasoning iterations per turn (safety limit)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_system_message")]
    pub system_message: String,

    /// Log every thought, action and observation at info level
    #[serde(default)]
    pub verbose: bool,
}

fn default_temp() -> f32 {
    0.2
}
fn default_max_iterations() -> u32 {
    6
}
fn default_system_message() -> String {
    DEFAULT_SYSTEM_MESSAGE.to_string()
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temp(),
            max_tokens: None,
            max_iterations: default_max_iterations(),
            system_message: default_system_message(),
            verbose: false,
        }
    }
}
