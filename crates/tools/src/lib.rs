//! Tools for the Mathwise tutor agent.
//!
//! The toolset is closed: [`MathTool`] enumerates every variant the agent
//! can be given. Which tool to call is decided by the model from the names
//! and descriptions; the registry only dispatches.

pub mod calculator;
pub mod prompt_tool;
pub mod wikipedia;

use async_trait::async_trait;
use mathwise_config::WikipediaConfig;
use mathwise_core::error::ToolError;
use mathwise_core::tool::{Tool, ToolRegistry};
use mathwise_providers::LlmClient;

pub use calculator::CalculatorTool;
pub use prompt_tool::{PromptTool, PromptToolKind};
pub use wikipedia::WikipediaTool;

/// Every tool the tutor knows about.
pub enum MathTool {
    Calculator(CalculatorTool),
    Wikipedia(WikipediaTool),
    Prompt(PromptTool),
}

impl MathTool {
    fn inner(&self) -> &dyn Tool {
        match self {
            MathTool::Calculator(t) => t,
            MathTool::Wikipedia(t) => t,
            MathTool::Prompt(t) => t,
        }
    }

    /// The full toolset, in the order it is presented to the model.
    pub fn all(llm: &LlmClient, wikipedia: &WikipediaConfig) -> Result<Vec<MathTool>, ToolError> {
        let mut tools = vec![
            MathTool::Calculator(CalculatorTool::with_llm(llm.clone())),
            MathTool::Wikipedia(WikipediaTool::new(wikipedia.clone())?),
        ];
        tools.extend(
            PromptToolKind::ALL
                .into_iter()
                .map(|kind| MathTool::Prompt(PromptTool::new(kind, llm.clone()))),
        );
        Ok(tools)
    }
}

#[async_trait]
impl Tool for MathTool {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn description(&self) -> &str {
        self.inner().description()
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        tracing::debug!(tool = self.name(), "Invoking tool");
        self.inner().invoke(query).await
    }
}

/// Build the registry of all math tools, sharing one LLM client.
pub fn math_registry(llm: &LlmClient, wikipedia: &WikipediaConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for tool in MathTool::all(llm, wikipedia)? {
        registry.register(Box::new(tool))?;
    }
    Ok(registry)
}
