//! Tool trait — named, described callables the agent may invoke.
//!
//! Every tool maps a free-text query to a free-text result. The agent loop
//! picks a tool by name (the LLM decides which one fits from the
//! descriptions) and feeds the result back as an observation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id when there is one)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// The text handed to the tool
    pub input: String,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content (or the error text when `success` is false)
    pub output: String,
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "Calculator").
    fn name(&self) -> &str;

    /// A description of when to use this tool (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema of the single `query` argument used for native tool calls.
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Input for the tool" }
            },
            "required": ["query"]
        })
    }

    /// Run the tool on a text query.
    async fn invoke(&self, query: &str) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The fixed set of tools available to one agent.
///
/// Tools keep their registration order, which is also the order they are
/// listed in the prompt. Names are unique: a second registration under an
/// existing name is rejected and the first one stays.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Fails with [`ToolError::Duplicate`] if the name is taken.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        if self.get(tool.name()).is_some() {
            return Err(ToolError::Duplicate(tool.name().to_string()));
        }
        tracing::debug!(tool = tool.name(), "Registered tool");
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name. Matching ignores ASCII case and surrounding
    /// whitespace, since models rarely reproduce names exactly.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        let name = name.trim();
        self.tools
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call. Only a missing tool is an `Err`; tool failures
    /// come back as an unsuccessful [`ToolResult`] carrying the error text.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self.get(&call.name).ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let result = match tool.invoke(&call.input).await {
            Ok(output) => ToolResult { call_id: call.id.clone(), success: true, output },
            Err(e) => {
                tracing::warn!(tool = tool.name(), error = %e, "Tool invocation failed");
                ToolResult { call_id: call.id.clone(), success: false, output: format!("Error: {e}") }
            }
        };
        Ok(result)
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
