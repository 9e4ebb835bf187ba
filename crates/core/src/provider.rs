//! Provider trait — the abstraction over the hosted LLM.
//!
//! A Provider knows how to send a list of messages to a chat-completion
//! endpoint and get the assistant's reply back. Everything above this trait
//! (tools, agent loop, sessions) is provider-agnostic, which is also what
//! lets tests swap in scripted mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gemma2-9b-it")
    pub model: String,

    /// System message, memory snapshot, and the current turn
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools offered for native function calling
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.2
}

impl ProviderRequest {
    /// A plain request with no tools and no stop sequences.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
            stop: Vec::new(),
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "groq").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// List available models for this provider.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
