//! A provider bound to one model and its sampling settings.
//!
//! Tools and the agent loop share a single `LlmClient` so every call for a
//! session uses the same model, temperature and token cap.

use std::sync::Arc;
use mathwise_core::agent::AgentConfig;
use mathwise_core::error::ProviderError;
use mathwise_core::message::Message;
use mathwise_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};

#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
        }
    }

    /// Take model, temperature and token cap from an agent config.
    pub fn from_agent_config(provider: Arc<dyn Provider>, config: &AgentConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Send a conversation and return the raw response.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        stop: Vec<String>,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
            stop,
        };
        self.provider.complete(request).await
    }

    /// Single-prompt convenience: one user message in, reply text out.
    pub async fn ask(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .complete(vec![Message::user(prompt)], Vec::new(), Vec::new())
            .await?;
        Ok(response.message.content)
    }
}
