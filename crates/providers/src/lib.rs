//! LLM provider implementations for Mathwise.
//!
//! - [`openai_compat::OpenAiCompatProvider`]: any `/chat/completions` endpoint
//!   (Groq by default, also OpenAI, OpenRouter, Ollama, vLLM)
//! - [`router::build_from_config`]: picks and constructs the configured provider
//! - [`client::LlmClient`]: a provider bound to model, temperature and token cap
//! - [`mock::ScriptedProvider`]: deterministic replies for tests and offline runs

pub mod client;
pub mod mock;
pub mod openai_compat;
pub mod router;

pub use client::LlmClient;
pub use mock::ScriptedProvider;
pub use openai_compat::OpenAiCompatProvider;
