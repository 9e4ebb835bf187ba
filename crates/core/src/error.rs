//! Error types for the Mathwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all Mathwise operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the remote chat-completion call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Invalid tool input for {tool_name}: {reason}")]
    InvalidInput { tool_name: String, reason: String },

    #[error("Upstream call failed in {tool_name}: {reason}")]
    Upstream { tool_name: String, reason: String },
}

/// Why a single agent turn failed to produce a final answer.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Agent stopped after {max_iterations} iterations without a final answer")]
    IterationLimit { max_iterations: u32 },
}
