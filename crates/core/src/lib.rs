//! # Mathwise Core
//!
//! Domain types, traits, and error definitions for the Mathwise math tutor.
//! This crate has **zero framework dependencies**: it defines the domain model
//! that the provider, tool, memory and agent crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: conversation turns and session identifiers
//! - [`provider`]: the remote chat-completion abstraction
//! - [`tool`]: named, described callables and their registry
//! - [`agent`]: the immutable per-session agent configuration
//! - [`error`]: one error enum per bounded context

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod agent;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, ProviderError, Result, ToolError};
pub use message::{Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use agent::AgentConfig;
