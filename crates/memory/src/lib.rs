//! Conversation memory for Mathwise.
//!
//! Two stores live side by side in every session:
//! - [`MemoryWindow`]: the last N turns, handed to the agent as context
//! - [`ChatHistory`]: everything shown to the user, unbounded

pub mod history;
pub mod window;

pub use history::ChatHistory;
pub use window::{MemoryDebugLine, MemoryWindow};
