//! The agent loop and the chat session around it.
//!
//! The agent follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Receive** a question plus the recent conversation
//! 2. **Build the prompt** (persona + tool list + format rules + memory)
//! 3. **Send to the LLM** and parse its reply leniently
//! 4. **If an action**: run the tool, add the observation, loop back to 3
//! 5. **If a final answer**: hand it back to the session
//!
//! The loop ends on a final answer or fails once the iteration cap is hit.
//! [`ChatSession`] wraps an agent with the memory window and the displayed
//! history, and turns every failure into an assistant turn.

pub mod agent;
pub mod output_parser;
pub mod prompts;
pub mod react;
pub mod scratchpad;
pub mod session;
pub mod stream_event;

pub use agent::{Agent, AgentRun};
pub use output_parser::{FormatError, ParsedOutput};
pub use react::ReactAgent;
pub use scratchpad::{Scratchpad, TraceEntry, TraceKind};
pub use session::{ChatSession, TurnOutcome};
pub use stream_event::AgentStreamEvent;
