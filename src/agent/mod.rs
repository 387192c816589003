//! Agent and conversation state.

pub mod agent;
pub mod conversation;

pub use agent::{Agent, DEFAULT_SYSTEM_PROMPT, MAX_TOOL_ROUNDS};
pub use conversation::Conversation;
