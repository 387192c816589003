//! Message types shared by the model provider, the agent and the chat loop.

pub mod message;

pub use message::{ChatMessage, FunctionCall, Role, ToolCall};
