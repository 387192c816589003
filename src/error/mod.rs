//! Error types for the chat client.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for everything outside the device-code flow.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthError),

    #[error("Model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model API rate limit hit{}", retry_hint(*retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Caddey MCP error: {0}")]
    Mcp(String),

    #[error("Tool {tool_name} failed: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl ChatError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn mcp(message: impl Into<String>) -> Self {
        Self::Mcp(message.into())
    }
}

fn retry_hint(retry_after_secs: Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(", retry after {secs}s"))
        .unwrap_or_default()
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;
