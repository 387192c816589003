//! Configuration (layered: CLI flags > environment > `.env` file).

use std::fmt;

use tracing::debug;

use crate::auth::client::{DEFAULT_DEVICE_CODE_URL, DEFAULT_TOKEN_URL};
use crate::error::ChatError;

pub const DEFAULT_MCP_URL: &str = "https://api.caddey.ai/mcp";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

pub const CLIENT_ID_VAR: &str = "CADDEY_CLIENT_ID";
pub const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Settings for one run of the chat client.
#[derive(Clone)]
pub struct ChatConfig {
    pub client_id: String,
    pub openrouter_api_key: Option<String>,
    pub device_code_url: String,
    pub token_url: String,
    pub mcp_url: String,
    pub model_base_url: String,
    pub model: String,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("client_id", &self.client_id)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| ".."),
            )
            .field("device_code_url", &self.device_code_url)
            .field("token_url", &self.token_url)
            .field("mcp_url", &self.mcp_url)
            .field("model_base_url", &self.model_base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ChatError> {
        if let Err(error) = dotenvy::dotenv() {
            debug!(%error, "no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// Fails with [`ChatError::Configuration`] when `CADDEY_CLIENT_ID` is
    /// missing or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let client_id = non_empty(CLIENT_ID_VAR)
            .ok_or_else(|| ChatError::Configuration(format!("{CLIENT_ID_VAR} not found")))?;

        Ok(Self {
            client_id,
            openrouter_api_key: non_empty(OPENROUTER_KEY_VAR),
            device_code_url: non_empty("CADDEY_DEVICE_URL")
                .unwrap_or_else(|| DEFAULT_DEVICE_CODE_URL.to_string()),
            token_url: non_empty("CADDEY_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            mcp_url: non_empty("CADDEY_MCP_URL").unwrap_or_else(|| DEFAULT_MCP_URL.to_string()),
            model_base_url: non_empty("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            model: non_empty("CADDEY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// The OpenRouter key, required once the agent is built.
    pub fn require_model_api_key(&self) -> Result<&str, ChatError> {
        self.openrouter_api_key
            .as_deref()
            .ok_or_else(|| ChatError::Configuration(format!("{OPENROUTER_KEY_VAR} not found")))
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn set_mcp_url(&mut self, url: impl Into<String>) {
        self.mcp_url = url.into();
    }
}
