//! The tool surface the agent sees.
//!
//! Caddey tools are discovered at runtime, so the agent only knows their
//! advertised [`ToolSpec`]s and a [`Toolbox`] that can run them by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// Runs tools on the model's behalf.
#[async_trait]
pub trait Toolbox: Send + Sync {
    /// Every tool currently offered.
    async fn list(&self) -> Result<Vec<ToolSpec>, ChatError>;

    /// Run `name` with the model's raw JSON `arguments` and return the text
    /// handed back to the model.
    async fn invoke(&self, name: &str, arguments: &str) -> Result<String, ChatError>;
}
