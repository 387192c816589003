//! Caddey MCP tools behind the agent's [`Toolbox`] seam.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::tools::{ToolSpec, Toolbox};

use super::client::MCPClient;

/// Shares one MCP session between tool discovery and tool calls.
pub struct MCPToolbox {
    client: Mutex<MCPClient>,
}

impl MCPToolbox {
    pub fn new(client: MCPClient) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    /// Connect if needed and return the server's usage instructions.
    pub async fn server_instructions(&self) -> Result<Option<String>, ChatError> {
        let mut client = self.client.lock().await;
        client.connect().await?;
        Ok(client.instructions())
    }

    /// Close the session, logging rather than returning a failure.
    pub async fn shutdown(&self) {
        if let Err(error) = self.client.lock().await.close().await {
            warn!(%error, "failed to close MCP session");
        }
    }
}

#[async_trait]
impl Toolbox for MCPToolbox {
    async fn list(&self) -> Result<Vec<ToolSpec>, ChatError> {
        self.client.lock().await.list_tools().await
    }

    async fn invoke(&self, name: &str, arguments: &str) -> Result<String, ChatError> {
        debug!(tool = name, "calling Caddey tool");
        self.client.lock().await.call_tool(name, arguments).await
    }
}
