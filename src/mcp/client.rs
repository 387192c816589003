//! Session with the Caddey MCP server.

use std::future::Future;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, JsonObject, ProtocolVersion,
    ResourceContents,
};
use rmcp::service::{ClientInitializeError, Peer, RoleClient, ServiceError};
use tracing::{debug, info};

use crate::error::ChatError;
use crate::tools::ToolSpec;

use super::transport::{MCPRunningService, MCPTransport};

/// One logical session with the Caddey MCP server.
///
/// The session is opened lazily. If the server drops it, the next request
/// reconnects once and retries before giving up.
pub struct MCPClient {
    transport: Box<dyn MCPTransport>,
    session: Option<MCPRunningService>,
    closed: bool,
}

impl MCPClient {
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport,
            session: None,
            closed: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|session| !session.is_closed())
    }

    /// Open the session unless one is already live.
    pub async fn connect(&mut self) -> Result<(), ChatError> {
        if self.closed {
            return Err(ChatError::mcp("session already closed"));
        }
        if self.is_connected() {
            return Ok(());
        }

        debug!(endpoint = self.transport.endpoint(), "connecting to MCP server");
        let session = match self.transport.connect(client_info(ProtocolVersion::LATEST)).await {
            Err(error) if rejects_protocol_version(&error) => {
                debug!("MCP server refused the latest protocol version, retrying with 2024-11-05");
                self.transport
                    .connect(client_info(ProtocolVersion::V_2024_11_05))
                    .await
            }
            other => other,
        }
        .map_err(initialize_error)?;

        if let Some(server) = session.peer_info() {
            info!(
                server = %server.server_info.name,
                version = %server.server_info.version,
                protocol = %server.protocol_version,
                "connected to MCP server"
            );
        }
        self.session = Some(session);
        Ok(())
    }

    /// Usage guidance the server sent while initializing, if any.
    pub fn instructions(&self) -> Option<String> {
        self.session
            .as_ref()?
            .peer_info()?
            .instructions
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Every tool the server offers, as specs the model can call.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolSpec>, ChatError> {
        let tools = self
            .request("tools/list", |peer| async move { peer.list_all_tools().await })
            .await?;
        debug!(count = tools.len(), "listed MCP tools");
        Ok(tools
            .into_iter()
            .map(|tool| ToolSpec {
                name: tool.name.into_owned(),
                description: tool.description.map(|d| d.into_owned()).unwrap_or_default(),
                parameters: serde_json::Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    /// Call `name` with the model's raw JSON arguments and return the text
    /// the tool produced.
    pub async fn call_tool(&mut self, name: &str, arguments: &str) -> Result<String, ChatError> {
        let params = CallToolRequestParams {
            meta: None,
            name: name.to_string().into(),
            arguments: parse_arguments(name, arguments)?,
            task: None,
        };
        let result = self
            .request("tools/call", move |peer| {
                let params = params.clone();
                async move { peer.call_tool(params).await }
            })
            .await?;
        tool_output(name, result)
    }

    /// End the session. Later requests fail instead of reconnecting.
    pub async fn close(&mut self) -> Result<(), ChatError> {
        self.closed = true;
        if let Some(session) = self.session.take() {
            session
                .cancel()
                .await
                .map_err(|error| ChatError::mcp(format!("closing session: {error}")))?;
        }
        Ok(())
    }

    async fn peer(&mut self) -> Result<Peer<RoleClient>, ChatError> {
        self.connect().await?;
        self.session
            .as_ref()
            .map(|session| session.peer().clone())
            .ok_or_else(|| ChatError::mcp("no session after connect"))
    }

    async fn request<T, F, Fut>(&mut self, method: &'static str, send: F) -> Result<T, ChatError>
    where
        F: Fn(Peer<RoleClient>) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        match send(self.peer().await?).await {
            Ok(value) => Ok(value),
            Err(error) if is_disconnect(&error) => {
                debug!(method, %error, "MCP session dropped, reconnecting once");
                self.session = None;
                send(self.peer().await?)
                    .await
                    .map_err(|error| service_error(method, error))
            }
            Err(error) => Err(service_error(method, error)),
        }
    }
}

fn client_info(protocol_version: ProtocolVersion) -> ClientInfo {
    ClientInfo {
        protocol_version,
        ..Default::default()
    }
}

fn rejects_protocol_version(error: &ClientInitializeError) -> bool {
    let ClientInitializeError::JsonRpcError(error) = error else {
        return false;
    };
    let message = error.message.to_ascii_lowercase();
    message.contains("protocol") && message.contains("version")
}

fn is_disconnect(error: &ServiceError) -> bool {
    matches!(
        error,
        ServiceError::TransportClosed | ServiceError::TransportSend(_) | ServiceError::Cancelled { .. }
    )
}

/// The model sends arguments as a JSON string; MCP wants an object.
fn parse_arguments(tool: &str, raw: &str) -> Result<Option<JsonObject>, ChatError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = |detail: String| ChatError::ToolExecution {
        tool_name: tool.to_string(),
        message: format!("arguments must be a JSON object: {detail}"),
    };
    match serde_json::from_str(raw).map_err(|error| invalid(error.to_string()))? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => Err(invalid(format!("got {other}"))),
    }
}

/// Text parts joined by newlines, falling back to structured content.
fn tool_output(tool: &str, result: CallToolResult) -> Result<String, ChatError> {
    let text = result
        .content
        .iter()
        .filter_map(|content| {
            if let Some(text) = content.as_text() {
                return Some(text.text.clone());
            }
            match &content.as_resource()?.resource {
                ResourceContents::TextResourceContents { text, .. } => Some(text.clone()),
                _ => None,
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let output = match (text.is_empty(), &result.structured_content) {
        (true, Some(structured)) => structured.to_string(),
        _ => text,
    };

    if result.is_error.unwrap_or(false) {
        return Err(ChatError::ToolExecution {
            tool_name: tool.to_string(),
            message: if output.is_empty() {
                "tool reported an error".to_string()
            } else {
                output
            },
        });
    }
    Ok(output)
}

fn initialize_error(error: ClientInitializeError) -> ChatError {
    match error {
        ClientInitializeError::JsonRpcError(error) => ChatError::mcp(format!(
            "initialize rejected ({}): {}",
            error.code.0, error.message
        )),
        other => ChatError::mcp(format!("initialize failed: {other}")),
    }
}

fn service_error(method: &str, error: ServiceError) -> ChatError {
    match error {
        ServiceError::McpError(error) => {
            ChatError::mcp(format!("{method} returned error {}: {}", error.code.0, error.message))
        }
        ServiceError::Timeout { timeout } => {
            ChatError::mcp(format!("{method} timed out after {}s", timeout.as_secs()))
        }
        other => ChatError::mcp(format!("{method}: {other}")),
    }
}
