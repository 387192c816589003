//! MCP transport layer.

use std::fmt;

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;

use crate::auth::AccessToken;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send {
    /// Create and initialize a new rmcp running service for this transport.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError>;

    /// Human-readable endpoint, used in logs.
    fn endpoint(&self) -> &str;
}

/// Streamable HTTP transport for remote MCP servers.
///
/// Every request carries `Authorization: Bearer <token>` when a token is set.
pub struct StreamableHttpTransport {
    url: String,
    bearer_token: Option<AccessToken>,
}

impl StreamableHttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: AccessToken) -> Self {
        self.bearer_token = Some(token);
        self
    }

    fn config(&self) -> StreamableHttpClientTransportConfig {
        let config = StreamableHttpClientTransportConfig::with_uri(self.url.clone());
        match &self.bearer_token {
            Some(token) => config.auth_header(token.secret().to_string()),
            None => config,
        }
    }
}

impl fmt::Debug for StreamableHttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamableHttpTransport")
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token)
            .finish()
    }
}

#[async_trait]
impl MCPTransport for StreamableHttpTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        let transport = StreamableHttpClientTransport::from_config(self.config());
        client_info.into_dyn().serve(transport).await
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
