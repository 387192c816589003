//! In-process MCP sessions for unit tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::model::{ClientInfo, Implementation, ProtocolVersion, ServerInfo, ServerJsonRpcMessage};
use rmcp::service::{
    serve_directly, ClientInitializeError, RoleClient, RxJsonRpcMessage, ServiceExt,
    TxJsonRpcMessage,
};
use rmcp::transport::Transport;
use serde_json::{json, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::transport::{MCPRunningService, MCPTransport};

type Handler = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Canned answers keyed by JSON-RPC method.
///
/// A handler returning `None` hangs up the connection instead of answering.
#[derive(Default)]
pub struct ServerScript {
    handlers: HashMap<&'static str, Handler>,
}

impl ServerScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        method: &'static str,
        handler: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(method, Box::new(handler));
        self
    }

    /// Start a client session already past `initialize`.
    pub fn serve(self, server: Option<ServerInfo>) -> MCPRunningService {
        let (to_server, mut server_inbox) = unbounded_channel::<TxJsonRpcMessage<RoleClient>>();
        let (to_client, client_inbox) = unbounded_channel::<RxJsonRpcMessage<RoleClient>>();

        tokio::spawn(async move {
            while let Some(message) = server_inbox.recv().await {
                let Ok(request) = serde_json::to_value(message) else {
                    continue;
                };
                let (Some(method), Some(id)) = (request["method"].as_str(), request.get("id"))
                else {
                    continue;
                };
                let Some(handler) = self.handlers.get(method) else {
                    continue;
                };
                let Some(result) = handler(&request["params"]) else {
                    return;
                };
                let reply: ServerJsonRpcMessage =
                    serde_json::from_value(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
                        .expect("scripted reply should be valid JSON-RPC");
                if to_client.send(reply).is_err() {
                    return;
                }
            }
        });

        serve_directly(
            ().into_dyn(),
            ChannelTransport {
                to_server,
                client_inbox,
            },
            server,
        )
    }
}

pub fn server_info(instructions: Option<&str>) -> ServerInfo {
    ServerInfo {
        server_info: Implementation {
            name: "caddey".into(),
            title: None,
            version: "test".into(),
            description: None,
            icons: None,
            website_url: None,
        },
        instructions: instructions.map(str::to_string),
        ..Default::default()
    }
}

struct ChannelTransport {
    to_server: UnboundedSender<TxJsonRpcMessage<RoleClient>>,
    client_inbox: UnboundedReceiver<RxJsonRpcMessage<RoleClient>>,
}

impl Transport<RoleClient> for ChannelTransport {
    type Error = io::Error;

    fn send(
        &mut self,
        item: TxJsonRpcMessage<RoleClient>,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send + 'static {
        let result = self
            .to_server
            .send(item)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "scripted server hung up"));
        std::future::ready(result)
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<RoleClient>> {
        self.client_inbox.recv().await
    }

    fn close(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send {
        self.client_inbox.close();
        std::future::ready(Ok(()))
    }
}

/// [`MCPTransport`] handing out prepared connect outcomes in order.
pub struct ScriptedTransport {
    outcomes: VecDeque<Result<MCPRunningService, ClientInitializeError>>,
    versions: Arc<Mutex<Vec<ProtocolVersion>>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<MCPRunningService, ClientInitializeError>>) -> Self {
        Self {
            outcomes: outcomes.into(),
            versions: Arc::default(),
        }
    }

    /// Protocol versions offered on each connect attempt.
    pub fn versions(&self) -> Arc<Mutex<Vec<ProtocolVersion>>> {
        Arc::clone(&self.versions)
    }
}

#[async_trait]
impl MCPTransport for ScriptedTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        self.versions.lock().unwrap().push(client_info.protocol_version);
        self.outcomes.pop_front().unwrap_or_else(|| {
            Err(ClientInitializeError::ConnectionClosed(
                "no scripted connection left".into(),
            ))
        })
    }

    fn endpoint(&self) -> &str {
        "scripted://caddey/mcp"
    }
}
