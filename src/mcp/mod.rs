//! Model Context Protocol client for the Caddey tool server.

pub mod client;
#[cfg(test)]
mod scripted;
pub mod toolbox;
pub mod transport;

pub use client::MCPClient;
pub use toolbox::MCPToolbox;
pub use transport::{MCPTransport, StreamableHttpTransport};
