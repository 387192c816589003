//! Caddey chat client.
//!
//! Signs in to Caddey with the OAuth 2.0 device authorization grant, connects
//! to the Caddey MCP server with the resulting bearer token, and runs an
//! interactive chat with an OpenRouter-hosted model that can call the
//! discovered tools.
//!
//! # Quick Start
//!
//! ```no_run
//! use caddey_chat::auth::DeviceAuthClient;
//! use caddey_chat::config::ChatConfig;
//!
//! # async fn example() -> caddey_chat::error::Result<()> {
//! let config = ChatConfig::from_env()?;
//! let token = DeviceAuthClient::new(config.client_id)?
//!     .authenticate(|session| println!("Open {}", session.verification_uri_complete))
//!     .await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod provider;
pub mod tools;
pub mod types;
