//! Command-line arguments and console text for the chat binary.

pub mod banner;
pub mod errors;

use std::time::Duration;

use clap::Parser;

use crate::config::ChatConfig;

/// Chat with an assistant that can use your Caddey tools.
#[derive(Parser, Debug)]
#[command(name = "caddey-chat", version, about)]
pub struct Cli {
    /// OpenRouter model id (overrides CADDEY_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// MCP endpoint URL (overrides CADDEY_MCP_URL)
    #[arg(long)]
    pub mcp_url: Option<String>,

    /// Give up on browser login after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Per-request HTTP timeout for the login requests, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub request_timeout: u64,

    /// Give up on a model reply after this many seconds (default: no limit)
    #[arg(long, value_name = "SECS")]
    pub model_timeout: Option<u64>,

    /// Do not read or write the input history file
    #[arg(long)]
    pub no_history: bool,

    /// Enable debug logging for this crate
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply flag overrides on top of environment configuration.
    pub fn apply(&self, config: &mut ChatConfig) {
        if let Some(model) = &self.model {
            config.set_model(model.clone());
        }
        if let Some(url) = &self.mcp_url {
            config.set_mcp_url(url.clone());
        }
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn model_timeout(&self) -> Option<Duration> {
        self.model_timeout.map(Duration::from_secs)
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "warn,caddey_chat=debug"
        } else {
            "warn"
        }
    }
}
