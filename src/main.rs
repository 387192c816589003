//! caddey-chat binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use caddey_chat::agent::{Agent, Conversation};
use caddey_chat::auth::DeviceAuthClient;
use caddey_chat::chat::{run_chat, terminal::default_history_path, TerminalIo};
use caddey_chat::cli::{banner, errors::format_error_help, Cli};
use caddey_chat::config::{ChatConfig, OPENROUTER_KEY_VAR};
use caddey_chat::error::ChatError;
use caddey_chat::mcp::{MCPClient, MCPToolbox, StreamableHttpTransport};
use caddey_chat::provider::OpenAiChatProvider;
use caddey_chat::tools::Toolbox;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    println!("{}", banner::welcome());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("❌ {}", format_error_help(&err));
            if let ChatError::Configuration(msg) = &err {
                println!("{}", banner::env_file_hint());
                if msg.contains(OPENROUTER_KEY_VAR) {
                    println!("Get a free OpenRouter API key at: https://openrouter.ai/keys");
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ChatError> {
    let mut config = ChatConfig::from_env()?;
    cli.apply(&mut config);
    debug!(?config, "configuration loaded");

    let auth_http = reqwest::Client::builder()
        .timeout(cli.request_timeout())
        .build()?;

    let auth = DeviceAuthClient::new(config.client_id.clone())?
        .with_http_client(auth_http)
        .with_device_code_url(&config.device_code_url)
        .with_token_url(&config.token_url)
        .with_max_wait(cli.max_wait());

    let login = auth.authenticate(|session| println!("{}", banner::authentication(session)));
    let token = tokio::select! {
        token = login => token?,
        _ = tokio::signal::ctrl_c() => {
            println!("{}", banner::farewell());
            return Ok(());
        }
    };
    println!("{}", banner::logged_in());

    let api_key = config.require_model_api_key()?;
    println!("🤖 Using OpenRouter ({})", config.model);
    let mut provider = OpenAiChatProvider::new(&config.model, api_key, &config.model_base_url);
    if let Some(timeout) = cli.model_timeout() {
        provider = provider.with_timeout(timeout)?;
    }

    let transport = StreamableHttpTransport::new(&config.mcp_url).with_bearer_token(token);
    let mcp = Arc::new(MCPToolbox::new(MCPClient::new(Box::new(transport))));

    let setup = async {
        println!("🔧 Connecting to Caddey MCP endpoint...");
        let instructions = mcp.server_instructions().await?;
        println!("🔧 Fetching available tools from Caddey...");
        let tools = mcp.list().await?;
        Ok::<_, ChatError>((instructions, tools))
    };
    let (instructions, tools) = tokio::select! {
        setup = setup => setup?,
        _ = tokio::signal::ctrl_c() => {
            mcp.shutdown().await;
            println!("{}", banner::farewell());
            return Ok(());
        }
    };
    println!("✅ Found {} tools available!\n", tools.len());

    let agent = Agent::new(Box::new(provider))
        .with_instructions(instructions)
        .with_toolbox(mcp.clone(), tools);

    let history_path = if cli.no_history {
        None
    } else {
        default_history_path()
    };
    let mut io = TerminalIo::new(history_path)?;

    let result = run_chat(Conversation::new(), &agent, &mut io).await;
    mcp.shutdown().await;
    let conversation = result?;
    debug!(turns = conversation.len(), "chat session ended");
    Ok(())
}
