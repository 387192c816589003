//! The Caddey assistant: one model, the discovered tools, a fixed prompt.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::chat::Responder;
use crate::error::ChatError;
use crate::provider::{CompletionRequest, FinishReason, ModelProvider};
use crate::tools::{ToolSpec, Toolbox};
use crate::types::{ChatMessage, ToolCall};

use super::conversation::Conversation;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to Caddey tools. \
Use the available tools to help users accomplish their tasks. Be concise and friendly.";

/// Model rounds allowed per user turn before giving up on tool calls.
pub const MAX_TOOL_ROUNDS: usize = 20;

const TEMPERATURE: f64 = 0.0;

/// Answers user turns, running Caddey tools when the model asks for them.
///
/// Holds no history of its own; every call gets the whole [`Conversation`].
pub struct Agent {
    provider: Box<dyn ModelProvider>,
    system_prompt: String,
    toolbox: Option<Arc<dyn Toolbox>>,
    tools: Vec<ToolSpec>,
}

impl Agent {
    pub fn new(provider: Box<dyn ModelProvider>) -> Self {
        Self {
            provider,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            toolbox: None,
            tools: Vec::new(),
        }
    }

    /// Append server-provided guidance to the system prompt.
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        if let Some(text) = instructions.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            self.system_prompt.push_str("\n\n");
            self.system_prompt.push_str(text);
        }
        self
    }

    /// Offer `tools` to the model and run its calls through `toolbox`.
    pub fn with_toolbox(mut self, toolbox: Arc<dyn Toolbox>, tools: Vec<ToolSpec>) -> Self {
        self.toolbox = Some(toolbox);
        self.tools = tools;
        self
    }

    /// Answer the last user turn of `history`.
    ///
    /// Tool failures are handed back to the model as text so it can recover;
    /// only model errors end the turn early.
    pub async fn respond(&self, history: &Conversation) -> Result<String, ChatError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend_from_slice(history.messages());

        let mut last_text = String::new();
        for round in 1..=MAX_TOOL_ROUNDS {
            let completion = self
                .provider
                .complete(CompletionRequest {
                    messages: &messages,
                    tools: &self.tools,
                    temperature: TEMPERATURE,
                })
                .await?;
            let reply = completion.message;

            if reply.tool_calls.is_empty() {
                if completion.finish_reason == Some(FinishReason::Length) {
                    warn!(model = self.provider.model_id(), "answer was cut off at the token limit");
                }
                debug!(round, model = self.provider.model_id(), "agent answered");
                return Ok(reply.content.unwrap_or_default());
            }

            last_text = reply.content_text().to_string();
            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let output = self.run_tool(call).await;
                messages.push(ChatMessage::tool_output(call, output));
            }
        }

        warn!(rounds = MAX_TOOL_ROUNDS, "model kept calling tools, giving up on this turn");
        Ok(last_text)
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        let toolbox = match &self.toolbox {
            Some(toolbox) if self.tools.iter().any(|tool| tool.name == name) => toolbox,
            _ => {
                warn!(tool = name, "model called an unknown tool");
                return format!("Error: no tool named {name}");
            }
        };
        match toolbox.invoke(name, &call.function.arguments).await {
            Ok(output) => output,
            Err(error) => {
                warn!(tool = name, %error, "tool call failed");
                format!("Error: {error}")
            }
        }
    }
}

#[async_trait]
impl Responder for Agent {
    async fn respond(&self, history: &Conversation) -> Result<String, ChatError> {
        Agent::respond(self, history).await
    }
}
