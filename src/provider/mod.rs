//! Model provider seam and the OpenRouter-compatible implementation.

pub mod http;
pub mod openai;

use async_trait::async_trait;
use strum::EnumString;

use crate::error::ChatError;
use crate::tools::ToolSpec;
use crate::types::ChatMessage;

pub use openai::OpenAiChatProvider;

/// One chat-completions call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolSpec],
    pub temperature: f64,
}

/// The assistant message the model produced.
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: ChatMessage,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn model_id(&self) -> &str;

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ChatError>;
}
