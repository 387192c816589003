//! Chat-completions client, pointed at OpenRouter by default.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChatError;
use crate::tools::ToolSpec;
use crate::types::ChatMessage;

use super::http::error_from_response;
use super::{Completion, CompletionRequest, ModelProvider};

pub struct OpenAiChatProvider {
    model_id: String,
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiChatProvider {
    /// `base_url` is the API root, e.g. `https://openrouter.ai/api/v1`.
    ///
    /// Requests have no overall timeout unless [`with_timeout`](Self::with_timeout)
    /// sets one; long tool-using answers can take minutes.
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ChatError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool<'a>>,
}

#[derive(Serialize)]
struct FunctionTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSpec,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
    error: Option<InlineError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct TokenUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenRouter reports some upstream failures inside a 200 body.
#[derive(Deserialize)]
struct InlineError {
    message: String,
    code: Option<u16>,
}

impl<'a> CompletionBody<'a> {
    fn new(model: &'a str, request: CompletionRequest<'a>) -> Self {
        Self {
            model,
            messages: request.messages,
            temperature: request.temperature,
            tools: request
                .tools
                .iter()
                .map(|function| FunctionTool {
                    kind: "function",
                    function,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiChatProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ChatError> {
        let body = CompletionBody::new(&self.model_id, request);
        debug!(
            model = %self.model_id,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: CompletionResponse = response.json().await?;
        if let Some(error) = parsed.error {
            return Err(ChatError::api(error.code.unwrap_or(200), error.message));
        }
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::api(200, "completion response had no choices"))?;
        Ok(Completion {
            message: choice.message,
            finish_reason: choice.finish_reason.and_then(|reason| reason.parse().ok()),
        })
    }
}
