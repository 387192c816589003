//! HTTP error mapping for the model endpoint.

use reqwest::header::RETRY_AFTER;
use reqwest::Response;
use serde::Deserialize;

use crate::error::ChatError;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Turn a non-success response into a [`ChatError`], consuming the body.
pub async fn error_from_response(response: Response) -> ChatError {
    let status = response.status().as_u16();
    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());
    let body = response.text().await.unwrap_or_default();
    status_error(status, retry_after_secs, &body)
}

/// 429 becomes [`ChatError::RateLimited`]; anything else an API error that
/// carries the provider's `error.message` when the body has one.
pub fn status_error(status: u16, retry_after_secs: Option<u64>, body: &str) -> ChatError {
    if status == 429 {
        return ChatError::RateLimited { retry_after_secs };
    }
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    ChatError::api(status, message)
}
