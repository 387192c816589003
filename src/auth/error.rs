use thiserror::Error;

/// Fatal outcomes of the device-code flow.
///
/// `authorization_pending` and `slow_down` never appear here; they are
/// ordinary polling states (see [`super::DeviceCodePoll`]).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Device code request failed (status {status}): {body}")]
    Setup { status: u16, body: String },
    #[error("Authorization failed: {code}")]
    Denied { code: String },
    #[error("Unexpected token endpoint response (status {status}): {body}")]
    Transport { status: u16, body: String },
    #[error("No authorization after waiting {waited_secs}s")]
    TimedOut { waited_secs: u64 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
