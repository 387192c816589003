use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::error::AuthError;
use super::token::AccessToken;

/// Poll interval used when the device endpoint omits `interval`.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Seconds added to the poll interval on every `slow_down` answer.
pub const SLOW_DOWN_STEP_SECS: u64 = 5;

pub(crate) const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Device-code session details returned by the device endpoint.
///
/// The device code is a server-side secret: it has no public accessor and is
/// redacted from `Debug`.
///
/// # Example
/// ```
/// use caddey_chat::auth::DeviceCodeSession;
///
/// let session = DeviceCodeSession::new(
///     "d1",
///     "ABCD-1234",
///     "https://auth.example/device",
///     "https://auth.example/device?user_code=ABCD-1234",
///     5,
/// );
/// assert!(!format!("{session:?}").contains("d1"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceCodeSession {
    device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: String,
    pub interval_secs: u64,
    pub expires_in: Option<u64>,
}

impl DeviceCodeSession {
    pub fn new(
        device_code: impl Into<String>,
        user_code: impl Into<String>,
        verification_uri: impl Into<String>,
        verification_uri_complete: impl Into<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            device_code: device_code.into(),
            user_code: user_code.into(),
            verification_uri: verification_uri.into(),
            verification_uri_complete: verification_uri_complete.into(),
            interval_secs,
            expires_in: None,
        }
    }

    pub(crate) fn device_code(&self) -> &str {
        &self.device_code
    }
}

impl fmt::Debug for DeviceCodeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCodeSession")
            .field("device_code", &"***")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("interval_secs", &self.interval_secs)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Outcome of a single non-terminal-or-successful token poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCodePoll {
    Pending,
    SlowDown,
    Authorized { access_token: AccessToken },
}

/// Mutable polling state for one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    interval: Duration,
    waited: Duration,
    attempts: u32,
}

impl PollState {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            waited: Duration::ZERO,
            attempts: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Account for one sleep followed by one request.
    pub fn record_attempt(&mut self) {
        self.waited += self.interval;
        self.attempts += 1;
    }

    pub fn slow_down(&mut self) {
        self.interval += Duration::from_secs(SLOW_DOWN_STEP_SECS);
    }

    /// Whether sleeping once more would exceed `max_wait`.
    pub fn would_exceed(&self, max_wait: Duration) -> bool {
        self.waited + self.interval > max_wait
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(default)]
    verification_uri: Option<String>,
    verification_uri_complete: String,
    #[serde(default)]
    interval: Option<u64>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl From<DeviceCodeResponse> for DeviceCodeSession {
    fn from(payload: DeviceCodeResponse) -> Self {
        let verification_uri = payload
            .verification_uri
            .unwrap_or_else(|| payload.verification_uri_complete.clone());
        Self {
            device_code: payload.device_code,
            user_code: payload.user_code,
            verification_uri,
            verification_uri_complete: payload.verification_uri_complete,
            interval_secs: payload.interval.unwrap_or(DEFAULT_INTERVAL_SECS),
            expires_in: payload.expires_in,
        }
    }
}

#[derive(Deserialize)]
struct TokenSuccess {
    access_token: AccessToken,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
}

/// Classify a token-endpoint response by status code and body.
pub(crate) fn classify_token_response(status: u16, body: &str) -> Result<DeviceCodePoll, AuthError> {
    match status {
        200 => {
            let payload: TokenSuccess = serde_json::from_str(body)?;
            Ok(DeviceCodePoll::Authorized {
                access_token: payload.access_token,
            })
        }
        400 => {
            let error = serde_json::from_str::<TokenErrorBody>(body)
                .ok()
                .and_then(|payload| payload.error);
            match error.as_deref() {
                Some("authorization_pending") => Ok(DeviceCodePoll::Pending),
                Some("slow_down") => Ok(DeviceCodePoll::SlowDown),
                Some(code) => Err(AuthError::Denied {
                    code: code.to_string(),
                }),
                None => Err(AuthError::Transport {
                    status,
                    body: body.to_string(),
                }),
            }
        }
        _ => Err(AuthError::Transport {
            status,
            body: body.to_string(),
        }),
    }
}
