use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, info};

use super::device_code::{
    classify_token_response, DeviceCodePoll, DeviceCodeResponse, DeviceCodeSession, PollState,
    DEVICE_CODE_GRANT_TYPE,
};
use super::error::AuthError;
use super::sleep::{Sleeper, TokioSleeper};
use super::token::AccessToken;

pub const DEFAULT_DEVICE_CODE_URL: &str =
    "https://auth.caddey.ai/realms/caddey/protocol/openid-connect/auth/device";
pub const DEFAULT_TOKEN_URL: &str =
    "https://auth.caddey.ai/realms/caddey/protocol/openid-connect/token";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// OAuth 2.0 Device Authorization Grant client.
///
/// Polling has no attempt limit unless [`with_max_wait`](Self::with_max_wait)
/// is set; it ends on a token, a terminal error, or when the caller drops the
/// future.
///
/// # Example
/// ```no_run
/// use caddey_chat::auth::DeviceAuthClient;
///
/// # async fn example() -> Result<(), caddey_chat::auth::AuthError> {
/// let auth = DeviceAuthClient::new("my-client-id")?;
/// let token = auth
///     .authenticate(|session| {
///         println!("Open {} and enter {}", session.verification_uri, session.user_code);
///     })
///     .await?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
pub struct DeviceAuthClient {
    client: reqwest::Client,
    client_id: String,
    device_code_url: String,
    token_url: String,
    sleeper: Arc<dyn Sleeper>,
    max_wait: Option<Duration>,
}

impl DeviceAuthClient {
    /// Create a client for `client_id`. Fails before any network call when
    /// the identifier is blank.
    pub fn new(client_id: impl Into<String>) -> Result<Self, AuthError> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(AuthError::Configuration(
                "OAuth client identifier is empty".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            client_id,
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            sleeper: Arc::new(TokioSleeper),
            max_wait: None,
        })
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_device_code_url(mut self, url: impl Into<String>) -> Self {
        self.device_code_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Bound the total time spent sleeping between polls.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Request a device code. Any non-200 answer is fatal.
    pub async fn request_device_code(&self) -> Result<DeviceCodeSession, AuthError> {
        debug!(url = %self.device_code_url, "requesting device code");
        let resp = self
            .client
            .post(&self.device_code_url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .form(&[("client_id", self.client_id.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Setup {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let payload: DeviceCodeResponse = serde_json::from_str(&body)?;
        let session = DeviceCodeSession::from(payload);
        debug!(
            interval_secs = session.interval_secs,
            expires_in = ?session.expires_in,
            "device code issued"
        );
        Ok(session)
    }

    /// Perform one token request without sleeping.
    pub async fn poll_once(&self, session: &DeviceCodeSession) -> Result<DeviceCodePoll, AuthError> {
        let resp = self
            .client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .form(&[
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
                ("device_code", session.device_code()),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        classify_token_response(status, &body)
    }

    /// Sleep-then-poll until the token endpoint grants or rejects.
    pub async fn poll_for_token(&self, session: &DeviceCodeSession) -> Result<AccessToken, AuthError> {
        let mut state = PollState::new(session.interval_secs);

        loop {
            if let Some(max_wait) = self.max_wait {
                if state.would_exceed(max_wait) {
                    return Err(AuthError::TimedOut {
                        waited_secs: state.waited().as_secs(),
                    });
                }
            }

            self.sleeper.sleep(state.interval()).await;
            state.record_attempt();

            match self.poll_once(session).await? {
                DeviceCodePoll::Authorized { access_token } => {
                    info!(attempts = state.attempts(), "device authorization granted");
                    return Ok(access_token);
                }
                DeviceCodePoll::Pending => {
                    debug!(attempt = state.attempts(), "authorization pending");
                }
                DeviceCodePoll::SlowDown => {
                    state.slow_down();
                    debug!(
                        attempt = state.attempts(),
                        interval_secs = state.interval().as_secs(),
                        "token endpoint asked to slow down"
                    );
                }
            }
        }
    }

    /// Request a device code, hand it to `present` for display, then poll.
    pub async fn authenticate<F>(&self, present: F) -> Result<AccessToken, AuthError>
    where
        F: FnOnce(&DeviceCodeSession),
    {
        let session = self.request_device_code().await?;
        present(&session);
        self.poll_for_token(&session).await
    }
}
