use std::fmt;

use serde::Deserialize;

/// Bearer token returned by the token endpoint.
///
/// `Debug` never prints the secret, so the value is safe to carry through
/// `tracing` fields and error contexts.
///
/// # Example
/// ```
/// use caddey_chat::auth::AccessToken;
///
/// let token = AccessToken::new("tok123");
/// assert_eq!(token.secret(), "tok123");
/// assert_eq!(format!("{token:?}"), "AccessToken(***)");
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
