//! User-facing error text.

use crate::auth::AuthError;
use crate::error::ChatError;

/// Map a [`ChatError`] to a one-line message with actionable guidance.
pub fn format_error_help(err: &ChatError) -> String {
    match err {
        ChatError::Configuration(msg) => format!("Error: {msg}."),
        ChatError::Authentication(auth) => format_auth_error(auth),
        ChatError::Api { status: 401 | 403, message } => {
            format!("Error: the model provider rejected the API key ({message}). Check OPENROUTER_API_KEY.")
        }
        other => format!("Error: {other}"),
    }
}

/// Map an [`AuthError`] from the device login.
pub fn format_auth_error(err: &AuthError) -> String {
    match err {
        AuthError::Setup { body, .. } => format!("Error requesting device code: {body}"),
        AuthError::Denied { code } => format!("Authentication error: {code}"),
        AuthError::Transport { body, .. } => format!("Unexpected error: {body}"),
        AuthError::TimedOut { waited_secs } => {
            format!("Authentication timed out after {waited_secs}s. Run again to get a new code.")
        }
        other => format!("Authentication error: {other}"),
    }
}
