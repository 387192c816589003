//! Fixed console text: banners and the device-login box.

use crate::auth::DeviceCodeSession;

const RULE_WIDTH: usize = 70;

/// Heavy horizontal rule used around banners.
pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Light rule printed after each chat turn.
pub fn separator() -> String {
    "-".repeat(RULE_WIDTH)
}

pub fn welcome() -> String {
    format!("\n{rule}\n🚀  Caddey Chat CLI\n{rule}\n", rule = rule())
}

/// Login instructions for a fresh device-code session.
///
/// Shows both verification URIs and the user code. The device code never
/// appears here.
pub fn authentication(session: &DeviceCodeSession) -> String {
    let rule = rule();
    format!(
        "{rule}\n\
         🔐  Authentication Required\n\
         {rule}\n\n   \
         To sign in, open this URL in your browser:\n\n    \
         👉  {complete}\n\n    \
         Or visit: {uri}\n    \
         And enter code: {code}\n\n\
         {rule}\n\
         ⏳  Waiting for authentication...\n",
        complete = session.verification_uri_complete,
        uri = session.verification_uri,
        code = session.user_code,
    )
}

pub fn logged_in() -> &'static str {
    "✅ Logged in successfully! Token acquired.\n"
}

pub fn chat_ready() -> String {
    format!(
        "{rule}\n💬  Chat Interface Ready! (Ctrl+C to exit)\n{rule}\n",
        rule = rule()
    )
}

pub fn farewell() -> String {
    format!(
        "\n\n{rule}\n👋  Thanks for using Caddey Chat CLI!\n{rule}\n",
        rule = rule()
    )
}

/// Hint printed when a required environment variable is missing.
pub fn env_file_hint() -> &'static str {
    "\nPlease create a .env file in this directory with:\n  \
     CADDEY_CLIENT_ID=your-client-id\n  \
     OPENROUTER_API_KEY=your-openrouter-api-key\n"
}
