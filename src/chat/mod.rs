//! Interactive chat loop.

pub mod terminal;

use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::agent::Conversation;
use crate::cli::banner;
use crate::error::ChatError;

pub use terminal::TerminalIo;

pub const PROMPT: &str = "💬 You: ";

/// One read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D or closed stdin.
    Eof,
}

/// Console surface the chat loop talks to.
pub trait ChatIo {
    fn read_line(&mut self, prompt: &str) -> Result<Input, ChatError>;
    fn print(&mut self, text: &str);
    fn print_markdown(&mut self, markdown: &str);
}

/// Produces the assistant's reply to the last user turn.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, history: &Conversation) -> Result<String, ChatError>;
}

/// Run the chat loop until the user quits, waiting on Ctrl-C while thinking.
pub async fn run_chat<R, I>(
    conversation: Conversation,
    responder: &R,
    io: &mut I,
) -> Result<Conversation, ChatError>
where
    R: Responder + ?Sized,
    I: ChatIo + ?Sized,
{
    run_chat_with_interrupt(conversation, responder, io, || async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Same as [`run_chat`], with a caller-supplied interrupt signal.
///
/// `interrupt` is called once per turn; when its future resolves before the
/// reply, the turn is abandoned and the loop ends.
pub async fn run_chat_with_interrupt<R, I, F, Fut>(
    mut conversation: Conversation,
    responder: &R,
    io: &mut I,
    mut interrupt: F,
) -> Result<Conversation, ChatError>
where
    R: Responder + ?Sized,
    I: ChatIo + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    io.print(&banner::chat_ready());

    loop {
        let line = match io.read_line(PROMPT)? {
            Input::Line(line) => line,
            Input::Interrupted | Input::Eof => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        conversation.push_user(line);
        io.print("\n🤔  Thinking...\n");

        let outcome = tokio::select! {
            reply = responder.respond(&conversation) => Some(reply),
            _ = interrupt() => None,
        };

        let Some(reply) = outcome else {
            debug!("turn interrupted");
            conversation.rollback_user_turn();
            break;
        };

        match reply {
            Ok(text) if !text.trim().is_empty() => {
                io.print("🤖  Assistant:\n");
                io.print_markdown(&text);
                io.print("");
                conversation.push_assistant(text);
            }
            Ok(_) => {
                io.print("⚠️  No response generated. Please try again.\n");
                conversation.rollback_user_turn();
            }
            Err(error) => {
                warn!(%error, "agent turn failed");
                io.print(&format!("⚠️  Error: {error}\n"));
                conversation.rollback_user_turn();
            }
        }

        io.print(&format!("{}\n", banner::separator()));
    }

    io.print(&banner::farewell());
    Ok(conversation)
}
