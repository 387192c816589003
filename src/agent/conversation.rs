//! Chat history for one session.

use crate::types::{ChatMessage, Role};

/// User and assistant turns, oldest first.
///
/// Tool traffic from inside a turn is not kept; only what the user typed
/// and the final answers.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(text));
    }

    /// Drop the last turn if the user wrote it, so a failed turn leaves no
    /// unanswered question behind. Returns whether anything was removed.
    pub fn rollback_user_turn(&mut self) -> bool {
        if self.messages.last().map(|message| message.role) != Some(Role::User) {
            return false;
        }
        self.messages.pop();
        true
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
