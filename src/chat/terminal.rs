//! Terminal-backed [`ChatIo`]: rustyline input, termimad markdown output.

use std::path::{Path, PathBuf};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use termimad::MadSkin;
use tracing::debug;

use super::{ChatIo, Input};
use crate::error::ChatError;

pub struct TerminalIo {
    editor: DefaultEditor,
    skin: MadSkin,
    history_path: Option<PathBuf>,
}

impl TerminalIo {
    /// Create a terminal session, loading prior history from `history_path`.
    pub fn new(history_path: Option<PathBuf>) -> Result<Self, ChatError> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = history_path.as_deref() {
            if let Err(error) = editor.load_history(path) {
                debug!(%error, path = %path.display(), "no readline history loaded");
            }
        }
        Ok(Self {
            editor,
            skin: MadSkin::default(),
            history_path,
        })
    }

    pub fn history_path(&self) -> Option<&Path> {
        self.history_path.as_deref()
    }

    fn save_history(&mut self) {
        let Some(path) = self.history_path.as_deref() else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                debug!(%error, dir = %parent.display(), "failed to create history directory");
            }
        }
        if let Err(error) = self.editor.save_history(path) {
            debug!(%error, path = %path.display(), "failed to save readline history");
        }
    }
}

impl Drop for TerminalIo {
    fn drop(&mut self) {
        self.save_history();
    }
}

impl ChatIo for TerminalIo {
    fn read_line(&mut self, prompt: &str) -> Result<Input, ChatError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(error) = self.editor.add_history_entry(line.trim()) {
                        debug!(%error, "failed to record history entry");
                    }
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(error) => Err(error.into()),
        }
    }

    fn print(&mut self, text: &str) {
        println!("{text}");
    }

    fn print_markdown(&mut self, markdown: &str) {
        self.skin.print_text(markdown);
    }
}

/// Default history file under the user's data directory.
pub fn default_history_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("ai", "caddey", "caddey-chat")
        .map(|dirs| dirs.data_dir().join("history.txt"))
}
