//! Line editor behind the host prompt.
//!
//! Both frontends open one of these when the Dispatcher asks for a prompt
//! and hand the finished text back through `Dispatcher::prompt_closed`.

use crate::core::input::Key;

/// What a key did to the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Submit(String),
    Cancel,
}

#[derive(Debug, Clone, Default)]
pub struct PromptState {
    pub label: String,
    pub input: String,
    /// Cursor position in chars
    pub cursor: usize,
}

impl PromptState {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            input: String::new(),
            cursor: 0,
        }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.input
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Apply one key. `escape` cancels the prompt.
    pub fn handle(&mut self, key: Key, escape: Key) -> PromptOutcome {
        if key == escape {
            return PromptOutcome::Cancel;
        }
        match key {
            Key::Enter => return PromptOutcome::Submit(std::mem::take(&mut self.input)),
            Key::Backspace if self.cursor == 0 && self.input.is_empty() => {
                return PromptOutcome::Cancel;
            }
            Key::Backspace if self.cursor > 0 => {
                let at = self.byte_index(self.cursor - 1);
                self.input.remove(at);
                self.cursor -= 1;
            }
            Key::Delete => {
                if self.cursor < self.input.chars().count() {
                    let at = self.byte_index(self.cursor);
                    self.input.remove(at);
                }
            }
            Key::Left => self.cursor = self.cursor.saturating_sub(1),
            Key::Right => self.cursor = (self.cursor + 1).min(self.input.chars().count()),
            Key::Home | Key::Ctrl('a') => self.cursor = 0,
            Key::End | Key::Ctrl('e') => self.cursor = self.input.chars().count(),
            Key::Ctrl('u') => {
                let at = self.byte_index(self.cursor);
                self.input.drain(..at);
                self.cursor = 0;
            }
            other => {
                if let Some(c) = other.printable() {
                    let at = self.byte_index(self.cursor);
                    self.input.insert(at, c);
                    self.cursor += 1;
                }
            }
        }
        PromptOutcome::Editing
    }

    /// Label followed by the text typed so far
    pub fn line(&self) -> String {
        format!("{}{}", self.label, self.input)
    }
}
