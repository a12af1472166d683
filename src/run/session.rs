//! One view driven by one Dispatcher.
//!
//! Shared by the script and terminal frontends: the session owns the host
//! side of the contract (status line and prompt) and routes keys either to
//! the open prompt or to the Dispatcher.

use crate::config::Config;
use crate::core::dispatcher::{Dispatcher, KeyResult};
use crate::core::grammar::State;
use crate::core::input::Key;
use crate::core::rope_view::RopeView;
use crate::core::view::Ui;
use crate::terminal::prompt::{PromptOutcome, PromptState};

/// Status line and prompt as seen by the Dispatcher
#[derive(Debug, Default)]
pub struct SessionUi {
    pub status: String,
    pub prompt: Option<PromptState>,
}

impl Ui for SessionUi {
    fn status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn open_prompt(&mut self, label: &str) {
        self.prompt = Some(PromptState::new(label));
    }

    fn close_prompt(&mut self) {
        self.prompt = None;
    }
}

pub struct Session {
    pub dispatcher: Dispatcher,
    pub view: RopeView,
    pub ui: SessionUi,
    escape: Key,
    exit: Key,
}

impl Session {
    /// Start a session with the mode already active
    pub fn new(config: &Config, view: RopeView) -> Self {
        let mut dispatcher = Dispatcher::new(config);
        dispatcher.activate();
        Self {
            dispatcher,
            view,
            ui: SessionUi::default(),
            escape: config.escape_key(),
            exit: config.exit_key(),
        }
    }

    /// Move on to another document. The registers and tables carry over;
    /// the mode is re-entered if the last document left it.
    pub fn swap_view(&mut self, view: RopeView) -> RopeView {
        self.ui = SessionUi::default();
        self.dispatcher.activate();
        std::mem::replace(&mut self.view, view)
    }

    pub fn is_active(&self) -> bool {
        self.dispatcher.is_active()
    }

    /// Route one key. Messages from the previous key are cleared first.
    pub fn handle_key(&mut self, key: Key) -> KeyResult {
        self.ui.status.clear();

        let outcome = match self.ui.prompt.as_mut() {
            Some(prompt) if key != self.exit => Some(prompt.handle(key, self.escape)),
            _ => None,
        };
        let Some(outcome) = outcome else {
            return self.dispatcher.feed(key, &mut self.view, &mut self.ui);
        };
        match outcome {
            PromptOutcome::Editing => KeyResult::Consumed,
            PromptOutcome::Submit(text) => {
                self.ui.prompt = None;
                self.dispatcher
                    .prompt_closed(Some(text), &mut self.view, &mut self.ui)
            }
            PromptOutcome::Cancel => {
                self.dispatcher
                    .feed(self.escape, &mut self.view, &mut self.ui)
            }
        }
    }

    /// Finish whatever the last key left open: pending insertion text is
    /// committed, any other partial command is dropped. Returns whether
    /// something was dropped.
    pub fn finish(&mut self) -> bool {
        match self.dispatcher.state() {
            State::Start => false,
            State::Input => {
                self.handle_key(self.escape);
                false
            }
            _ => {
                self.ui.prompt = None;
                self.dispatcher
                    .feed(self.escape, &mut self.view, &mut self.ui);
                true
            }
        }
    }

    /// A message left by the last key once the sentence settled: errors and
    /// teardown notices, never the echo of a command still in progress
    pub fn message(&self) -> Option<&str> {
        if self.dispatcher.state() == State::Start && !self.ui.status.is_empty() {
            Some(&self.ui.status)
        } else {
            None
        }
    }
}
