use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::config::Config;
use crate::core::command::CommandObject;
use crate::core::commands;
use crate::core::definition::DefinitionTable;
use crate::core::error::ViError;
use crate::core::grammar::{Interpreter, State, Transition};
use crate::core::input::Key;
use crate::core::register::RegisterStore;
use crate::core::view::{Ui, View};

/// Mode lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    Entered,
    Exited,
}

/// Answer to the host's "did you consume this key" question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    Consumed,
    /// The host should apply its default handling
    Unhandled,
}

impl KeyResult {
    pub fn consumed(&self) -> bool {
        *self == KeyResult::Consumed
    }
}

type Subscriber = Box<dyn FnMut(ModeEvent) + Send>;

/// Entry point for key events.
///
/// The Dispatcher owns the interpreter and everything it evaluates against.
/// Errors are reported to the host's status sink and never escape `feed`;
/// a panic inside a Definition tears the whole mode down.
pub struct Dispatcher {
    interpreter: Interpreter,
    subscribers: Vec<Subscriber>,
    exit_key: Key,
    active: bool,
}

impl Dispatcher {
    /// Dispatcher with the built-in Definitions and the aliases from `config`
    pub fn new(config: &Config) -> Self {
        let mut command_table = DefinitionTable::new();
        let mut motion_table = DefinitionTable::new();
        commands::register_all(&mut command_table, &mut motion_table, config);

        let mut dispatcher = Self::with_tables(command_table, motion_table);
        dispatcher.interpreter.set_escape(config.escape_key());
        dispatcher.exit_key = config.exit_key();

        let mut bindings: Vec<_> = config.keybindings.iter().collect();
        bindings.sort();
        for (key, target) in bindings {
            if !dispatcher.bind(key, target) {
                tracing::warn!(target: "vi.dispatch", key = %key, target = %target, "alias target not found");
            }
        }
        dispatcher
    }

    /// Dispatcher over caller-supplied tables
    pub fn with_tables(commands: DefinitionTable, motions: DefinitionTable) -> Self {
        Self {
            interpreter: Interpreter::new(commands, motions),
            subscribers: Vec::new(),
            exit_key: Key::Ctrl(']'),
            active: false,
        }
    }

    /// Alias `keycode` to the Definition bound to `target`, looking in the
    /// commands table first
    pub fn bind(&mut self, keycode: &str, target: &str) -> bool {
        if self.interpreter.commands().contains(target) {
            self.interpreter.commands_mut().alias(keycode, target)
        } else {
            self.interpreter.motions_mut().alias(keycode, target)
        }
    }

    // ==================== Lifecycle ====================

    pub fn subscribe(&mut self, subscriber: impl FnMut(ModeEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.interpreter.reset();
        self.active = true;
        tracing::info!(target: "vi.dispatch", "mode entered");
        self.emit(ModeEvent::Entered);
    }

    /// Leave the mode, dropping any sentence in progress
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.interpreter.reset();
        self.active = false;
        tracing::info!(target: "vi.dispatch", "mode exited");
        self.emit(ModeEvent::Exited);
    }

    fn emit(&mut self, event: ModeEvent) {
        for subscriber in &mut self.subscribers {
            if panic::catch_unwind(AssertUnwindSafe(|| subscriber(event))).is_err() {
                tracing::error!(target: "vi.dispatch", ?event, "mode subscriber panicked");
            }
        }
    }

    // ==================== Keys ====================

    /// Handle one key event
    pub fn feed(&mut self, key: Key, view: &mut dyn View, ui: &mut dyn Ui) -> KeyResult {
        if !self.active {
            return KeyResult::Unhandled;
        }
        if key == self.exit_key {
            if self.in_prompt() {
                ui.close_prompt();
            }
            self.teardown();
            return KeyResult::Consumed;
        }

        let was_prompt = self.in_prompt();
        let interpreter = &mut self.interpreter;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| interpreter.feed(key, view)));
        self.settle(outcome, ui, was_prompt)
    }

    /// The host prompt closed; `None` means it was cancelled
    pub fn prompt_closed(
        &mut self,
        text: Option<String>,
        view: &mut dyn View,
        ui: &mut dyn Ui,
    ) -> KeyResult {
        if !self.active {
            return KeyResult::Unhandled;
        }
        let interpreter = &mut self.interpreter;
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| interpreter.prompt_closed(text, view)));
        self.settle(outcome, ui, false)
    }

    fn in_prompt(&self) -> bool {
        matches!(
            self.interpreter.state(),
            State::Prompt | State::PromptWait
        )
    }

    fn settle(
        &mut self,
        outcome: std::thread::Result<Result<Transition, ViError>>,
        ui: &mut dyn Ui,
        was_prompt: bool,
    ) -> KeyResult {
        match outcome {
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(target: "vi.dispatch", %message, "definition panicked, leaving mode");
                ui.status(&format!("vi mode stopped: {}", message));
                self.teardown();
                KeyResult::Consumed
            }
            Ok(Err(err)) => {
                tracing::warn!(target: "vi.dispatch", %err, "command failed");
                if was_prompt {
                    ui.close_prompt();
                }
                ui.status(&err.to_string());
                KeyResult::Consumed
            }
            Ok(Ok(Transition::Unhandled)) => KeyResult::Unhandled,
            Ok(Ok(Transition::Cancelled)) => {
                if was_prompt {
                    ui.close_prompt();
                }
                ui.status("");
                KeyResult::Consumed
            }
            Ok(Ok(Transition::Pending(State::Prompt))) => {
                let label = self.interpreter.prompt_label().unwrap_or("").to_string();
                ui.open_prompt(&label);
                self.interpreter.prompt_opened();
                KeyResult::Consumed
            }
            Ok(Ok(Transition::Pending(State::Input))) => {
                let text = self.interpreter.input_text().unwrap_or("");
                ui.status(&format!("-- INSERT -- {}", text));
                KeyResult::Consumed
            }
            Ok(Ok(Transition::Pending(_))) => {
                ui.status(self.interpreter.status());
                KeyResult::Consumed
            }
            Ok(Ok(Transition::Done)) => KeyResult::Consumed,
        }
    }

    // ==================== Exposed state ====================

    pub fn state(&self) -> State {
        self.interpreter.state()
    }

    pub fn commands_mut(&mut self) -> &mut DefinitionTable {
        self.interpreter.commands_mut()
    }

    pub fn motions_mut(&mut self) -> &mut DefinitionTable {
        self.interpreter.motions_mut()
    }

    pub fn registers(&self) -> &RegisterStore {
        self.interpreter.registers()
    }

    pub fn registers_mut(&mut self) -> &mut RegisterStore {
        self.interpreter.registers_mut()
    }

    pub fn last_command(&self) -> Option<&CommandObject> {
        self.interpreter.last_command()
    }

    pub fn set_exit_key(&mut self, key: Key) {
        self.exit_key = key;
    }

    pub fn set_escape_key(&mut self, key: Key) {
        self.interpreter.set_escape(key);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
