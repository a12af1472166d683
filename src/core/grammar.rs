//! Grammar state machine: `["reg] [count] command [args]`, one key at a time.
//!
//! The [`Interpreter`] owns the command stack (root command plus an optional
//! motion), the Definition Tables and the Register Store. Each key is routed
//! to the handler of the current [`State`]; a handler either asks for another
//! key or evaluates the command on top of the stack. Text produced while a
//! sentence is in flight is held back and stored only once the root command
//! completes, so an error or an escape leaves the registers untouched.

use crate::core::command::{CommandObject, Evaluation, RegisterWrite, TableKind};
use crate::core::definition::{Argument, Definition, DefinitionTable, Needs};
use crate::core::error::{GrammarError, ViError};
use crate::core::id::CommandId;
use crate::core::input::Key;
use crate::core::register::RegisterStore;
use crate::core::view::View;

/// Key that introduces a register name
const REGISTER_PREFIX: char = '"';
/// Motion a repeated operator key resolves to (`dd`, `yy`, `>>`)
const DITTO_MOTION: &str = "_";

/// Parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Start,
    Register,
    Count,
    Command,
    Arg,
    Subcommand,
    Input,
    /// A prompt was requested but not yet opened by the host
    Prompt,
    /// The host prompt is open
    PromptWait,
}

/// Result of feeding one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Key consumed, waiting in the given state
    Pending(State),
    /// No Definition applies; the host should handle the key
    Unhandled,
    /// A command ran to completion
    Done,
    /// The sentence in progress was discarded
    Cancelled,
}

/// The command grammar and everything it evaluates against
pub struct Interpreter {
    commands: DefinitionTable,
    motions: DefinitionTable,
    registers: RegisterStore,
    stack: Vec<CommandObject>,
    state: State,
    pending: Vec<RegisterWrite>,
    last: Option<CommandObject>,
    escape: Key,
    next_id: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DefinitionTable::new(), DefinitionTable::new())
    }
}

impl Interpreter {
    pub fn new(commands: DefinitionTable, motions: DefinitionTable) -> Self {
        Self {
            commands,
            motions,
            registers: RegisterStore::new(),
            stack: Vec::new(),
            state: State::Start,
            pending: Vec::new(),
            last: None,
            escape: Key::Esc,
            next_id: 1,
        }
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_escape(&mut self, key: Key) {
        self.escape = key;
    }

    pub fn escape(&self) -> Key {
        self.escape
    }

    pub fn commands(&self) -> &DefinitionTable {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut DefinitionTable {
        &mut self.commands
    }

    pub fn motions(&self) -> &DefinitionTable {
        &self.motions
    }

    pub fn motions_mut(&mut self) -> &mut DefinitionTable {
        &mut self.motions
    }

    pub fn registers(&self) -> &RegisterStore {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterStore {
        &mut self.registers
    }

    /// The most recently completed root command
    pub fn last_command(&self) -> Option<&CommandObject> {
        self.last.as_ref()
    }

    /// The command currently being parsed or evaluated
    pub fn current(&self) -> Option<&CommandObject> {
        self.stack.last()
    }

    /// Keys consumed by the sentence in progress
    pub fn status(&self) -> &str {
        self.stack.first().map(CommandObject::status).unwrap_or("")
    }

    /// Label of the prompt the current command is waiting on
    pub fn prompt_label(&self) -> Option<&str> {
        match self.stack.last()?.needs()? {
            Needs::Prompt(label) => Some(label),
            _ => None,
        }
    }

    /// Text typed so far in the input state
    pub fn input_text(&self) -> Option<&str> {
        match self.state {
            State::Input => self.stack.last().map(CommandObject::input),
            _ => None,
        }
    }

    // ==================== Lifecycle ====================

    /// Discard the sentence in progress without side effects
    pub fn reset(&mut self) {
        self.stack.clear();
        self.pending.clear();
        self.state = State::Start;
    }

    /// The host opened the prompt requested by the current command
    pub fn prompt_opened(&mut self) {
        if self.state == State::Prompt {
            self.state = State::PromptWait;
        }
    }

    /// Resume a command waiting on a prompt. `None` means the prompt was
    /// cancelled, which resumes with empty text.
    pub fn prompt_closed(
        &mut self,
        text: Option<String>,
        view: &mut dyn View,
    ) -> Result<Transition, ViError> {
        if !matches!(self.state, State::Prompt | State::PromptWait) {
            return Ok(Transition::Unhandled);
        }
        let result = self.resume(Argument::Text(text.unwrap_or_default()), view);
        self.settle(result)
    }

    /// Consume one key
    pub fn feed(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        if key == self.escape && !matches!(self.state, State::Start | State::Input) {
            tracing::debug!(target: "vi.grammar", state = ?self.state, "cancelled");
            self.reset();
            return Ok(Transition::Cancelled);
        }

        let result = match self.state {
            State::Start => self.start(key, view),
            State::Register => self.register(key),
            State::Count => self.count(key, view),
            State::Command => self.command(key, view),
            State::Arg => self.arg(key, view),
            State::Subcommand => self.subcommand(key, view),
            State::Input => self.input(key, view),
            State::Prompt | State::PromptWait => Ok(Transition::Unhandled),
        };
        self.settle(result)
    }

    fn settle(&mut self, result: Result<Transition, ViError>) -> Result<Transition, ViError> {
        match &result {
            Ok(Transition::Pending(state)) => {
                tracing::trace!(target: "vi.grammar", ?state, "pending");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(target: "vi.grammar", %err, "sentence aborted");
                self.reset();
            }
        }
        result
    }

    fn allocate(&mut self) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        id
    }

    fn top_mut(&mut self) -> Result<&mut CommandObject, ViError> {
        self.stack
            .last_mut()
            .ok_or_else(|| ViError::Internal("command stack is empty".to_string()))
    }

    fn echo(&mut self, key: &Key) {
        if let Some(root) = self.stack.first_mut() {
            root.echo(key);
        }
    }

    fn pending(&mut self, state: State) -> Result<Transition, ViError> {
        self.state = state;
        Ok(Transition::Pending(state))
    }

    // ==================== States ====================

    fn start(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        self.stack.clear();
        self.pending.clear();
        let id = self.allocate();
        self.stack.push(CommandObject::new(id, TableKind::Commands));

        if key == Key::Char(REGISTER_PREFIX) {
            self.echo(&key);
            return self.pending(State::Register);
        }
        match key.digit() {
            Some(d) if d != 0 => self.count(key, view),
            _ => self.command(key, view),
        }
    }

    fn register(&mut self, key: Key) -> Result<Transition, ViError> {
        let name = key
            .printable()
            .filter(|c| *c != '\t')
            .ok_or_else(|| GrammarError::BadRegister(key.to_string()))?;
        self.echo(&key);
        self.top_mut()?.register = Some(name);
        self.pending(State::Count)
    }

    fn count(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        let top = self.top_mut()?;
        match key.digit() {
            Some(d) if d != 0 || top.has_count() => {
                top.push_digit(d);
                self.echo(&key);
                self.pending(State::Count)
            }
            _ => self.command(key, view),
        }
    }

    fn lookup(&self, keycode: &str) -> Option<(String, Definition)> {
        let top = self.stack.last()?;
        match top.table() {
            TableKind::Commands => self
                .commands
                .get(keycode)
                .or_else(|| self.motions.get(keycode))
                .map(|def| (keycode.to_string(), def.clone())),
            TableKind::Motions => {
                let parent = self.stack.len().checked_sub(2).map(|i| &self.stack[i]);
                if parent.is_some_and(|p| p.keycode == keycode) {
                    self.motions
                        .get(DITTO_MOTION)
                        .map(|def| (DITTO_MOTION.to_string(), def.clone()))
                } else {
                    self.motions
                        .get(keycode)
                        .map(|def| (keycode.to_string(), def.clone()))
                }
            }
        }
    }

    fn command(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        let keycode = key.keycode();
        self.echo(&key);
        match self.lookup(&keycode) {
            Some((keycode, definition)) => {
                tracing::debug!(
                    target: "vi.grammar",
                    keycode = %keycode,
                    description = %definition.description,
                    "bound"
                );
                self.top_mut()?.bind(keycode, definition);
                self.run(view)
            }
            None => {
                let top = self.top_mut()?;
                if top.table() == TableKind::Motions {
                    return Err(GrammarError::UnknownMotion(keycode).into());
                }
                if top.register.is_some() || top.has_count() {
                    let sentence = top.status().to_string();
                    return Err(GrammarError::DanglingPrefix(sentence).into());
                }
                self.reset();
                Ok(Transition::Unhandled)
            }
        }
    }

    fn arg(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        let c = key
            .printable()
            .ok_or_else(|| GrammarError::BadArgument(key.to_string()))?;
        self.echo(&key);
        self.resume(Argument::Char(c), view)
    }

    fn subcommand(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        let id = self.allocate();
        let child = self.top_mut()?.spawn_motion(id);
        self.stack.push(child);
        match key.digit() {
            Some(d) if d != 0 => self.count(key, view),
            _ => self.command(key, view),
        }
    }

    fn input(&mut self, key: Key, view: &mut dyn View) -> Result<Transition, ViError> {
        if key == self.escape {
            let text = self.top_mut()?.take_input();
            return self.resume(Argument::Text(text), view);
        }
        let ending = view.line_ending();
        let top = self.top_mut()?;
        match key {
            Key::Backspace => {
                top.pop_input();
            }
            Key::Enter => top.push_input(ending.as_str()),
            Key::Tab => top.push_input("\t"),
            Key::Char(c) => top.push_input(c.encode_utf8(&mut [0; 4])),
            _ => {}
        }
        self.pending(State::Input)
    }

    // ==================== Evaluation ====================

    fn resume(&mut self, argument: Argument, view: &mut dyn View) -> Result<Transition, ViError> {
        self.top_mut()?.resume_with_argument(argument);
        self.run(view)
    }

    /// Evaluate the top of the stack, resuming parents as children complete
    fn run(&mut self, view: &mut dyn View) -> Result<Transition, ViError> {
        loop {
            let top = self
                .stack
                .last_mut()
                .ok_or_else(|| ViError::Internal("command stack is empty".to_string()))?;
            let evaluation = top.evaluate(view, &self.registers)?;

            match evaluation {
                Evaluation::Suspended(Needs::Motion) => return self.pending(State::Subcommand),
                Evaluation::Suspended(Needs::Char) => return self.pending(State::Arg),
                Evaluation::Suspended(Needs::Input) => return self.pending(State::Input),
                Evaluation::Suspended(Needs::Prompt(_)) => return self.pending(State::Prompt),
                Evaluation::Complete(write) => {
                    self.pending.extend(write);
                    let done = self
                        .stack
                        .pop()
                        .ok_or_else(|| ViError::Internal("command stack is empty".to_string()))?;
                    match self.stack.last_mut() {
                        Some(parent) => parent.resume_with(done),
                        None => {
                            self.commit();
                            self.last = Some(done);
                            self.state = State::Start;
                            return Ok(Transition::Done);
                        }
                    }
                }
            }
        }
    }

    fn commit(&mut self) {
        for write in self.pending.drain(..) {
            tracing::trace!(
                target: "vi.registers",
                register = ?write.register,
                len = write.text.len(),
                "commit"
            );
            self.registers
                .record(write.register, &write.text, write.numbered);
        }
    }
}
