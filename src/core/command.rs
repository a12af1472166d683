//! Command Objects and the evaluation algorithm that runs a Definition.
//!
//! A [`CommandObject`] is filled in key by key by the grammar
//! ([`Interpreter`](crate::core::grammar::Interpreter)) and then evaluated.
//! Evaluation either completes, producing at most one register write, or
//! suspends on the next [`Needs`] entry of its Definition. Suspended objects
//! are resumed with [`CommandObject::resume_with_argument`] or
//! [`CommandObject::resume_with`] and evaluated again.

use std::collections::VecDeque;

use crate::core::definition::{Argument, Definition, MotionKind, Needs, Repeat};
use crate::core::error::{ActionError, GrammarError, ViError};
use crate::core::id::CommandId;
use crate::core::input::Key;
use crate::core::register::{Numbered, RegisterStore};
use crate::core::view::View;

/// Most repetitions of a Definition's last action a count may ask for
const MAX_REPEAT: usize = 100_000;

/// Table a Command Object resolves its keycode against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKind {
    /// Commands first, then motions
    #[default]
    Commands,
    Motions,
}

/// Text produced by a completed Command Object, not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: Option<char>,
    pub text: String,
    pub numbered: Option<Numbered>,
}

/// Outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// More input is required before the actions can run
    Suspended(Needs),
    Complete(Option<RegisterWrite>),
}

/// One grammar sentence, in progress or complete
#[derive(Debug, Clone)]
pub struct CommandObject {
    id: CommandId,
    table: TableKind,
    pub keycode: String,
    pub register: Option<char>,
    count: Option<usize>,
    /// Count inherited from the invoking command
    multiplier: usize,
    pub argument: Argument,
    pub subcommand: Option<Box<CommandObject>>,
    pub parent: Option<CommandId>,
    awaiting: VecDeque<Needs>,
    status: String,
    definition: Option<Definition>,
    input: String,
}

impl CommandObject {
    pub fn new(id: CommandId, table: TableKind) -> Self {
        Self {
            id,
            table,
            keycode: String::new(),
            register: None,
            count: None,
            multiplier: 1,
            argument: Argument::None,
            subcommand: None,
            parent: None,
            awaiting: VecDeque::new(),
            status: String::new(),
            definition: None,
            input: String::new(),
        }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn table(&self) -> TableKind {
        self.table
    }

    /// Create the motion this command is waiting for.
    ///
    /// The child inherits the register and takes over the count, so `2d3w`
    /// runs `w` six times and `d` once.
    pub fn spawn_motion(&mut self, id: CommandId) -> CommandObject {
        let mut child = CommandObject::new(id, TableKind::Motions);
        child.register = self.register;
        child.parent = Some(self.id);
        child.multiplier = self.count();
        self.count = None;
        self.multiplier = 1;
        child
    }

    // ==================== Count ====================

    /// Effective repeat factor, at least 1
    pub fn count(&self) -> usize {
        self.count.unwrap_or(1).saturating_mul(self.multiplier)
    }

    /// Count as typed, `None` when neither this command nor its parent had one
    pub fn typed_count(&self) -> Option<usize> {
        if self.count.is_none() && self.multiplier == 1 {
            None
        } else {
            Some(self.count())
        }
    }

    pub fn has_count(&self) -> bool {
        self.count.is_some()
    }

    /// Append one decimal digit, saturating at `usize::MAX`
    pub fn push_digit(&mut self, digit: usize) -> usize {
        let count = self
            .count
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(digit);
        self.count = Some(count);
        count
    }

    // ==================== Binding and suspension ====================

    /// Attach a Definition; its `needs` become the awaited inputs
    pub fn bind(&mut self, keycode: impl Into<String>, definition: Definition) {
        self.keycode = keycode.into();
        self.awaiting = definition.needs.iter().cloned().collect();
        self.definition = Some(definition);
    }

    pub fn definition(&self) -> Option<&Definition> {
        self.definition.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.definition.is_some()
    }

    /// The input this command is currently waiting for
    pub fn needs(&self) -> Option<&Needs> {
        self.awaiting.front()
    }

    /// Satisfy the current need with `argument`
    pub fn resume_with_argument(&mut self, argument: Argument) {
        self.awaiting.pop_front();
        self.argument = argument;
    }

    /// Satisfy the pending motion with a completed child
    pub fn resume_with(&mut self, mut child: CommandObject) {
        child.parent = None;
        if self.awaiting.front() == Some(&Needs::Motion) {
            self.awaiting.pop_front();
        }
        self.subcommand = Some(Box::new(child));
    }

    /// Kind of the motion this command ran, if any
    pub fn motion_kind(&self) -> Option<MotionKind> {
        self.subcommand
            .as_ref()
            .and_then(|sub| sub.definition.as_ref())
            .map(|def| def.motion)
    }

    // ==================== Text buffer and echo ====================

    pub fn push_input(&mut self, text: &str) {
        self.input.push_str(text);
    }

    pub fn pop_input(&mut self) -> Option<char> {
        self.input.pop()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Record a consumed key for display
    pub fn echo(&mut self, key: &Key) {
        match key.printable() {
            Some(c) if c != '\t' => self.status.push(c),
            _ => {
                self.status.push('<');
                self.status.push_str(&key.keycode());
                self.status.push('>');
            }
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    // ==================== Evaluation ====================

    fn apply_overrides(&mut self, definition: &Definition) {
        let overrides = &definition.overrides;
        if let Some(keycode) = &overrides.keycode {
            self.keycode.clone_from(keycode);
        }
        if let Some(register) = overrides.register {
            self.register = Some(register);
        }
        if let Some(count) = overrides.count {
            self.count = Some(count);
        }
        if let Some(argument) = &overrides.argument {
            self.argument = argument.clone();
        }
    }

    /// Run the bound Definition as far as the available input allows
    pub fn evaluate(
        &mut self,
        view: &mut dyn View,
        registers: &RegisterStore,
    ) -> Result<Evaluation, ViError> {
        let definition = loop {
            let definition = self
                .definition
                .clone()
                .ok_or_else(|| ViError::Internal(format!("{} has no definition", self.id)))?;
            self.apply_overrides(&definition);

            match (&definition.nested, &self.argument) {
                (Some(nested), Argument::Char(c)) => {
                    let c = *c;
                    let keycode = format!("{}{}", self.keycode, c);
                    let next = nested
                        .get(&c.to_string())
                        .cloned()
                        .ok_or_else(|| GrammarError::UnknownSequence(keycode.clone()))?;
                    tracing::trace!(target: "vi.eval", keycode = %keycode, "nested rebind");
                    self.argument = Argument::None;
                    self.bind(keycode, next);
                }
                _ => break definition,
            }
        };

        if let Some(needs) = self.awaiting.front() {
            tracing::trace!(target: "vi.eval", keycode = %self.keycode, ?needs, "suspend");
            return Ok(Evaluation::Suspended(needs.clone()));
        }

        tracing::debug!(
            target: "vi.eval",
            keycode = %self.keycode,
            count = self.count(),
            register = ?self.register,
            "evaluate"
        );

        let extending = self.parent.is_some();
        let text = {
            let mut scope = ViewScope::open(view, extending);
            let result = self.run_actions(&definition, &mut *scope.view, registers);
            if extending && result.is_ok() {
                apply_motion_kind(definition.motion, &mut *scope.view);
            }
            result?
        };
        if text.is_empty() {
            return Ok(Evaluation::Complete(None));
        }
        Ok(Evaluation::Complete(Some(RegisterWrite {
            register: self.register,
            text,
            numbered: definition.numbered,
        })))
    }

    fn run_actions(
        &self,
        definition: &Definition,
        view: &mut dyn View,
        registers: &RegisterStore,
    ) -> Result<String, ActionError> {
        let times = match definition.repeat {
            Repeat::Count => self.count(),
            Repeat::Once => 1,
        };
        if times > MAX_REPEAT && !definition.actions.is_empty() {
            tracing::warn!(target: "vi.eval", keycode = %self.keycode, times, "count rejected");
            return Err(ActionError::CountTooLarge(times));
        }

        let mut output = String::new();
        let argument = match &definition.before {
            Some(before) => {
                let (argument, text) = before(self, view, registers)?;
                collect(&mut output, text);
                argument
            }
            None => self.argument.clone(),
        };

        if let Some((last, rest)) = definition.actions.split_last() {
            for action in rest {
                collect(&mut output, action(view, &argument)?);
            }
            for _ in 0..times {
                collect(&mut output, last(view, &argument)?);
            }
        }
        if let Some(after) = &definition.after {
            collect(&mut output, after(view, &argument)?);
        }
        Ok(output)
    }
}

/// Undo group around one evaluation, plus extending mode when a motion runs
/// for an operator. Both are closed on drop, so a panicking action leaves the
/// view as it found it.
struct ViewScope<'a> {
    view: &'a mut dyn View,
    extending: bool,
}

impl<'a> ViewScope<'a> {
    fn open(view: &'a mut dyn View, extending: bool) -> Self {
        if extending {
            let caret = view.caret();
            view.set_selection(caret, caret);
            view.set_extending(true);
        }
        view.begin_undo_group();
        Self { view, extending }
    }
}

impl Drop for ViewScope<'_> {
    fn drop(&mut self) {
        self.view.end_undo_group();
        if self.extending {
            self.view.set_extending(false);
        }
    }
}

fn collect(output: &mut String, text: Option<String>) {
    if let Some(text) = text {
        output.push_str(&text);
    }
}

/// Adjust the selection a motion left behind for its operator
fn apply_motion_kind(kind: MotionKind, view: &mut dyn View) {
    match kind {
        MotionKind::Exclusive => {}
        MotionKind::Inclusive => {
            let (anchor, caret) = (view.anchor(), view.caret());
            if caret >= anchor && caret < view.line_end(view.line_of(caret)) {
                let end = view.next_char(caret);
                view.set_selection(anchor, end);
            }
        }
        MotionKind::Linewise => view.expand_selection_to_lines(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rope_view::RopeView;
    use std::sync::{Arc, Mutex};

    fn bound(definition: Definition) -> CommandObject {
        let mut command = CommandObject::new(CommandId(1), TableKind::Commands);
        command.bind("k", definition);
        command
    }

    #[test]
    fn test_push_digit_saturates() {
        let mut command = CommandObject::new(CommandId(1), TableKind::Commands);
        for _ in 0..40 {
            command.push_digit(9);
        }
        assert_eq!(command.count(), usize::MAX);
    }

    #[test]
    fn test_action_counts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let definition = Definition::new("test")
            .action(move |_, _| {
                a.lock().unwrap().push("first");
                Ok(None)
            })
            .action(move |_, _| {
                b.lock().unwrap().push("last");
                Ok(None)
            })
            .after(move |_, _| {
                c.lock().unwrap().push("after");
                Ok(None)
            });

        let mut command = bound(definition);
        command.push_digit(3);
        let mut view = RopeView::from_string("text");
        let registers = RegisterStore::new();
        assert_eq!(
            command.evaluate(&mut view, &registers),
            Ok(Evaluation::Complete(None))
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first", "last", "last", "last", "after"]
        );
    }

    #[test]
    fn test_output_is_concatenated() {
        let definition = Definition::new("emit")
            .action(|_, _| Ok(Some("a".to_string())))
            .action(|_, _| Ok(Some("b".to_string())))
            .after(|_, _| Ok(Some("c".to_string())));
        let mut command = bound(definition);
        command.push_digit(2);
        command.register = Some('q');

        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();
        let Ok(Evaluation::Complete(Some(write))) = command.evaluate(&mut view, &registers) else {
            panic!("expected a register write");
        };
        assert_eq!(write.text, "abbc");
        assert_eq!(write.register, Some('q'));
    }

    #[test]
    fn test_suspends_on_needs() {
        let definition = Definition::new("mark").needs(Needs::Char).action(|_, arg| {
            assert_eq!(arg, &Argument::Char('a'));
            Ok(None)
        });
        let mut command = bound(definition);
        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();

        assert_eq!(
            command.evaluate(&mut view, &registers),
            Ok(Evaluation::Suspended(Needs::Char))
        );
        command.resume_with_argument(Argument::Char('a'));
        assert_eq!(
            command.evaluate(&mut view, &registers),
            Ok(Evaluation::Complete(None))
        );
    }

    #[test]
    fn test_before_prepares_argument() {
        let definition = Definition::new("count")
            .once()
            .before(|cmd, _, _| Ok(Argument::Count(cmd.typed_count())))
            .action(|_, arg| Ok(Some(format!("{:?}", arg))));
        let mut command = bound(definition);
        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();
        let Ok(Evaluation::Complete(Some(write))) = command.evaluate(&mut view, &registers) else {
            panic!("expected output");
        };
        assert_eq!(write.text, "Count(None)");
    }

    #[test]
    fn test_before_output_comes_first() {
        let definition = Definition::new("emit")
            .before_with_output(|_, _, _| Ok((Argument::None, Some("<".to_string()))))
            .action(|_, _| Ok(Some("a".to_string())))
            .after(|_, _| Ok(Some(">".to_string())));
        let mut command = bound(definition);
        command.push_digit(2);

        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();
        let Ok(Evaluation::Complete(Some(write))) = command.evaluate(&mut view, &registers) else {
            panic!("expected a register write");
        };
        assert_eq!(write.text, "<aa>");
    }

    #[test]
    fn test_count_above_limit_is_an_error() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let definition = Definition::new("step").action(move |_, _| {
            *counter.lock().unwrap() += 1;
            Ok(None)
        });
        let mut command = bound(definition);
        for digit in [1, 0, 0, 0, 0, 1] {
            command.push_digit(digit);
        }

        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();
        assert_eq!(
            command.evaluate(&mut view, &registers),
            Err(ViError::Action(ActionError::CountTooLarge(MAX_REPEAT + 1)))
        );
        assert_eq!(*calls.lock().unwrap(), 0);

        let mut command = bound(Definition::new("once").once().action(|_, _| Ok(None)));
        for _ in 0..6 {
            command.push_digit(9);
        }
        assert_eq!(
            command.evaluate(&mut view, &registers),
            Ok(Evaluation::Complete(None))
        );
    }

    #[test]
    fn test_panicking_motion_restores_view() {
        let mut command = CommandObject::new(CommandId(2), TableKind::Motions);
        command.parent = Some(CommandId(1));
        command.bind("Q", Definition::new("broken").action(|_, _| panic!("broken motion")));
        let mut view = RopeView::from_string("abcd");
        let registers = RegisterStore::new();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            command.evaluate(&mut view, &registers)
        }));
        assert!(outcome.is_err());
        assert!(!view.is_extending());

        view.replace_range(0, 1, "");
        view.replace_range(0, 1, "");
        assert!(view.undo());
        assert_eq!(view.to_string(), "bcd");
    }

    #[test]
    fn test_nested_rebind() {
        let mut nested = crate::core::definition::DefinitionTable::new();
        nested.insert("g", Definition::new("top").action(|_, _| Ok(Some("top".into()))));
        let definition = Definition::new("prefix").needs(Needs::Char).nested(nested);

        let mut command = CommandObject::new(CommandId(1), TableKind::Motions);
        command.bind("g", definition);
        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();

        command.evaluate(&mut view, &registers).unwrap();
        command.resume_with_argument(Argument::Char('g'));
        let result = command.evaluate(&mut view, &registers).unwrap();
        assert_eq!(command.keycode, "gg");
        assert!(matches!(result, Evaluation::Complete(Some(_))));

        let mut command = CommandObject::new(CommandId(2), TableKind::Motions);
        command.bind("g", command_with_nested());
        command.resume_with_argument(Argument::Char('q'));
        assert_eq!(
            command.evaluate(&mut view, &registers),
            Err(ViError::Grammar(GrammarError::UnknownSequence("gq".into())))
        );
    }

    fn command_with_nested() -> Definition {
        Definition::new("prefix")
            .needs(Needs::Char)
            .nested(crate::core::definition::DefinitionTable::new())
    }

    #[test]
    fn test_spawn_motion_moves_count() {
        let mut parent = bound(Definition::new("op").needs(Needs::Motion));
        parent.push_digit(2);
        parent.register = Some('a');
        let mut child = parent.spawn_motion(CommandId(2));
        child.push_digit(3);

        assert_eq!(child.count(), 6);
        assert_eq!(child.register, Some('a'));
        assert_eq!(child.parent, Some(parent.id()));
        assert_eq!(parent.count(), 1);
        assert_eq!(parent.typed_count(), None);

        parent.resume_with(child);
        assert!(parent.needs().is_none());
        assert!(parent.subcommand.as_ref().unwrap().parent.is_none());
    }

    #[test]
    fn test_inclusive_motion_extends_selection() {
        let mut parent = bound(Definition::new("op").needs(Needs::Motion));
        let mut child = parent.spawn_motion(CommandId(2));
        child.bind(
            "e",
            Definition::new("end")
                .motion(MotionKind::Inclusive)
                .action(|view, _| {
                    view.word_end();
                    Ok(None)
                }),
        );

        let mut view = RopeView::from_string("word next");
        let registers = RegisterStore::new();
        child.evaluate(&mut view, &registers).unwrap();
        assert_eq!(view.selection_range(), (0, 4));
        assert!(!view.is_extending());
    }

    #[test]
    fn test_failed_action_has_no_output() {
        let definition = Definition::new("fail")
            .action(|_, _| Ok(Some("lost".into())))
            .action(|_, _| Err(ActionError::Failed("boom".into())));
        let mut command = bound(definition);
        let mut view = RopeView::from_string("");
        let registers = RegisterStore::new();
        assert_eq!(
            command.evaluate(&mut view, &registers),
            Err(ViError::Action(ActionError::Failed("boom".into())))
        );
    }
}
