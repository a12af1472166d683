//! Built-in Definitions
//!
//! This module fills the two Definition Tables the interpreter starts with:
//!
//! - **motions**: caret movement, usable alone or as an operator's subcommand
//! - **operators**: commands that take a motion (`d`, `y`, `c`, `>`, `<`) and
//!   their line shortcuts (`D`, `C`, `Y`, `x`, `X`)
//! - **editing**: insertion, put, replace, case, join, undo, marks, scrolling
//! - **ex**: the `:` prompt
//!
//! Every entry is plain data; users may replace or remove any of them at
//! runtime through the Dispatcher.

use crate::config::Config;
use crate::core::definition::{Argument, Definition, DefinitionTable};
use crate::core::error::ActionError;
use crate::core::view::View;

/// Insertion, put, replace and other single-key edits
pub mod editing;
/// The `:` prompt
pub mod ex;
/// Caret movement
pub mod motions;
/// Commands that act on a motion's selection
pub mod operators;

/// Register every built-in command and motion
pub fn register_all(
    command_table: &mut DefinitionTable,
    motion_table: &mut DefinitionTable,
    config: &Config,
) {
    motions::register(motion_table);
    operators::register(command_table, config.shift_width());
    editing::register(command_table);
    ex::register(command_table, config.shift_width());
    tracing::debug!(
        target: "vi.dispatch",
        commands = command_table.len(),
        motions = motion_table.len(),
        "built-in definitions registered"
    );
}

/// Run once and receive the typed count as the argument
pub(crate) fn with_count(definition: Definition) -> Definition {
    definition
        .once()
        .before(|cmd, _, _| Ok(Argument::Count(cmd.typed_count())))
}

pub(crate) fn char_arg(arg: &Argument) -> Result<char, ActionError> {
    match arg {
        Argument::Char(c) => Ok(*c),
        _ => Err(ActionError::Failed("Missing character argument".into())),
    }
}

pub(crate) fn count_arg(arg: &Argument) -> Option<usize> {
    match arg {
        Argument::Count(n) => *n,
        _ => None,
    }
}

/// Text payload of a prompt or input argument; empty for anything else
pub(crate) fn text_arg(arg: &Argument) -> &str {
    match arg {
        Argument::Text(text) => text,
        Argument::Change { text, .. } => text,
        _ => "",
    }
}

/// Pull the caret back onto the last character of its line
pub(crate) fn clamp_caret(view: &mut dyn View) {
    let caret = view.caret();
    let last = view.last_char_of_line(view.line_of(caret));
    if caret > last {
        view.goto(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut commands = DefinitionTable::new();
        let mut motions = DefinitionTable::new();
        register_all(&mut commands, &mut motions, &Config::default());
        for key in ["d", "y", "c", "p", "P", "x", "i", "u", "C-r", ":", "z"] {
            assert!(commands.contains(key), "missing command {key}");
        }
        assert!(motions.contains("w"));
        assert!(!commands.contains("w"));
    }

    #[test]
    fn test_argument_helpers() {
        assert_eq!(char_arg(&Argument::Char('q')), Ok('q'));
        assert!(char_arg(&Argument::None).is_err());
        assert_eq!(count_arg(&Argument::Count(Some(3))), Some(3));
        assert_eq!(text_arg(&Argument::Text("abc".into())), "abc");
        assert_eq!(text_arg(&Argument::Char('x')), "");
    }
}
