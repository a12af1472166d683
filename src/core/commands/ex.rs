use super::operators::{copy, cut, shift_lines};
use super::text_arg;
use crate::core::definition::{Definition, DefinitionTable, MotionKind, Needs};
use crate::core::error::{ActionError, ActionResult};
use crate::core::view::View;

/// Select the caret's whole line
fn select_current_line(view: &mut dyn View) {
    let line = view.current_line();
    let start = view.line_start(line);
    view.set_selection(start, start);
    view.expand_selection_to_lines();
}

/// Execute one ex command line
pub fn execute(view: &mut dyn View, input: &str, shift_width: usize) -> ActionResult {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    if let Ok(n) = input.parse::<usize>() {
        view.goto_line(n.saturating_sub(1));
        return Ok(None);
    }

    match input {
        "$" => {
            let last = view.line_count().saturating_sub(1);
            view.goto_line(last);
            Ok(None)
        }
        "d" | "delete" => {
            select_current_line(view);
            Ok(Some(cut(view, MotionKind::Linewise)))
        }
        "y" | "yank" => {
            select_current_line(view);
            Ok(Some(copy(view, MotionKind::Linewise)))
        }
        ">" | "<" => {
            let line = view.current_line();
            shift_lines(view, line, line, shift_width, input == ">");
            Ok(None)
        }
        _ => Err(ActionError::NotAnEditorCommand(input.to_string())),
    }
}

pub fn register(commands: &mut DefinitionTable, shift_width: usize) {
    commands.insert(
        ":",
        Definition::new("ex command")
            .needs(Needs::Prompt(":".to_string()))
            .once()
            .action(move |view, arg| execute(view, text_arg(arg), shift_width)),
    );
}
