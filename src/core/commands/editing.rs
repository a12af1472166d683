use super::{char_arg, clamp_caret, count_arg, text_arg, with_count};
use crate::core::definition::{Argument, Definition, DefinitionTable, Needs};
use crate::core::error::{ActionError, ActionResult};
use crate::core::register::{RegisterMode, UNNAMED};
use crate::core::view::{ScrollPlacement, View};

/// Insert register content after (`p`) or before (`P`) the caret
fn put(view: &mut dyn View, arg: &Argument, after: bool) -> ActionResult {
    let Argument::Paste { text, mode } = arg else {
        return Ok(None);
    };
    if text.is_empty() {
        return Ok(None);
    }

    let caret = view.caret();
    let line = view.line_of(caret);
    match mode {
        RegisterMode::Line if after => {
            if line + 1 < view.line_count() {
                let pos = view.line_start(line + 1);
                view.replace_range(pos, pos, text);
            } else {
                let ending = view.line_ending().as_str();
                let body = text.strip_suffix(ending).unwrap_or(text);
                let pos = view.len_chars();
                view.replace_range(pos, pos, &format!("{}{}", ending, body));
            }
            let pos = view.first_non_blank(line + 1);
            view.set_selection(pos, pos);
        }
        RegisterMode::Line => {
            let pos = view.line_start(line);
            view.replace_range(pos, pos, text);
            let pos = view.first_non_blank(line);
            view.set_selection(pos, pos);
        }
        RegisterMode::Char => {
            let pos = if after && caret < view.line_end(line) {
                view.next_char(caret)
            } else {
                caret
            };
            view.replace_range(pos, pos, text);
            let end = pos + text.chars().count();
            // `p` rests on the last inserted character; `P` steps back in `after`
            let rest = if after { end - 1 } else { end };
            view.set_selection(rest, rest);
        }
    }
    Ok(None)
}

fn insert(view: &mut dyn View, arg: &Argument) -> ActionResult {
    view.insert_text(text_arg(arg));
    Ok(None)
}

/// Leaving insertion puts the caret back on the last inserted character
pub(crate) fn leave_insert(view: &mut dyn View, _: &Argument) -> ActionResult {
    let caret = view.caret();
    if caret > view.line_start(view.line_of(caret)) {
        let pos = view.prev_char(caret);
        view.goto(pos);
    }
    Ok(None)
}

fn open_line(view: &mut dyn View, arg: &Argument, below: bool) -> ActionResult {
    let line = view.current_line();
    let ending = view.line_ending().as_str();
    let pos = if below {
        let pos = view.line_end(line);
        view.replace_range(pos, pos, ending);
        pos + ending.chars().count()
    } else {
        let pos = view.line_start(line);
        view.replace_range(pos, pos, ending);
        pos
    };
    view.set_selection(pos, pos);
    insert(view, arg)
}

fn toggle_case(c: char) -> String {
    if c.is_uppercase() {
        c.to_lowercase().collect()
    } else {
        c.to_uppercase().collect()
    }
}

fn join_lines(view: &mut dyn View, joins: usize) {
    for _ in 0..joins {
        let line = view.current_line();
        if line + 1 >= view.line_count() {
            break;
        }
        let end = view.line_end(line);
        let next = line + 1;
        let text_start = view.first_non_blank(next);
        let separator = if view.is_blank_line(line)
            || text_start == view.line_end(next)
            || view.char_at(end.saturating_sub(1)) == Some(' ')
            || view.char_at(text_start) == Some(')')
        {
            ""
        } else {
            " "
        };
        view.replace_range(end, text_start, separator);
        view.set_selection(end, end);
    }
}

fn scroll(placement: ScrollPlacement) -> Definition {
    Definition::new("scroll").once().action(move |view, _| {
        let line = view.current_line();
        view.scroll_to(line, placement);
        Ok(None)
    })
}

pub fn register(commands: &mut DefinitionTable) {
    // Put
    for (keycode, after) in [("p", true), ("P", false)] {
        let mut definition = Definition::new(if after { "put after" } else { "put before" })
            .before(|cmd, view, registers| {
                let name = cmd.register.unwrap_or(UNNAMED);
                let (text, mode) = registers
                    .get(name)
                    .map(|reg| (reg.text(view.line_ending()), reg.mode()))
                    .unwrap_or_default();
                Ok(Argument::Paste { text, mode })
            })
            .action(move |view, arg| put(view, arg, after));
        if !after {
            definition = definition.after(|view, arg| {
                if matches!(arg, Argument::Paste { mode: RegisterMode::Char, text } if !text.is_empty()) {
                    let pos = view.prev_char(view.caret());
                    view.goto(pos);
                }
                Ok(None)
            });
        }
        commands.insert(keycode, definition);
    }

    // Insertion
    commands.insert(
        "i",
        Definition::new("insert before caret")
            .needs(Needs::Input)
            .action(insert)
            .after(leave_insert),
    );
    commands.insert(
        "a",
        Definition::new("append after caret")
            .needs(Needs::Input)
            .action(|view, _| {
                let caret = view.caret();
                if caret < view.line_end(view.line_of(caret)) {
                    let pos = view.next_char(caret);
                    view.set_selection(pos, pos);
                }
                Ok(None)
            })
            .action(insert)
            .after(leave_insert),
    );
    commands.insert(
        "I",
        Definition::new("insert at first non-blank")
            .needs(Needs::Input)
            .action(|view, _| {
                let pos = view.first_non_blank(view.current_line());
                view.set_selection(pos, pos);
                Ok(None)
            })
            .action(insert)
            .after(leave_insert),
    );
    commands.insert(
        "A",
        Definition::new("append at end of line")
            .needs(Needs::Input)
            .action(|view, _| {
                let pos = view.line_end(view.current_line());
                view.set_selection(pos, pos);
                Ok(None)
            })
            .action(insert)
            .after(leave_insert),
    );
    commands.insert(
        "o",
        Definition::new("open line below")
            .needs(Needs::Input)
            .action(|view, arg| open_line(view, arg, true))
            .after(leave_insert),
    );
    commands.insert(
        "O",
        Definition::new("open line above")
            .needs(Needs::Input)
            .action(|view, arg| open_line(view, arg, false))
            .after(leave_insert),
    );

    // Single-character edits
    commands.insert(
        "r",
        Definition::new("replace characters")
            .needs(Needs::Char)
            .before(|cmd, view, _| {
                let caret = view.caret();
                let remaining = view.line_end(view.line_of(caret)).saturating_sub(caret);
                if cmd.count() > remaining {
                    return Err(ActionError::TooFewCharacters);
                }
                Ok(cmd.argument.clone())
            })
            .action(|view, arg| {
                let c = char_arg(arg)?;
                let caret = view.caret();
                let next = view.next_char(caret);
                view.replace_range(caret, next, c.encode_utf8(&mut [0; 4]));
                view.set_selection(caret + 1, caret + 1);
                Ok(None)
            })
            .after(|view, _| {
                let pos = view.caret().saturating_sub(1);
                view.set_selection(pos, pos);
                Ok(None)
            }),
    );
    commands.insert(
        "~",
        Definition::new("toggle case")
            .action(|view, _| {
                let caret = view.caret();
                if caret >= view.line_end(view.line_of(caret)) {
                    return Ok(None);
                }
                let next = view.next_char(caret);
                let toggled: String = view.text_range(caret, next).chars().map(toggle_case).collect();
                view.replace_range(caret, next, &toggled);
                let pos = caret + toggled.chars().count();
                view.set_selection(pos, pos);
                Ok(None)
            })
            .after(|view, _| {
                clamp_caret(view);
                Ok(None)
            }),
    );
    commands.insert(
        "J",
        with_count(Definition::new("join lines")).action(|view, arg| {
            let joins = count_arg(arg).unwrap_or(2).saturating_sub(1).max(1);
            join_lines(view, joins);
            Ok(None)
        }),
    );

    // History
    commands.insert(
        "u",
        Definition::new("undo").action(|view, _| {
            if view.undo() {
                Ok(None)
            } else {
                Err(ActionError::Failed("Already at oldest change".into()))
            }
        }),
    );
    commands.insert(
        "C-r",
        Definition::new("redo").action(|view, _| {
            if view.redo() {
                Ok(None)
            } else {
                Err(ActionError::Failed("Already at newest change".into()))
            }
        }),
    );

    // Marks and scrolling
    commands.insert(
        "m",
        Definition::new("set mark")
            .needs(Needs::Char)
            .once()
            .action(|view, arg| {
                let name = char_arg(arg)?;
                let caret = view.caret();
                view.set_mark(name, caret);
                Ok(None)
            }),
    );

    let mut z_prefixed = DefinitionTable::new();
    z_prefixed.insert("z", scroll(ScrollPlacement::Center));
    z_prefixed.insert("t", scroll(ScrollPlacement::Top));
    z_prefixed.insert("b", scroll(ScrollPlacement::Bottom));
    commands.insert(
        "z",
        Definition::new("z prefix")
            .needs(Needs::Char)
            .nested(z_prefixed),
    );
}
