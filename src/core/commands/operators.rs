use super::editing::leave_insert;
use super::{clamp_caret, count_arg, text_arg, with_count};
use crate::core::command::CommandObject;
use crate::core::definition::{Argument, Definition, DefinitionTable, MotionKind, Needs};
use crate::core::register::Numbered;
use crate::core::view::View;

fn selection_of(cmd: &CommandObject) -> Argument {
    Argument::Selection(cmd.motion_kind().unwrap_or_default())
}

fn kind_of(arg: &Argument) -> MotionKind {
    match arg {
        Argument::Selection(kind) | Argument::Change { kind, .. } => *kind,
        _ => MotionKind::Exclusive,
    }
}

/// Remove the selection and return its text
pub(crate) fn cut(view: &mut dyn View, kind: MotionKind) -> String {
    let text = match kind {
        MotionKind::Linewise => view.delete_selected_lines(),
        _ => view.delete_selection(),
    };
    clamp_caret(view);
    text
}

/// Return the selected text and collapse onto its start
pub(crate) fn copy(view: &mut dyn View, kind: MotionKind) -> String {
    let text = match kind {
        MotionKind::Linewise => view.selected_lines(),
        _ => view.selected_text(),
    };
    let (start, _) = view.selection_range();
    view.set_selection(start, start);
    text
}

/// Replace the selection with `text`. Whole lines leave one empty line behind
/// to type into.
pub(crate) fn change(view: &mut dyn View, kind: MotionKind, text: &str) -> String {
    let removed = match kind {
        MotionKind::Linewise => {
            let removed = view.selected_lines();
            let (start, end) = view.selection_range();
            let ending = view.line_ending().as_str();
            let keep = if view.text_range(start, end).ends_with(ending) {
                ending
            } else {
                ""
            };
            view.replace_range(start, end, keep);
            view.set_selection(start, start);
            removed
        }
        _ => view.delete_selection(),
    };
    view.insert_text(text);
    removed
}

/// First and last line touched by the selection
pub(crate) fn selected_line_span(view: &dyn View) -> (usize, usize) {
    let (start, end) = view.selection_range();
    let first = view.line_of(start);
    let last = if end > start {
        view.line_of(end - 1)
    } else {
        first
    };
    (first, last.max(first))
}

/// Indent (`right`) or outdent lines `first..=last` by `width` columns
pub(crate) fn shift_lines(view: &mut dyn View, first: usize, last: usize, width: usize, right: bool) {
    for line in first..=last {
        let start = view.line_start(line);
        if right {
            if !view.is_blank_line(line) {
                view.replace_range(start, start, &" ".repeat(width));
            }
            continue;
        }
        let line_end = view.line_end(line);
        let mut end = start;
        let mut columns = 0;
        while end < line_end && columns < width {
            match view.char_at(end) {
                Some(' ') => columns += 1,
                Some('\t') => columns = width,
                _ => break,
            }
            end += 1;
        }
        view.replace_range(start, end, "");
    }
    let pos = view.first_non_blank(first);
    view.set_selection(pos, pos);
}

/// `cw` on a word stops at the end of the word, like `ce`
fn trim_change_word(cmd: &CommandObject, view: &mut dyn View) {
    let motion = cmd.subcommand.as_ref().map(|sub| sub.keycode.as_str());
    if motion != Some("w") {
        return;
    }
    let (anchor, mut caret) = (view.anchor(), view.caret());
    if !view.char_at(anchor).is_some_and(|c| !c.is_whitespace()) {
        return;
    }
    while caret > anchor && view.char_at(caret - 1).is_some_and(char::is_whitespace) {
        caret -= 1;
    }
    view.set_selection(anchor, caret);
}

/// Lines `current..current+n` as register text
fn lines_text(view: &dyn View, n: usize) -> String {
    let first = view.current_line();
    let last = first
        .saturating_add(n.max(1) - 1)
        .min(view.line_count().saturating_sub(1));
    let start = view.line_start(first);
    let end = if last + 1 < view.line_count() {
        view.line_start(last + 1)
    } else {
        view.len_chars()
    };
    let mut text = view.text_range(start, end);
    let ending = view.line_ending().as_str();
    if !text.ends_with(ending) {
        text.push_str(ending);
    }
    text
}

pub fn register(commands: &mut DefinitionTable, shift_width: usize) {
    commands.insert(
        "d",
        Definition::new("delete")
            .needs(Needs::Motion)
            .numbered(Numbered::Delete)
            .before(|cmd, _, _| Ok(selection_of(cmd)))
            .action(|view, arg| Ok(Some(cut(view, kind_of(arg))))),
    );
    commands.insert(
        "y",
        Definition::new("yank")
            .needs(Needs::Motion)
            .numbered(Numbered::Yank)
            .before(|cmd, _, _| Ok(selection_of(cmd)))
            .action(|view, arg| Ok(Some(copy(view, kind_of(arg))))),
    );
    commands.insert(
        "c",
        Definition::new("change")
            .needs(Needs::Motion)
            .needs(Needs::Input)
            .numbered(Numbered::Delete)
            .before(|cmd, view, _| {
                trim_change_word(cmd, view);
                Ok(Argument::Change {
                    kind: cmd.motion_kind().unwrap_or_default(),
                    text: text_arg(&cmd.argument).to_string(),
                })
            })
            .action(|view, arg| Ok(Some(change(view, kind_of(arg), text_arg(arg)))))
            .after(leave_insert),
    );
    for (keycode, right) in [(">", true), ("<", false)] {
        commands.insert(
            keycode,
            Definition::new(if right { "indent" } else { "outdent" })
                .needs(Needs::Motion)
                .before(|cmd, _, _| Ok(selection_of(cmd)))
                .action(move |view, _| {
                    let (first, last) = selected_line_span(view);
                    shift_lines(view, first, last, shift_width, right);
                    Ok(None)
                }),
        );
    }

    commands.insert(
        "x",
        Definition::new("delete character")
            .numbered(Numbered::Delete)
            .action(|view, _| {
                let caret = view.caret();
                let end = view.line_end(view.line_of(caret));
                if caret >= end {
                    return Ok(None);
                }
                let next = view.next_char(caret).min(end);
                let text = view.text_range(caret, next);
                view.replace_range(caret, next, "");
                Ok(Some(text))
            })
            .after(|view, _| {
                clamp_caret(view);
                Ok(None)
            }),
    );
    commands.insert(
        "X",
        Definition::new("delete character before").numbered(Numbered::Delete).action(|view, _| {
            let caret = view.caret();
            let start = view.line_start(view.line_of(caret));
            if caret <= start {
                return Ok(None);
            }
            let prev = view.prev_char(caret).max(start);
            let text = view.text_range(prev, caret);
            view.replace_range(prev, caret, "");
            view.set_selection(prev, prev);
            Ok(Some(text))
        }),
    );
    commands.insert(
        "D",
        with_count(Definition::new("delete to end of line"))
            .numbered(Numbered::Delete)
            .action(|view, arg| {
                let caret = view.caret();
                let line = view.line_of(caret);
                let n = count_arg(arg).unwrap_or(1).max(1);
                let last = line
                    .saturating_add(n - 1)
                    .min(view.line_count().saturating_sub(1));
                let end = view.line_end(last);
                let text = view.text_range(caret, end);
                view.replace_range(caret, end, "");
                Ok(Some(text))
            })
            .after(|view, _| {
                clamp_caret(view);
                Ok(None)
            }),
    );
    commands.insert(
        "C",
        Definition::new("change to end of line")
            .needs(Needs::Input)
            .once()
            .numbered(Numbered::Delete)
            .before(|cmd, _, _| {
                Ok(Argument::Change {
                    kind: MotionKind::Exclusive,
                    text: text_arg(&cmd.argument).to_string(),
                })
            })
            .action(|view, arg| {
                let caret = view.caret();
                let end = view.line_end(view.line_of(caret));
                view.set_selection(caret, end);
                Ok(Some(change(view, MotionKind::Exclusive, text_arg(arg))))
            })
            .after(leave_insert),
    );
    commands.insert(
        "Y",
        with_count(Definition::new("yank lines"))
            .numbered(Numbered::Yank)
            .action(|view, arg| Ok(Some(lines_text(view, count_arg(arg).unwrap_or(1))))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rope_view::RopeView;

    #[test]
    fn test_shift_lines() {
        let mut view = RopeView::from_string("a\n\n  b\n\tc");
        shift_lines(&mut view, 0, 1, 2, true);
        assert_eq!(view.to_string(), "  a\n\n  b\n\tc");
        shift_lines(&mut view, 2, 3, 2, false);
        assert_eq!(view.to_string(), "  a\n\nb\nc");
    }

    #[test]
    fn test_change_linewise_keeps_line() {
        let mut view = RopeView::from_string("one\ntwo\nthree");
        view.set_selection(4, 8);
        let removed = change(&mut view, MotionKind::Linewise, "new");
        assert_eq!(removed, "two\n");
        assert_eq!(view.to_string(), "one\nnew\nthree");
    }

    #[test]
    fn test_lines_text_terminates_last_line() {
        let view = RopeView::from_string("a\nb");
        assert_eq!(lines_text(&view, 5), "a\nb\n");
    }

    #[test]
    fn test_selected_line_span() {
        let mut view = RopeView::from_string("a\nb\nc\n");
        view.set_selection(0, 4);
        assert_eq!(selected_line_span(&view), (0, 1));
        view.set_selection(2, 2);
        assert_eq!(selected_line_span(&view), (1, 1));
    }
}
