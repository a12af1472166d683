//! Motion Definitions.
//!
//! Every motion moves the caret. Run on its own it collapses the selection;
//! run as an operator's subcommand the view is extending, so the selection
//! grows from the original caret and the motion's [`MotionKind`] decides how
//! the operator sees it.

use std::sync::{Arc, Mutex, PoisonError};

use super::{char_arg, count_arg, text_arg, with_count};
use crate::core::definition::{Argument, Definition, DefinitionTable, MotionKind, Needs};
use crate::core::error::{ActionError, ActionResult};
use crate::core::view::View;

/// Direction and landing rule of an in-line character search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindKind {
    /// `f`
    Forward,
    /// `F`
    Backward,
    /// `t`
    TillForward,
    /// `T`
    TillBackward,
}

impl FindKind {
    fn reversed(self) -> Self {
        match self {
            FindKind::Forward => FindKind::Backward,
            FindKind::Backward => FindKind::Forward,
            FindKind::TillForward => FindKind::TillBackward,
            FindKind::TillBackward => FindKind::TillForward,
        }
    }
}

type LastFind = Arc<Mutex<Option<(char, FindKind)>>>;
type LastSearch = Arc<Mutex<Option<(String, bool)>>>;

/// Move to `target` on the caret's line.
///
/// For `t`/`T` an adjacent match is skipped so repeats advance.
pub fn find_in_line(view: &mut dyn View, target: char, kind: FindKind) -> ActionResult {
    let caret = view.caret();
    let line = view.line_of(caret);
    let (start, end) = (view.line_start(line), view.line_end(line));
    let is_target = |p: &usize| view.char_at(*p) == Some(target);

    let found = match kind {
        FindKind::Forward => (caret + 1..end).find(is_target),
        FindKind::Backward => (start..caret).rev().find(is_target),
        FindKind::TillForward => {
            let from = if view.char_at(caret + 1) == Some(target) {
                caret + 2
            } else {
                caret + 1
            };
            (from..end).find(is_target).map(|p| p - 1)
        }
        FindKind::TillBackward => {
            let upto = if caret > start && view.char_at(caret - 1) == Some(target) {
                caret - 1
            } else {
                caret
            };
            (start..upto).rev().find(is_target).map(|p| p + 1)
        }
    };

    match found {
        Some(pos) => {
            view.goto(pos);
            Ok(None)
        }
        None => Err(ActionError::NotFound(target.to_string())),
    }
}

fn search(view: &mut dyn View, pattern: &str, forward: bool) -> ActionResult {
    let caret = view.caret();
    let from = if forward {
        (caret + 1).min(view.len_chars())
    } else {
        caret
    };
    match view.find(pattern, from, forward)? {
        Some((start, _)) => {
            view.goto(start);
            Ok(None)
        }
        None => Err(ActionError::NotFound(pattern.to_string())),
    }
}

fn simple(description: &str, step: fn(&mut dyn View) -> bool) -> Definition {
    Definition::new(description).action(move |view, _| {
        step(view);
        Ok(None)
    })
}

fn finder(description: &str, kind: FindKind, last: &LastFind) -> Definition {
    let last = last.clone();
    let motion = match kind {
        FindKind::Forward | FindKind::TillForward => MotionKind::Inclusive,
        FindKind::Backward | FindKind::TillBackward => MotionKind::Exclusive,
    };
    Definition::new(description)
        .needs(Needs::Char)
        .motion(motion)
        .action(move |view, arg| {
            let target = char_arg(arg)?;
            *last.lock().unwrap_or_else(PoisonError::into_inner) = Some((target, kind));
            find_in_line(view, target, kind)
        })
}

fn repeat_find(description: &str, reverse: bool, last: &LastFind) -> Definition {
    let last = last.clone();
    Definition::new(description)
        .motion(MotionKind::Inclusive)
        .action(move |view, _| {
            let previous = *last.lock().unwrap_or_else(PoisonError::into_inner);
            match previous {
                Some((target, kind)) => {
                    let kind = if reverse { kind.reversed() } else { kind };
                    find_in_line(view, target, kind)
                }
                None => Err(ActionError::Failed("No previous character search".into())),
            }
        })
}

fn searcher(description: &str, label: &str, forward: bool, last: &LastSearch) -> Definition {
    let last = last.clone();
    Definition::new(description)
        .needs(Needs::Prompt(label.to_string()))
        .action(move |view, arg| {
            let pattern = text_arg(arg);
            if pattern.is_empty() {
                return Ok(None);
            }
            *last.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((pattern.to_string(), forward));
            search(view, pattern, forward)
        })
}

fn repeat_search(description: &str, reverse: bool, last: &LastSearch) -> Definition {
    let last = last.clone();
    Definition::new(description).action(move |view, _| {
        let previous = last.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match previous {
            Some((pattern, forward)) => search(view, &pattern, forward != reverse),
            None => Err(ActionError::Failed("No previous regular expression".into())),
        }
    })
}

fn jump_to_mark(view: &mut dyn View, arg: &Argument, linewise: bool) -> ActionResult {
    let name = char_arg(arg)?;
    let pos = view
        .mark(name)
        .ok_or_else(|| ActionError::NotFound(format!("mark {}", name)))?;
    if linewise {
        let line = view.line_of(pos.min(view.len_chars()));
        let target = view.first_non_blank(line);
        view.goto(target);
    } else {
        view.goto(pos);
    }
    Ok(None)
}

/// Line `n` lines below `line`, where `n` is the count minus one
fn lines_below(view: &dyn View, line: usize, arg: &Argument) -> usize {
    let n = count_arg(arg).unwrap_or(1).max(1);
    line.saturating_add(n - 1)
        .min(view.line_count().saturating_sub(1))
}

pub fn register(motions: &mut DefinitionTable) {
    let last_find: LastFind = Arc::new(Mutex::new(None));
    let last_search: LastSearch = Arc::new(Mutex::new(None));

    // Character and line steps
    motions.insert("h", simple("character left", |v| v.char_left()));
    motions.insert("l", simple("character right", |v| v.char_right()));
    motions.insert(
        "j",
        simple("line down", |v| v.line_down()).motion(MotionKind::Linewise),
    );
    motions.insert(
        "k",
        simple("line up", |v| v.line_up()).motion(MotionKind::Linewise),
    );
    motions.insert(
        "+",
        simple("first non-blank of next line", |v| {
            let line = v.current_line();
            if line + 1 >= v.line_count() {
                return false;
            }
            let pos = v.first_non_blank(line + 1);
            v.goto(pos);
            true
        })
        .motion(MotionKind::Linewise),
    );
    motions.insert(
        "-",
        simple("first non-blank of previous line", |v| {
            let line = v.current_line();
            if line == 0 {
                return false;
            }
            let pos = v.first_non_blank(line - 1);
            v.goto(pos);
            true
        })
        .motion(MotionKind::Linewise),
    );

    // Words, sentences, paragraphs
    motions.insert("w", simple("word forward", |v| v.word_right()));
    motions.insert("b", simple("word backward", |v| v.word_left()));
    motions.insert(
        "e",
        simple("end of word", |v| v.word_end()).motion(MotionKind::Inclusive),
    );
    motions.insert("}", simple("paragraph forward", |v| v.paragraph_down()));
    motions.insert("{", simple("paragraph backward", |v| v.paragraph_up()));
    motions.insert(")", simple("sentence forward", |v| v.sentence_forward()));
    motions.insert("(", simple("sentence backward", |v| v.sentence_backward()));

    // Within the line
    motions.insert(
        "0",
        simple("start of line", |v| {
            let pos = v.line_start(v.current_line());
            v.goto(pos);
            true
        })
        .once(),
    );
    motions.insert(
        "^",
        simple("first non-blank", |v| {
            let pos = v.first_non_blank(v.current_line());
            v.goto(pos);
            true
        })
        .once(),
    );
    motions.insert(
        "$",
        with_count(Definition::new("end of line"))
            .motion(MotionKind::Inclusive)
            .action(|view, arg| {
                let line = lines_below(view, view.current_line(), arg);
                let pos = view.last_char_of_line(line);
                view.goto(pos);
                Ok(None)
            }),
    );
    motions.insert(
        "%",
        Definition::new("matching bracket")
            .once()
            .motion(MotionKind::Inclusive)
            .action(|view, _| {
                let pos = view
                    .match_brace(view.caret())
                    .ok_or_else(|| ActionError::NotFound("matching bracket".into()))?;
                view.goto(pos);
                Ok(None)
            }),
    );

    // Whole-line targets
    motions.insert(
        "_",
        with_count(Definition::new("current line"))
            .motion(MotionKind::Linewise)
            .action(|view, arg| {
                let line = lines_below(view, view.current_line(), arg);
                view.goto_line(line);
                Ok(None)
            }),
    );
    motions.insert(
        "G",
        with_count(Definition::new("go to line (default last)"))
            .motion(MotionKind::Linewise)
            .action(|view, arg| {
                let line = match count_arg(arg) {
                    Some(n) => n.saturating_sub(1),
                    None => view.line_count().saturating_sub(1),
                };
                view.goto_line(line);
                Ok(None)
            }),
    );

    let mut g_prefixed = DefinitionTable::new();
    g_prefixed.insert(
        "g",
        with_count(Definition::new("go to line (default first)"))
            .motion(MotionKind::Linewise)
            .action(|view, arg| {
                let line = count_arg(arg).unwrap_or(1).saturating_sub(1);
                view.goto_line(line);
                Ok(None)
            }),
    );
    motions.insert(
        "g",
        Definition::new("g prefix")
            .needs(Needs::Char)
            .nested(g_prefixed),
    );

    // Screen-relative
    motions.insert(
        "H",
        with_count(Definition::new("top of screen"))
            .motion(MotionKind::Linewise)
            .action(|view, arg| {
                let (top, bottom) = view.visible_lines();
                let line = lines_below(view, top, arg).min(bottom);
                view.goto_line(line);
                Ok(None)
            }),
    );
    motions.insert(
        "M",
        Definition::new("middle of screen")
            .once()
            .motion(MotionKind::Linewise)
            .action(|view, _| {
                let (top, bottom) = view.visible_lines();
                view.goto_line(top + (bottom - top) / 2);
                Ok(None)
            }),
    );
    motions.insert(
        "L",
        with_count(Definition::new("bottom of screen"))
            .motion(MotionKind::Linewise)
            .action(|view, arg| {
                let (top, bottom) = view.visible_lines();
                let n = count_arg(arg).unwrap_or(1).max(1);
                let line = bottom.saturating_sub(n - 1).max(top);
                view.goto_line(line);
                Ok(None)
            }),
    );

    // Character search
    motions.insert("f", finder("find character", FindKind::Forward, &last_find));
    motions.insert("F", finder("find character backward", FindKind::Backward, &last_find));
    motions.insert("t", finder("till character", FindKind::TillForward, &last_find));
    motions.insert("T", finder("till character backward", FindKind::TillBackward, &last_find));
    motions.insert(";", repeat_find("repeat character search", false, &last_find));
    motions.insert(",", repeat_find("reverse character search", true, &last_find));

    // Pattern search
    motions.insert("/", searcher("search forward", "/", true, &last_search));
    motions.insert("?", searcher("search backward", "?", false, &last_search));
    motions.insert("n", repeat_search("next match", false, &last_search));
    motions.insert("N", repeat_search("previous match", true, &last_search));

    // Marks
    motions.insert(
        "`",
        Definition::new("jump to mark")
            .needs(Needs::Char)
            .once()
            .action(|view, arg| jump_to_mark(view, arg, false)),
    );
    motions.insert(
        "'",
        Definition::new("jump to mark line")
            .needs(Needs::Char)
            .once()
            .motion(MotionKind::Linewise)
            .action(|view, arg| jump_to_mark(view, arg, true)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rope_view::RopeView;

    #[test]
    fn test_find_in_line() {
        let mut view = RopeView::from_string("a,b,c\nx,y");
        find_in_line(&mut view, ',', FindKind::Forward).unwrap();
        assert_eq!(view.caret(), 1);
        find_in_line(&mut view, ',', FindKind::Forward).unwrap();
        assert_eq!(view.caret(), 3);
        assert!(find_in_line(&mut view, ',', FindKind::Forward).is_err());
        assert_eq!(view.caret(), 3);
        find_in_line(&mut view, 'a', FindKind::TillBackward).unwrap();
        assert_eq!(view.caret(), 1);
    }

    #[test]
    fn test_till_repeats_advance() {
        let mut view = RopeView::from_string("ab.c.d");
        find_in_line(&mut view, '.', FindKind::TillForward).unwrap();
        assert_eq!(view.caret(), 1);
        find_in_line(&mut view, '.', FindKind::TillForward).unwrap();
        assert_eq!(view.caret(), 3);
    }

    #[test]
    fn test_table_has_core_motions() {
        let mut motions = DefinitionTable::new();
        register(&mut motions);
        for key in ["h", "j", "k", "l", "w", "b", "e", "0", "$", "G", "g", "_", "f", "/"] {
            assert!(motions.contains(key), "missing {key}");
        }
        assert_eq!(motions.get("j").unwrap().motion, MotionKind::Linewise);
        assert_eq!(motions.get("e").unwrap().motion, MotionKind::Inclusive);
    }
}
