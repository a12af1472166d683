//! Host surfaces consumed by the interpreter.
//!
//! [`View`] is the editing surface every action receives as its first
//! argument. Hosts implement the required methods over their own buffer and
//! selection; the provided methods (character, word, line, paragraph and
//! sentence motions, brace matching, selection helpers) are written in terms
//! of them and may be overridden when the host has native equivalents.
//!
//! Positions are character offsets. The selection is `anchor..caret` in
//! either order. While the view is *extending*, motions move only the caret;
//! otherwise they collapse the selection onto the caret.

use crate::core::error::ActionError;
use crate::core::register::LineEnding;

/// Where to place a line when scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPlacement {
    Top,
    Center,
    Bottom,
}

/// Character classes used by word motions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Punct,
}

fn class_of(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

fn matching_brace(c: char) -> Option<(char, bool)> {
    match c {
        '(' => Some((')', true)),
        '[' => Some((']', true)),
        '{' => Some(('}', true)),
        ')' => Some(('(', false)),
        ']' => Some(('[', false)),
        '}' => Some(('{', false)),
        _ => None,
    }
}

/// Host editing surface
pub trait View {
    // ==================== Text queries ====================

    fn len_chars(&self) -> usize;
    fn char_at(&self, pos: usize) -> Option<char>;
    fn text_range(&self, start: usize, end: usize) -> String;
    /// Number of lines, at least 1
    fn line_count(&self) -> usize;
    fn line_of(&self, pos: usize) -> usize;
    fn line_start(&self, line: usize) -> usize;
    /// Position of the line's terminator, or the end of text on the last line
    fn line_end(&self, line: usize) -> usize;
    fn line_ending(&self) -> LineEnding;

    // ==================== Selection ====================

    fn caret(&self) -> usize;
    fn anchor(&self) -> usize;
    fn set_selection(&mut self, anchor: usize, caret: usize);
    fn is_extending(&self) -> bool;
    fn set_extending(&mut self, extending: bool);

    // ==================== Mutation ====================

    fn replace_range(&mut self, start: usize, end: usize, text: &str);
    fn undo(&mut self) -> bool;
    fn redo(&mut self) -> bool;
    fn begin_undo_group(&mut self) {}
    fn end_undo_group(&mut self) {}

    // ==================== Host facilities ====================

    /// Regex search starting at `from`; returns the match as `start..end`
    fn find(
        &self,
        pattern: &str,
        from: usize,
        forward: bool,
    ) -> Result<Option<(usize, usize)>, ActionError>;
    /// First and last line currently on screen
    fn visible_lines(&self) -> (usize, usize);
    fn scroll_to(&mut self, line: usize, placement: ScrollPlacement);
    fn set_mark(&mut self, name: char, pos: usize);
    fn mark(&self, name: char) -> Option<usize>;

    // ==================== Provided ====================

    /// Move the caret, keeping the anchor only while extending
    fn goto(&mut self, pos: usize) {
        let pos = pos.min(self.len_chars());
        if self.is_extending() {
            let anchor = self.anchor();
            self.set_selection(anchor, pos);
        } else {
            self.set_selection(pos, pos);
        }
    }

    fn current_line(&self) -> usize {
        self.line_of(self.caret())
    }

    fn column(&self) -> usize {
        let caret = self.caret();
        caret - self.line_start(self.line_of(caret))
    }

    fn is_blank_line(&self, line: usize) -> bool {
        self.line_start(line) == self.line_end(line)
    }

    /// Last position the caret may rest on in `line` outside of extension
    fn last_char_of_line(&self, line: usize) -> usize {
        let start = self.line_start(line);
        self.line_end(line).saturating_sub(1).max(start)
    }

    fn first_non_blank(&self, line: usize) -> usize {
        let mut pos = self.line_start(line);
        let end = self.line_end(line);
        while pos < end && self.char_at(pos).is_some_and(|c| c == ' ' || c == '\t') {
            pos += 1;
        }
        pos
    }

    /// Position after the character (cluster) at `pos`
    fn next_char(&self, pos: usize) -> usize {
        (pos + 1).min(self.len_chars())
    }

    /// Position of the character (cluster) before `pos`
    fn prev_char(&self, pos: usize) -> usize {
        pos.saturating_sub(1)
    }

    fn char_left(&mut self) -> bool {
        let caret = self.caret();
        let start = self.line_start(self.line_of(caret));
        if caret <= start {
            return false;
        }
        let pos = self.prev_char(caret).max(start);
        self.goto(pos);
        true
    }

    fn char_right(&mut self) -> bool {
        let caret = self.caret();
        let line = self.line_of(caret);
        let limit = if self.is_extending() {
            self.line_end(line)
        } else {
            self.last_char_of_line(line)
        };
        if caret >= limit {
            return false;
        }
        let pos = self.next_char(caret).min(limit);
        self.goto(pos);
        true
    }

    fn goto_line(&mut self, line: usize) {
        let line = line.min(self.line_count().saturating_sub(1));
        let pos = self.first_non_blank(line);
        self.goto(pos);
    }

    fn line_down(&mut self) -> bool {
        let line = self.current_line();
        if line + 1 >= self.line_count() {
            return false;
        }
        let column = self.column();
        let target = line + 1;
        let pos = (self.line_start(target) + column).min(self.last_char_of_line(target));
        self.goto(pos);
        true
    }

    fn line_up(&mut self) -> bool {
        let line = self.current_line();
        if line == 0 {
            return false;
        }
        let column = self.column();
        let target = line - 1;
        let pos = (self.line_start(target) + column).min(self.last_char_of_line(target));
        self.goto(pos);
        true
    }

    /// Start of the next word (`w`)
    fn word_right(&mut self) -> bool {
        let len = self.len_chars();
        let origin = self.caret();
        if origin >= len {
            return false;
        }
        let origin_line = self.line_of(origin);
        let mut pos = origin;

        let start_class = self.char_at(pos).map(class_of);
        if start_class != Some(CharClass::Space) {
            while pos < len && self.char_at(pos).map(class_of) == start_class {
                pos += 1;
            }
        }
        while pos < len {
            if !self.char_at(pos).is_some_and(char::is_whitespace) {
                break;
            }
            let line = self.line_of(pos);
            if line != origin_line && self.line_start(line) == pos && self.line_end(line) == pos {
                break;
            }
            pos += 1;
        }

        // An operator stops at the end of the line it started on
        if self.is_extending() && self.line_of(pos) != origin_line {
            pos = self.line_end(origin_line).max(origin);
        }
        self.goto(pos);
        pos != origin
    }

    /// Start of the previous word (`b`)
    fn word_left(&mut self) -> bool {
        let origin = self.caret();
        if origin == 0 {
            return false;
        }
        let mut pos = origin - 1;
        while pos > 0 && self.char_at(pos).is_some_and(char::is_whitespace) {
            pos -= 1;
        }
        let class = self.char_at(pos).map(class_of);
        while pos > 0 && self.char_at(pos - 1).map(class_of) == class {
            pos -= 1;
        }
        self.goto(pos);
        true
    }

    /// End of the current or next word (`e`)
    fn word_end(&mut self) -> bool {
        let len = self.len_chars();
        let origin = self.caret();
        if origin + 1 >= len {
            return false;
        }
        let mut pos = origin + 1;
        while pos < len && self.char_at(pos).is_some_and(char::is_whitespace) {
            pos += 1;
        }
        let class = self.char_at(pos).map(class_of);
        while pos + 1 < len && self.char_at(pos + 1).map(class_of) == class {
            pos += 1;
        }
        self.goto(pos.min(len.saturating_sub(1)));
        true
    }

    /// Next blank line after the current paragraph (`}`)
    fn paragraph_down(&mut self) -> bool {
        let count = self.line_count();
        let mut line = self.current_line();
        while line < count && self.is_blank_line(line) {
            line += 1;
        }
        while line < count && !self.is_blank_line(line) {
            line += 1;
        }
        let pos = if line < count {
            self.line_start(line)
        } else {
            self.line_end(count - 1)
        };
        let moved = pos != self.caret();
        self.goto(pos);
        moved
    }

    /// Previous blank line before the current paragraph (`{`)
    fn paragraph_up(&mut self) -> bool {
        let mut line = self.current_line();
        while line > 0 && self.is_blank_line(line) {
            line -= 1;
        }
        while line > 0 && !self.is_blank_line(line) {
            line -= 1;
        }
        let pos = self.line_start(line);
        let moved = pos != self.caret();
        self.goto(pos);
        moved
    }

    /// Start of the next sentence (`)`)
    fn sentence_forward(&mut self) -> bool {
        let len = self.len_chars();
        let origin = self.caret();
        let mut pos = origin;
        while pos < len {
            let c = self.char_at(pos);
            pos += 1;
            if matches!(c, Some('.' | '!' | '?'))
                && self.char_at(pos).is_none_or(char::is_whitespace)
            {
                break;
            }
        }
        while pos < len && self.char_at(pos).is_some_and(char::is_whitespace) {
            pos += 1;
        }
        self.goto(pos);
        pos != origin
    }

    /// Start of the current or previous sentence (`(`)
    fn sentence_backward(&mut self) -> bool {
        let origin = self.caret();
        if origin == 0 {
            return false;
        }
        let mut pos = origin - 1;
        while pos > 0 && self.char_at(pos).is_some_and(char::is_whitespace) {
            pos -= 1;
        }
        while pos > 0 {
            let prev = self.char_at(pos - 1);
            if matches!(prev, Some('.' | '!' | '?'))
                && self.char_at(pos).is_some_and(char::is_whitespace)
            {
                break;
            }
            pos -= 1;
        }
        while pos < origin && self.char_at(pos).is_some_and(char::is_whitespace) {
            pos += 1;
        }
        self.goto(pos);
        true
    }

    /// Bracket matching the one at or after `pos` on its line (`%`)
    fn match_brace(&self, pos: usize) -> Option<usize> {
        let line_end = self.line_end(self.line_of(pos));
        let mut start = pos;
        while start < line_end && self.char_at(start).and_then(matching_brace).is_none() {
            start += 1;
        }
        let open = self.char_at(start)?;
        let (close, forward) = matching_brace(open)?;

        let mut depth = 0usize;
        if forward {
            let len = self.len_chars();
            for p in start..len {
                match self.char_at(p) {
                    Some(c) if c == open => depth += 1,
                    Some(c) if c == close => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(p);
                        }
                    }
                    _ => {}
                }
            }
        } else {
            for p in (0..=start).rev() {
                match self.char_at(p) {
                    Some(c) if c == open => depth += 1,
                    Some(c) if c == close => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(p);
                        }
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// Ordered selection bounds
    fn selection_range(&self) -> (usize, usize) {
        let (anchor, caret) = (self.anchor(), self.caret());
        (anchor.min(caret), anchor.max(caret))
    }

    fn selected_text(&self) -> String {
        let (start, end) = self.selection_range();
        self.text_range(start, end)
    }

    /// Remove the selection, returning its text
    fn delete_selection(&mut self) -> String {
        let (start, end) = self.selection_range();
        let text = self.text_range(start, end);
        self.replace_range(start, end, "");
        self.set_selection(start, start);
        text
    }

    /// Insert at the caret, leaving the caret after the text
    fn insert_text(&mut self, text: &str) {
        let pos = self.caret();
        self.replace_range(pos, pos, text);
        let after = pos + text.chars().count();
        self.set_selection(after, after);
    }

    /// Grow the selection to cover whole lines including the last terminator
    fn expand_selection_to_lines(&mut self) {
        let (start, end) = self.selection_range();
        let first = self.line_of(start);
        let last = self.line_of(end);
        let start = self.line_start(first);
        let end = if last + 1 < self.line_count() {
            self.line_start(last + 1)
        } else {
            self.len_chars()
        };
        self.set_selection(start, end);
    }

    /// Text of a whole-line selection, always ending in a terminator
    fn selected_lines(&self) -> String {
        let mut text = self.selected_text();
        let ending = self.line_ending().as_str();
        if !text.ends_with(ending) {
            text.push_str(ending);
        }
        text
    }

    /// Remove a whole-line selection and return it terminated.
    ///
    /// When the selection reaches the unterminated last line, the terminator
    /// before it is removed instead so no empty line is left behind.
    fn delete_selected_lines(&mut self) -> String {
        let text = self.selected_lines();
        let (mut start, end) = self.selection_range();
        let first = self.line_of(start);
        let ending = self.line_ending().as_str();
        if end == self.len_chars() && first > 0 && !self.selected_text().ends_with(ending) {
            start = self.line_end(first - 1);
        }
        self.replace_range(start, end, "");
        let line = self.line_of(start.min(self.len_chars()));
        let caret = self.first_non_blank(line);
        self.set_selection(caret, caret);
        text
    }
}

/// Host UI surface: status output and single-line prompt
pub trait Ui {
    fn status(&mut self, text: &str);
    /// Open the host's line input; completion is reported back through
    /// [`Dispatcher::prompt_closed`](crate::core::dispatcher::Dispatcher::prompt_closed)
    fn open_prompt(&mut self, label: &str);
    fn close_prompt(&mut self) {}
}
