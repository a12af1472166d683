//! RopeView: a [`View`] over a ropey `Rope`.
//!
//! This is the editing surface used by the `vimode` binary and by the test
//! suite. It keeps its own selection, marks, viewport and a snapshot undo
//! history; horizontal motion steps over whole grapheme clusters.

use ropey::Rope;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::error::ActionError;
use crate::core::register::LineEnding;
use crate::core::utf8;
use crate::core::view::{ScrollPlacement, View};

/// Maximum undo stack depth to prevent OOM from unbounded undo history
const MAX_UNDO_DEPTH: usize = 1_000;

/// Text and caret captured before an undoable change
#[derive(Debug, Clone)]
struct Snapshot {
    rope: Rope,
    caret: usize,
}

#[derive(Debug)]
pub struct RopeView {
    rope: Rope,
    /// Filename (if loaded from file)
    pub filename: Option<PathBuf>,
    /// Dirty flag (true if the text has unsaved changes)
    pub modified: bool,
    anchor: usize,
    caret: usize,
    extending: bool,
    line_ending: LineEnding,
    marks: HashMap<char, usize>,
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Nesting depth of open undo groups
    group_depth: usize,
    /// Whether the open group already holds a snapshot
    group_recorded: bool,
    first_visible_line: usize,
    /// Lines on screen; `None` shows everything
    viewport_height: Option<usize>,
}

impl RopeView {
    /// Create a view from a string
    pub fn from_string(content: impl AsRef<str>) -> Self {
        let content = content.as_ref();
        Self {
            rope: Rope::from_str(content),
            filename: None,
            modified: false,
            anchor: 0,
            caret: 0,
            extending: false,
            line_ending: LineEnding::detect(content),
            marks: HashMap::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            group_depth: 0,
            group_recorded: false,
            first_visible_line: 0,
            viewport_height: None,
        }
    }

    /// Load a view from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(format!("Path is a directory, not a file: {}", path.display()).into());
        }
        let bytes = fs::read(path).map_err(|e| format!("Failed to read file: {}", e))?;
        let content = String::from_utf8_lossy(&bytes);
        let mut view = Self::from_string(&content);
        view.filename = Some(path.to_path_buf());
        Ok(view)
    }

    /// Write the text back to `filename` atomically
    pub fn save(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.filename.as_ref().ok_or("No filename set for view")?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent)?;
        for chunk in self.rope.chunks() {
            temp_file.write_all(chunk.as_bytes())?;
        }
        temp_file.flush()?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path)?;
        self.modified = false;
        Ok(())
    }

    /// Get entire content as string
    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }

    /// Text of a line without its terminator
    pub fn line_text(&self, line: usize) -> String {
        self.text_range(self.line_start(line), self.line_end(line))
    }

    /// Restrict the screen to `height` lines starting at `first`
    pub fn set_viewport(&mut self, first: usize, height: usize) {
        self.first_visible_line = first;
        self.viewport_height = Some(height.max(1));
    }

    /// Scroll just enough for the caret's line to be on screen
    pub fn ensure_caret_visible(&mut self) {
        let line = self.line_of(self.caret);
        if let Some(height) = self.viewport_height {
            if line < self.first_visible_line {
                self.first_visible_line = line;
            } else if line >= self.first_visible_line + height {
                self.first_visible_line = line + 1 - height;
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            rope: self.rope.clone(),
            caret: self.caret,
        }
    }

    fn record_undo(&mut self) {
        if self.group_depth > 0 {
            if self.group_recorded {
                return;
            }
            self.group_recorded = true;
        }
        if self.undo_stack.len() >= MAX_UNDO_DEPTH {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(self.snapshot());
        self.redo_stack.clear();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.rope = snapshot.rope;
        let caret = snapshot.caret.min(self.rope.len_chars());
        self.anchor = caret;
        self.caret = caret;
        self.modified = true;
    }

    fn line_slice(&self, line: usize) -> (usize, String) {
        let start = self.line_start(line);
        (start, self.text_range(start, self.line_end(line)))
    }
}

impl View for RopeView {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.rope.get_char(pos)
    }

    fn text_range(&self, start: usize, end: usize) -> String {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_of(&self, pos: usize) -> usize {
        self.rope.char_to_line(pos.min(self.rope.len_chars()))
    }

    fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_char(line)
    }

    fn line_end(&self, line: usize) -> usize {
        if line + 1 >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let next = self.rope.line_to_char(line + 1);
        if next >= 2 && self.char_at(next - 1) == Some('\n') && self.char_at(next - 2) == Some('\r')
        {
            next - 2
        } else {
            next.saturating_sub(1)
        }
    }

    fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn anchor(&self) -> usize {
        self.anchor
    }

    fn set_selection(&mut self, anchor: usize, caret: usize) {
        let len = self.rope.len_chars();
        self.anchor = anchor.min(len);
        self.caret = caret.min(len);
    }

    fn is_extending(&self) -> bool {
        self.extending
    }

    fn set_extending(&mut self, extending: bool) {
        self.extending = extending;
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        if start == end && text.is_empty() {
            return;
        }
        self.record_undo();
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.modified = true;

        let new_len = self.rope.len_chars();
        self.anchor = self.anchor.min(new_len);
        self.caret = self.caret.min(new_len);
    }

    fn undo(&mut self) -> bool {
        match self.undo_stack.pop_back() {
            Some(snapshot) => {
                self.redo_stack.push(self.snapshot());
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                self.undo_stack.push_back(self.snapshot());
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn begin_undo_group(&mut self) {
        if self.group_depth == 0 {
            self.group_recorded = false;
        }
        self.group_depth += 1;
    }

    fn end_undo_group(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
    }

    fn find(
        &self,
        pattern: &str,
        from: usize,
        forward: bool,
    ) -> Result<Option<(usize, usize)>, ActionError> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| ActionError::InvalidPattern(e.to_string()))?;
        let text = self.rope.to_string();
        let from_byte = self.rope.char_to_byte(from.min(self.rope.len_chars()));

        let found = if forward {
            re.find_at(&text, from_byte).or_else(|| re.find(&text))
        } else {
            let mut before = None;
            let mut last = None;
            for m in re.find_iter(&text) {
                if m.start() < from_byte {
                    before = Some(m);
                }
                last = Some(m);
            }
            before.or(last)
        };

        Ok(found.map(|m| (self.rope.byte_to_char(m.start()), self.rope.byte_to_char(m.end()))))
    }

    fn visible_lines(&self) -> (usize, usize) {
        let count = self.line_count();
        let first = self.first_visible_line.min(count.saturating_sub(1));
        let last = match self.viewport_height {
            Some(height) => (first + height).min(count) - 1,
            None => count - 1,
        };
        (first, last)
    }

    fn scroll_to(&mut self, line: usize, placement: ScrollPlacement) {
        let height = self.viewport_height.unwrap_or_else(|| self.line_count());
        self.first_visible_line = match placement {
            ScrollPlacement::Top => line,
            ScrollPlacement::Center => line.saturating_sub(height / 2),
            ScrollPlacement::Bottom => line.saturating_sub(height.saturating_sub(1)),
        };
    }

    fn set_mark(&mut self, name: char, pos: usize) {
        self.marks.insert(name, pos);
    }

    fn mark(&self, name: char) -> Option<usize> {
        self.marks
            .get(&name)
            .map(|&pos| pos.min(self.rope.len_chars()))
    }

    fn next_char(&self, pos: usize) -> usize {
        let (start, text) = self.line_slice(self.line_of(pos));
        let len = self.rope.len_chars();
        if pos < start || pos - start >= text.chars().count() {
            return (pos + 1).min(len);
        }
        start + utf8::next_grapheme_boundary(&text, pos - start)
    }

    fn prev_char(&self, pos: usize) -> usize {
        let (start, text) = self.line_slice(self.line_of(pos));
        if pos <= start {
            return pos.saturating_sub(1);
        }
        start + utf8::prev_grapheme_boundary(&text, pos - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_geometry() {
        let view = RopeView::from_string("one\ntwo\n\nfour");
        assert_eq!(view.line_count(), 4);
        assert_eq!(view.line_start(1), 4);
        assert_eq!(view.line_end(1), 7);
        assert!(view.is_blank_line(2));
        assert_eq!(view.line_end(3), 13);
        assert_eq!(view.line_text(3), "four");
    }

    #[test]
    fn test_crlf_line_end() {
        let view = RopeView::from_string("ab\r\ncd");
        assert_eq!(view.line_ending(), LineEnding::CrLf);
        assert_eq!(view.line_end(0), 2);
        assert_eq!(view.line_start(1), 4);
    }

    #[test]
    fn test_grapheme_motion() {
        let mut view = RopeView::from_string("e\u{301}x");
        assert!(view.char_right());
        assert_eq!(view.caret(), 2);
        assert!(view.char_left());
        assert_eq!(view.caret(), 0);
    }

    #[test]
    fn test_undo_group_is_one_step() {
        let mut view = RopeView::from_string("abc");
        view.begin_undo_group();
        view.replace_range(0, 1, "");
        view.replace_range(0, 1, "");
        view.end_undo_group();
        assert_eq!(view.to_string(), "c");
        assert!(view.undo());
        assert_eq!(view.to_string(), "abc");
        assert!(!view.undo());
        assert!(view.redo());
        assert_eq!(view.to_string(), "c");
    }

    #[test]
    fn test_find_wraps() {
        let view = RopeView::from_string("foo bar foo");
        assert_eq!(view.find("foo", 1, true).unwrap(), Some((8, 11)));
        assert_eq!(view.find("foo", 9, true).unwrap(), Some((0, 3)));
        assert_eq!(view.find("bar", 3, false).unwrap(), Some((4, 7)));
        assert!(view.find("(", 0, true).is_err());
    }

    #[test]
    fn test_viewport() {
        let mut view = RopeView::from_string("a\nb\nc\nd\ne");
        assert_eq!(view.visible_lines(), (0, 4));
        view.set_viewport(1, 2);
        assert_eq!(view.visible_lines(), (1, 2));
        view.set_selection(9, 9);
        view.ensure_caret_visible();
        assert_eq!(view.visible_lines(), (3, 4));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, "hello\n").unwrap();

        let mut view = RopeView::from_file(&path).unwrap();
        view.replace_range(0, 0, "> ");
        view.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "> hello\n");
        assert!(!view.modified);
    }
}
