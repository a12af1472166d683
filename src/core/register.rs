//! Register Store: named text slots shared by every document.
//!
//! Text is kept in a canonical form (`\n` line breaks, no trailing break for
//! line-mode content) and expanded to the reader's line ending on the way out,
//! so a register cut from a CRLF document pastes correctly into an LF one.

use std::collections::HashMap;

/// Maximum size of a single register (10 MB)
const MAX_REGISTER_SIZE: usize = 10 * 1024 * 1024;

/// Default register for unqualified reads and writes
pub const UNNAMED: char = '"';
/// Writes to this register are discarded
pub const BLACK_HOLE: char = '_';

/// Whether register content is a character run or a sequence of whole lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterMode {
    #[default]
    Char,
    Line,
}

/// Line terminator convention of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    /// Guess the convention from the first terminator in `text`
    pub fn detect(text: &str) -> Self {
        match text.find(['\r', '\n']) {
            Some(idx) if text[idx..].starts_with("\r\n") => LineEnding::CrLf,
            Some(idx) if text[idx..].starts_with('\r') => LineEnding::Cr,
            _ => LineEnding::Lf,
        }
    }
}

/// How a write participates in the numbered registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbered {
    /// Stored in register `0`
    Yank,
    /// Pushed onto the `1`..`9` ring
    Delete,
}

/// Replace every line terminator with `\n`
fn canonicalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// A single register.
///
/// The content is only reachable through accessors: `text` re-expands line
/// breaks, `set_text` and `append` re-infer the mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    text: String,
    mode: RegisterMode,
}

impl Register {
    pub fn new(text: &str) -> Self {
        let mut register = Self::default();
        register.set_text(text);
        register
    }

    pub fn mode(&self) -> RegisterMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.mode == RegisterMode::Char
    }

    /// Stored text in canonical form
    pub fn canonical_text(&self) -> &str {
        &self.text
    }

    /// Content using `ending` as line terminator; line-mode content ends with
    /// exactly one terminator
    pub fn text(&self, ending: LineEnding) -> String {
        let mut text = self.text.replace('\n', ending.as_str());
        if self.mode == RegisterMode::Line {
            text.push_str(ending.as_str());
        }
        text
    }

    /// Replace content, inferring the mode from embedded terminators
    pub fn set_text(&mut self, text: &str) {
        let mut canonical = canonicalize(text);
        if canonical.contains('\n') {
            self.mode = RegisterMode::Line;
            if canonical.ends_with('\n') {
                canonical.pop();
            }
        } else {
            self.mode = RegisterMode::Char;
        }
        self.text = canonical;
    }

    /// Append content; if either side is line-mode the result is the two
    /// line sequences joined
    pub fn append(&mut self, text: &str) {
        let incoming = Register::new(text);
        if self.is_empty() {
            *self = incoming;
            return;
        }
        if self.mode == RegisterMode::Line || incoming.mode == RegisterMode::Line {
            self.text.push('\n');
            self.text.push_str(&incoming.text);
            self.mode = RegisterMode::Line;
        } else {
            self.text.push_str(&incoming.text);
        }
    }
}

/// Process-wide register storage
#[derive(Debug, Clone, Default)]
pub struct RegisterStore {
    registers: HashMap<char, Register>,
}

/// Uppercase names alias their lowercase register
fn canonical_name(name: char) -> char {
    if name.is_ascii_uppercase() {
        name.to_ascii_lowercase()
    } else {
        name
    }
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look at a register without creating it
    pub fn get(&self, name: char) -> Option<&Register> {
        self.registers.get(&canonical_name(name))
    }

    /// Read a register, creating it empty on first access
    pub fn read(&mut self, name: char, ending: LineEnding) -> (String, RegisterMode) {
        let register = self.registers.entry(canonical_name(name)).or_default();
        (register.text(ending), register.mode())
    }

    /// Write a register: uppercase names append, `_` discards, everything
    /// else replaces. Oversized text is rejected.
    pub fn write(&mut self, name: char, text: &str) {
        if name == BLACK_HOLE || text.len() > MAX_REGISTER_SIZE {
            return;
        }
        if name.is_ascii_uppercase() {
            self.append(name, text);
            return;
        }
        tracing::trace!(target: "vi.registers", register = %name, len = text.len(), "write");
        self.registers.entry(name).or_default().set_text(text);
    }

    /// Append to a register (the lowercase register for uppercase names)
    pub fn append(&mut self, name: char, text: &str) {
        if name == BLACK_HOLE {
            return;
        }
        let name = canonical_name(name);
        let register = self.registers.entry(name).or_default();
        if register.canonical_text().len() + text.len() > MAX_REGISTER_SIZE {
            return;
        }
        tracing::trace!(target: "vi.registers", register = %name, len = text.len(), "append");
        register.append(text);
    }

    /// Push text onto the numbered ring: 8→9, …, 1→2, then store into 1.
    /// Register 9's previous content is discarded; register 0 is untouched.
    pub fn shift(&mut self, text: &str) {
        for slot in (1..9u32).rev() {
            let from = char::from_digit(slot, 10);
            let to = char::from_digit(slot + 1, 10);
            if let (Some(from), Some(to)) = (from, to) {
                match self.registers.remove(&from) {
                    Some(register) => {
                        self.registers.insert(to, register);
                    }
                    None => {
                        self.registers.remove(&to);
                    }
                }
            }
        }
        self.registers.insert('1', Register::new(text));
    }

    /// Store the text produced by one command.
    ///
    /// `target` is the register named by the command (`None` for unnamed).
    /// Unqualified writes feed the numbered registers according to
    /// `numbered`; the unnamed register always mirrors the result.
    pub fn record(&mut self, target: Option<char>, text: &str, numbered: Option<Numbered>) {
        let target = target.unwrap_or(UNNAMED);
        if target == BLACK_HOLE || text.len() > MAX_REGISTER_SIZE {
            return;
        }

        if target == UNNAMED {
            match numbered {
                Some(Numbered::Yank) => self.write('0', text),
                Some(Numbered::Delete) => self.shift(text),
                None => {}
            }
            self.write(UNNAMED, text);
        } else {
            self.write(target, text);
            let mirror = self
                .registers
                .get(&canonical_name(target))
                .cloned()
                .unwrap_or_default();
            self.registers.insert(UNNAMED, mirror);
        }
    }

    /// Names of all registers created so far, sorted
    pub fn names(&self) -> Vec<char> {
        let mut names: Vec<char> = self.registers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
