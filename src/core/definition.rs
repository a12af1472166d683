//! Definitions: the declarative recipes behind every keycode.
//!
//! A [`Definition`] is an ordered list of actions plus optional hooks. The
//! [`CommandObject`](crate::core::command::CommandObject) bound to it decides
//! how often each action runs and where the text they return ends up.
//! Tables are plain maps from keycode to Definition and may be edited at any
//! time; a lookup clones the Definition, so edits apply from the next key on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::command::CommandObject;
use crate::core::error::{ActionError, ActionResult};
use crate::core::register::{Numbered, RegisterMode, RegisterStore};
use crate::core::view::View;

/// Value handed to every action of a Definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Argument {
    #[default]
    None,
    Char(char),
    Text(String),
    /// The count as typed, `None` when no count was given
    Count(Option<usize>),
    /// Register content prepared for insertion
    Paste { text: String, mode: RegisterMode },
    /// The selection left by a completed motion
    Selection(MotionKind),
    /// Replacement text for the selection left by a motion
    Change { kind: MotionKind, text: String },
}

/// Input a Definition requires before it can run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Needs {
    /// One printable character
    Char,
    /// A motion, evaluated as a subcommand
    Motion,
    /// Free text terminated by the escape key
    Input,
    /// A line from the host prompt, labelled with the given text
    Prompt(String),
}

/// How the count applies to the last action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Count,
    /// Run once; the count is still available to `before`
    Once,
}

/// How a motion's selection is adjusted when it runs as a subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionKind {
    #[default]
    Exclusive,
    /// Include the character under the final caret
    Inclusive,
    /// Cover whole lines
    Linewise,
}

/// Command Object fields forced by a Definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Overrides {
    pub keycode: Option<String>,
    pub register: Option<char>,
    pub count: Option<usize>,
    pub argument: Option<Argument>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.keycode.is_none()
            && self.register.is_none()
            && self.count.is_none()
            && self.argument.is_none()
    }
}

pub type Action = Arc<dyn Fn(&mut dyn View, &Argument) -> ActionResult + Send + Sync>;
/// Argument for the actions, plus text that goes to the register ahead of
/// anything the actions return
pub type Prepared = (Argument, Option<String>);
pub type Before = Arc<
    dyn Fn(&CommandObject, &mut dyn View, &RegisterStore) -> Result<Prepared, ActionError>
        + Send
        + Sync,
>;

/// One command or motion
#[derive(Clone, Default)]
pub struct Definition {
    pub description: String,
    pub actions: Vec<Action>,
    pub before: Option<Before>,
    pub after: Option<Action>,
    pub needs: Vec<Needs>,
    pub repeat: Repeat,
    pub motion: MotionKind,
    pub overrides: Overrides,
    /// Second-key dispatch (`gg`, `zz`)
    pub nested: Option<DefinitionTable>,
    pub numbered: Option<Numbered>,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("description", &self.description)
            .field("actions", &self.actions.len())
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("needs", &self.needs)
            .field("repeat", &self.repeat)
            .field("motion", &self.motion)
            .field("overrides", &self.overrides)
            .field("nested", &self.nested)
            .field("numbered", &self.numbered)
            .finish()
    }
}

impl Definition {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn action(
        mut self,
        f: impl Fn(&mut dyn View, &Argument) -> ActionResult + Send + Sync + 'static,
    ) -> Self {
        self.actions.push(Arc::new(f));
        self
    }

    /// Hook that builds the actions' argument
    pub fn before(
        self,
        f: impl Fn(&CommandObject, &mut dyn View, &RegisterStore) -> Result<Argument, ActionError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.before_with_output(move |cmd, view, registers| Ok((f(cmd, view, registers)?, None)))
    }

    /// Like [`before`](Self::before), but the hook may also return register text
    pub fn before_with_output(
        mut self,
        f: impl Fn(&CommandObject, &mut dyn View, &RegisterStore) -> Result<Prepared, ActionError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.before = Some(Arc::new(f));
        self
    }

    pub fn after(
        mut self,
        f: impl Fn(&mut dyn View, &Argument) -> ActionResult + Send + Sync + 'static,
    ) -> Self {
        self.after = Some(Arc::new(f));
        self
    }

    pub fn needs(mut self, needs: Needs) -> Self {
        self.needs.push(needs);
        self
    }

    pub fn once(mut self) -> Self {
        self.repeat = Repeat::Once;
        self
    }

    pub fn motion(mut self, kind: MotionKind) -> Self {
        self.motion = kind;
        self
    }

    pub fn numbered(mut self, numbered: Numbered) -> Self {
        self.numbered = Some(numbered);
        self
    }

    pub fn nested(mut self, table: DefinitionTable) -> Self {
        self.nested = Some(table);
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Copy of this Definition that reports itself as `keycode`
    pub fn alias_of(&self, keycode: &str) -> Self {
        let mut alias = self.clone();
        alias.overrides.keycode = Some(keycode.to_string());
        alias
    }
}

/// Keycode → Definition map, open to runtime remapping
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
    definitions: HashMap<String, Definition>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a Definition, returning the previous one
    pub fn insert(&mut self, keycode: impl Into<String>, definition: Definition) -> Option<Definition> {
        self.definitions.insert(keycode.into(), definition)
    }

    pub fn remove(&mut self, keycode: &str) -> Option<Definition> {
        self.definitions.remove(keycode)
    }

    pub fn get(&self, keycode: &str) -> Option<&Definition> {
        self.definitions.get(keycode)
    }

    pub fn contains(&self, keycode: &str) -> bool {
        self.definitions.contains_key(keycode)
    }

    /// Bind `keycode` to a copy of `target`'s Definition. Returns false if
    /// `target` is not in this table.
    pub fn alias(&mut self, keycode: impl Into<String>, target: &str) -> bool {
        match self.definitions.get(target) {
            Some(definition) => {
                let alias = definition.alias_of(target);
                self.definitions.insert(keycode.into(), alias);
                true
            }
            None => false,
        }
    }

    /// Bound keycodes, sorted
    pub fn keycodes(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
