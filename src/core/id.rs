/// ID-based handle system for the command stack
/// A subcommand refers to its parent by handle, never by pointer
use std::fmt;

/// Unique identifier for a Command Object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub usize);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.0)
    }
}
