//! Error taxonomy for the interpreter.
//!
//! Grammar errors come from malformed key sequences, action errors from
//! definitions that fail while running. Neither is used for cancellation,
//! which is an ordinary [`Transition`](crate::core::grammar::Transition).

use thiserror::Error;

/// Malformed key sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("Invalid register name: {0}")]
    BadRegister(String),
    #[error("Invalid argument: {0}")]
    BadArgument(String),
    /// A register or count was given but the key that followed is unbound
    #[error("No command for {0}")]
    DanglingPrefix(String),
    #[error("Not a motion: {0}")]
    UnknownMotion(String),
    /// Second key of a multi-key command is unbound
    #[error("Unknown command: {0}")]
    UnknownSequence(String),
}

/// Failure raised by a Definition's hooks or actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Too few characters to replace")]
    TooFewCharacters,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Not an editor command: {0}")]
    NotAnEditorCommand(String),
    /// The count asks for more repetitions than an action may run
    #[error("Count too large: {0}")]
    CountTooLarge(usize),
    #[error("{0}")]
    Failed(String),
}

/// Any error the interpreter reports to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type returned by actions
pub type ActionResult = Result<Option<String>, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ActionError::TooFewCharacters.to_string(),
            "Too few characters to replace"
        );
        let err: ViError = GrammarError::DanglingPrefix("Z".into()).into();
        assert_eq!(err.to_string(), "No command for Z");
    }

    #[test]
    fn test_from_conversions() {
        let err: ViError = ActionError::NotFound("x".into()).into();
        assert!(matches!(err, ViError::Action(ActionError::NotFound(_))));
    }
}
