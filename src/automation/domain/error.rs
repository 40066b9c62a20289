//! Error types for the compact action notation.

use thiserror::Error;

/// Errors raised while parsing an [`ActionSpec`](super::ActionSpec).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionParseError {
    /// Input was empty.
    #[error("action input cannot be empty")]
    Empty,

    /// The action kind is not known.
    #[error("unknown action kind '{0}'")]
    UnknownKind(String),

    /// The input does not follow `kind(key=value, ...)`.
    #[error("malformed action '{input}': {reason}")]
    Malformed {
        /// The offending input.
        input: String,
        /// Description of the problem.
        reason: String,
    },

    /// Duplicate parameter key.
    #[error("duplicate parameter '{0}'")]
    DuplicateParameter(String),
}
