//! Errors raised while evaluating transitions.

use thiserror::Error;

/// Structured description of a rejected transition precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardFailure {
    /// Source status code.
    pub from: String,
    /// Target status code.
    pub to: String,
    /// The failing predicate: the guard source, or `requires_reason`,
    /// `required_field:<name>` or `requires_role:<role>`.
    pub predicate: String,
    /// Why the predicate failed.
    pub reason: String,
}

/// Errors returned by transition checks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// An endpoint is not a known (or, for targets, active) status.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    /// The source status is terminal.
    #[error("terminal status '{0}' has no outgoing transitions")]
    TerminalViolation(String),

    /// A precondition of the edge failed.
    #[error("transition '{}' -> '{}' refused by {}: {}", .0.from, .0.to, .0.predicate, .0.reason)]
    GuardFailed(GuardFailure),
}
