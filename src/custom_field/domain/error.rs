//! Errors returned by custom-field validation.

use super::FieldKind;
use thiserror::Error;

/// Verdict of a rejected custom-field payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldValidationError {
    /// A required field has no value and no default.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A submitted field is not declared for the entity kind (strict mode).
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// The value's JSON type does not fit the field kind.
    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Field code.
        field: String,
        /// Declared kind.
        expected: FieldKind,
        /// Description of the submitted value.
        found: String,
    },

    /// The value has the right type but breaks a constraint.
    #[error("field '{field}' violates a constraint: {reason}")]
    ConstraintViolation {
        /// Field code.
        field: String,
        /// Description of the violated constraint.
        reason: String,
    },

    /// The external reference resolver did not answer before the deadline.
    #[error("reference check for field '{field}' timed out after {timeout_ms} ms")]
    ResolverTimeout {
        /// Field code.
        field: String,
        /// Deadline that expired.
        timeout_ms: u64,
    },

    /// The external reference resolver failed.
    #[error("reference check for field '{field}' failed: {reason}")]
    ResolverFailed {
        /// Field code.
        field: String,
        /// Resolver error message.
        reason: String,
    },
}
