//! Error types for vocabulary construction and configuration invariants.

use super::VocabularyKind;
use thiserror::Error;

/// Errors returned while constructing vocabulary values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VocabularyDomainError {
    /// The tenant identifier is empty after trimming.
    #[error("tenant identifier must not be empty")]
    EmptyTenantId,

    /// The tenant identifier exceeds the storage limit.
    #[error("tenant identifier '{0}' exceeds 255 bytes")]
    TenantIdTooLong(String),

    /// The code is empty after trimming.
    #[error("code must not be empty")]
    EmptyCode,

    /// The code exceeds the storage limit.
    #[error("code '{0}' exceeds 100 characters")]
    CodeTooLong(String),

    /// The code contains characters outside `[a-z0-9_-]`.
    #[error("invalid code '{0}', expected lowercase letters, digits, '_' or '-'")]
    InvalidCode(String),

    /// The vocabulary kind name is not recognised.
    #[error("unknown vocabulary kind: {0}")]
    UnknownKind(String),
}

/// Invariant and reference violations raised while mutating a tenant
/// configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The addressed or referenced row does not exist (or is inactive where
    /// an active row is required).
    #[error("{kind} '{code}' not found")]
    NotFound {
        /// Kind of the missing row.
        kind: VocabularyKind,
        /// Key code of the missing row.
        code: String,
    },

    /// A row with the same code already exists, active or not.
    #[error("{kind} '{code}' already exists")]
    DuplicateCode {
        /// Kind of the duplicated row.
        kind: VocabularyKind,
        /// Duplicated key code.
        code: String,
    },

    /// The change violates a configuration invariant.
    #[error("invalid {kind} configuration: {reason}")]
    InvalidConfig {
        /// Kind whose invariant was violated.
        kind: VocabularyKind,
        /// Human-readable description of the violation.
        reason: String,
    },

    /// The row is referenced elsewhere and cannot be removed or deactivated.
    #[error("{kind} '{code}' is in use by {referenced_by}")]
    InUse {
        /// Kind of the referenced row.
        kind: VocabularyKind,
        /// Key code of the referenced row.
        code: String,
        /// Description of the referencing row.
        referenced_by: String,
    },

    /// A transition endpoint names a status that does not exist.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    /// The transition would leave a terminal status.
    #[error("terminal status '{0}' cannot have outgoing transitions")]
    TerminalViolation(String),

    /// An edge with the same endpoints already exists.
    #[error("transition '{from}' -> '{to}' already exists")]
    DuplicateEdge {
        /// Source status code.
        from: String,
        /// Target status code.
        to: String,
    },
}

impl ConfigError {
    /// Builds a [`ConfigError::InvalidConfig`] for the given kind.
    #[must_use]
    pub fn invalid(kind: VocabularyKind, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            kind,
            reason: reason.into(),
        }
    }

    /// Builds a [`ConfigError::NotFound`] for the given kind and code.
    #[must_use]
    pub fn not_found(kind: VocabularyKind, code: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            code: code.into(),
        }
    }
}

