//! Crate-level error type and its tagged taxonomy.
//!
//! Each bounded context raises its own `thiserror` enum; services surface
//! them through [`CustomizationError`], whose [`ErrorKind`] tag is what
//! callers branch on.

use crate::automation::ports::RuleHealthError;
use crate::custom_field::domain::FieldValidationError;
use crate::vocabulary::domain::{
    ConfigError, ConfigVersion, SeedDocumentError, VocabularyDomainError,
};
use crate::vocabulary::ports::ConfigRepositoryError;
use crate::workflow::domain::TransitionError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type of every fallible engine operation.
pub type CustomizationResult<T> = Result<T, CustomizationError>;

/// Tagged error kinds exposed across the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Referenced code or row absent.
    NotFound,
    /// Unique-code violation.
    DuplicateCode,
    /// Invariant violation or malformed input.
    InvalidConfig,
    /// Row referenced elsewhere.
    InUse,
    /// Transition endpoint is not a known status.
    UnknownStatus,
    /// Transition leaves a terminal status.
    TerminalViolation,
    /// Transition edge already exists.
    DuplicateEdge,
    /// Transition precondition failed.
    GuardFailed,
    /// No edge connects the requested statuses.
    TransitionNotAllowed,
    /// Required custom field absent.
    MissingField,
    /// Custom field not declared.
    UnknownField,
    /// Custom-field value of the wrong type.
    TypeMismatch,
    /// Custom-field value breaks a constraint.
    ConstraintViolation,
    /// External resolver missed its deadline.
    ResolverTimeout,
    /// Another writer committed first.
    VersionStale,
    /// The caller cancelled the operation.
    Cancelled,
    /// Bug or persistence failure.
    Internal,
}

impl ErrorKind {
    /// Returns the tag name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::DuplicateCode => "DuplicateCode",
            Self::InvalidConfig => "InvalidConfig",
            Self::InUse => "InUse",
            Self::UnknownStatus => "UnknownStatus",
            Self::TerminalViolation => "TerminalViolation",
            Self::DuplicateEdge => "DuplicateEdge",
            Self::GuardFailed => "GuardFailed",
            Self::TransitionNotAllowed => "TransitionNotAllowed",
            Self::MissingField => "MissingField",
            Self::UnknownField => "UnknownField",
            Self::TypeMismatch => "TypeMismatch",
            Self::ConstraintViolation => "ConstraintViolation",
            Self::ResolverTimeout => "ResolverTimeout",
            Self::VersionStale => "VersionStale",
            Self::Cancelled => "Cancelled",
            Self::Internal => "Internal",
        }
    }

    /// Returns whether the caller may retry: after refetching for
    /// `VersionStale`, at most once for `Internal`.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::VersionStale | Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by engine services.
#[derive(Debug, Error)]
pub enum CustomizationError {
    /// A tenant id, code or kind name failed validation.
    #[error(transparent)]
    Domain(#[from] VocabularyDomainError),

    /// A configuration mutation was refused.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A seed document could not be read or parsed.
    #[error(transparent)]
    Seed(#[from] SeedDocumentError),

    /// A transition check failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The requested statuses are not connected by an edge.
    #[error("transition '{from}' -> '{to}' is not allowed")]
    TransitionNotAllowed {
        /// Source status code.
        from: String,
        /// Target status code.
        to: String,
    },

    /// A custom-field payload was rejected.
    #[error(transparent)]
    Field(#[from] FieldValidationError),

    /// The configuration repository failed or refused the commit.
    #[error(transparent)]
    Repository(#[from] ConfigRepositoryError),

    /// The rule-health store failed.
    #[error(transparent)]
    RuleHealth(#[from] RuleHealthError),

    /// The version pinned by the caller is no longer current.
    #[error("pinned configuration version {pinned} is stale; current is {current}")]
    PinnedVersionStale {
        /// Version the caller pinned.
        pinned: ConfigVersion,
        /// Version currently committed.
        current: ConfigVersion,
    },

    /// The caller's cancellation signal fired.
    #[error("operation cancelled")]
    Cancelled,
}

impl CustomizationError {
    /// Returns the tagged kind of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_)
            | Self::Seed(
                SeedDocumentError::Read { .. }
                | SeedDocumentError::Syntax(_)
                | SeedDocumentError::UnknownKind(_),
            ) => ErrorKind::InvalidConfig,
            Self::Config(err) | Self::Seed(SeedDocumentError::Row(err)) => config_kind(err),
            Self::Transition(err) => match err {
                TransitionError::UnknownStatus(_) => ErrorKind::UnknownStatus,
                TransitionError::TerminalViolation(_) => ErrorKind::TerminalViolation,
                TransitionError::GuardFailed(_) => ErrorKind::GuardFailed,
            },
            Self::TransitionNotAllowed { .. } => ErrorKind::TransitionNotAllowed,
            Self::Field(err) => match err {
                FieldValidationError::MissingField(_) => ErrorKind::MissingField,
                FieldValidationError::UnknownField(_) => ErrorKind::UnknownField,
                FieldValidationError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
                FieldValidationError::ConstraintViolation { .. } => {
                    ErrorKind::ConstraintViolation
                }
                FieldValidationError::ResolverTimeout { .. } => ErrorKind::ResolverTimeout,
                FieldValidationError::ResolverFailed { .. } => ErrorKind::Internal,
            },
            Self::Repository(ConfigRepositoryError::VersionStale { .. })
            | Self::PinnedVersionStale { .. } => ErrorKind::VersionStale,
            Self::Repository(ConfigRepositoryError::Persistence(_)) | Self::RuleHealth(_) => {
                ErrorKind::Internal
            }
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns whether the caller may retry the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

const fn config_kind(err: &ConfigError) -> ErrorKind {
    match err {
        ConfigError::NotFound { .. } => ErrorKind::NotFound,
        ConfigError::DuplicateCode { .. } => ErrorKind::DuplicateCode,
        ConfigError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        ConfigError::InUse { .. } => ErrorKind::InUse,
        ConfigError::UnknownStatus(_) => ErrorKind::UnknownStatus,
        ConfigError::TerminalViolation(_) => ErrorKind::TerminalViolation,
        ConfigError::DuplicateEdge { .. } => ErrorKind::DuplicateEdge,
    }
}
