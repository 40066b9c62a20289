//! Identifier and validated scalar types for tenant vocabularies.

use super::{VocabularyDomainError, VocabularyKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a vocabulary code, matching the `VARCHAR(100)` column.
const MAX_CODE_LENGTH: usize = 100;

/// Maximum length for a tenant identifier, matching the `VARCHAR(255)` column.
const MAX_TENANT_LENGTH: usize = 255;

/// Opaque, non-empty tenant identifier.
///
/// Every engine operation takes one explicitly; there is no ambient tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a validated tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`VocabularyDomainError::EmptyTenantId`] when the value is
    /// blank, or [`VocabularyDomainError::TenantIdTooLong`] when it exceeds
    /// 255 bytes.
    pub fn new(value: impl Into<String>) -> Result<Self, VocabularyDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VocabularyDomainError::EmptyTenantId);
        }
        if trimmed.len() > MAX_TENANT_LENGTH {
            return Err(VocabularyDomainError::TenantIdTooLong(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated vocabulary code.
///
/// Codes are trimmed and lowercased. Only `[a-z0-9_-]` is accepted and the
/// first character must be alphanumeric, so `in_progress` and `follow-up`
/// are valid while `In Progress` and `_draft` are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Creates a validated code.
    ///
    /// # Errors
    ///
    /// Returns [`VocabularyDomainError::EmptyCode`] for blank input,
    /// [`VocabularyDomainError::CodeTooLong`] beyond 100 characters, or
    /// [`VocabularyDomainError::InvalidCode`] for characters outside
    /// `[a-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, VocabularyDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(VocabularyDomainError::EmptyCode);
        }
        if normalized.len() > MAX_CODE_LENGTH {
            return Err(VocabularyDomainError::CodeTooLong(raw));
        }

        let starts_alphanumeric = normalized
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        let is_valid = starts_alphanumeric
            && normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

        if !is_valid {
            return Err(VocabularyDomainError::InvalidCode(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Code {
    type Error = VocabularyDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Code {
    type Error = VocabularyDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Code> for String {
    fn from(value: Code) -> Self {
        value.0
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Code {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Code {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic configuration version of a tenant.
///
/// Every committed mutation produces the next version; the first commit (the
/// seed) is version 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigVersion(u64);

impl ConfigVersion {
    /// Version of a tenant that has never been written.
    pub const UNWRITTEN: Self = Self(0);

    /// Version assigned to a tenant's first commit.
    pub const INITIAL: Self = Self(1);

    /// Wraps a raw version number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the version that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Storage key of a vocabulary row: `(kind, code)` within a tenant.
///
/// Most kinds use their code directly. Lead subsources are keyed
/// `parent/code` and status transitions `from->to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    kind: VocabularyKind,
    code: String,
}

impl RowKey {
    /// Creates a row key.
    #[must_use]
    pub fn new(kind: VocabularyKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }

    /// Builds a key from caller input.
    ///
    /// Codes are stored lowercase, so addressing is case-insensitive and
    /// ignores surrounding whitespace (per endpoint for `from->to` keys).
    #[must_use]
    pub fn normalized(kind: VocabularyKind, code: &str) -> Self {
        let normalized = if kind.is_edge() {
            code.split("->")
                .map(|part| part.trim().to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join("->")
        } else {
            code.trim().to_ascii_lowercase()
        };
        Self::new(kind, normalized)
    }

    /// Returns the key for a status transition edge.
    #[must_use]
    pub fn transition(from: &Code, to: &Code) -> Self {
        Self::new(VocabularyKind::StatusTransition, format!("{from}->{to}"))
    }

    /// Returns the key for a lead subsource under its parent source.
    #[must_use]
    pub fn subsource(parent: &Code, code: &Code) -> Self {
        Self::new(VocabularyKind::LeadSubSource, format!("{parent}/{code}"))
    }

    /// Returns the vocabulary kind.
    #[must_use]
    pub const fn kind(&self) -> VocabularyKind {
        self.kind
    }

    /// Returns the key code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.code)
    }
}
