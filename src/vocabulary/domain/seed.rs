//! Seed documents and the canonical tenant seed.

use super::mutation::{ApplyContext, Mutation, apply_at};
use super::{ConfigError, ConfigRow, RowKey, TenantConfiguration, VocabularyKind};
use camino::Utf8Path;
use cap_std::fs_utf8::Dir;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

const CANONICAL_SEED: &str = include_str!("canonical_seed.json");

/// Errors raised while reading a seed document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeedDocumentError {
    /// The document could not be read.
    #[error("failed to read seed document '{path}': {reason}")]
    Read {
        /// Path relative to the directory handle.
        path: String,
        /// Underlying I/O failure.
        reason: String,
    },

    /// The document is not a JSON object of row arrays.
    #[error("malformed seed document: {0}")]
    Syntax(String),

    /// The document names a kind that does not exist.
    #[error("unknown vocabulary kind '{0}' in seed document")]
    UnknownKind(String),

    /// A row is invalid or repeats a code of the document.
    #[error(transparent)]
    Row(#[from] ConfigError),
}

/// Declarative list of vocabulary rows grouped by kind.
///
/// The JSON shape is an object whose keys are kind names and whose values
/// are arrays of row payloads:
///
/// ```json
/// {"task_status": [{"code": "pending", "display_name": "Pending"}]}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SeedDocument {
    rows: Vec<ConfigRow>,
}

impl SeedDocument {
    /// Parses a seed document.
    ///
    /// Rows are returned in dependency order of their kinds, keeping
    /// document order within a kind.
    ///
    /// # Errors
    ///
    /// Returns [`SeedDocumentError::Syntax`] for malformed JSON,
    /// [`SeedDocumentError::UnknownKind`] for unknown kind names, and
    /// [`SeedDocumentError::Row`] for invalid rows or codes repeated within
    /// the document ([`ConfigError::DuplicateCode`]).
    pub fn parse(text: &str) -> Result<Self, SeedDocumentError> {
        let document: Map<String, Value> =
            serde_json::from_str(text).map_err(|err| SeedDocumentError::Syntax(err.to_string()))?;

        let mut rows = Vec::new();
        let mut seen = BTreeSet::new();
        for (name, value) in document {
            let kind = VocabularyKind::try_from(name.as_str())
                .map_err(|_| SeedDocumentError::UnknownKind(name.clone()))?;
            let Value::Array(entries) = value else {
                return Err(SeedDocumentError::Syntax(format!(
                    "'{name}' must map to an array of rows"
                )));
            };
            for entry in entries {
                let row = ConfigRow::from_payload(kind, entry)?;
                let key = row.row_key();
                if !seen.insert(key.clone()) {
                    return Err(ConfigError::DuplicateCode {
                        kind,
                        code: key.code().to_owned(),
                    }
                    .into());
                }
                rows.push(row);
            }
        }
        rows.sort_by_key(ConfigRow::kind);
        Ok(Self { rows })
    }

    /// Reads and parses a seed document through a capability-scoped
    /// directory handle.
    ///
    /// # Errors
    ///
    /// Returns [`SeedDocumentError::Read`] when the file cannot be read, or
    /// any error of [`SeedDocument::parse`].
    pub fn load(dir: &Dir, path: &Utf8Path) -> Result<Self, SeedDocumentError> {
        let text = dir
            .read_to_string(path)
            .map_err(|err| SeedDocumentError::Read {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
        Self::parse(&text)
    }

    /// Returns the canonical seed every tenant starts from.
    ///
    /// # Errors
    ///
    /// Returns [`SeedDocumentError`] if the embedded document is invalid.
    pub fn canonical() -> Result<Self, SeedDocumentError> {
        Self::parse(CANONICAL_SEED)
    }

    /// Returns the rows in application order.
    #[must_use]
    pub fn rows(&self) -> &[ConfigRow] {
        &self.rows
    }

    /// Returns one create mutation per row.
    #[must_use]
    pub fn to_mutations(&self) -> Vec<Mutation> {
        self.rows.iter().cloned().map(Mutation::create).collect()
    }
}

/// Adds the seed rows absent from `config`, one at a time.
///
/// A row is kept only when the configuration still satisfies every
/// invariant with it; existing rows are never modified. Returns the keys
/// that were added.
pub(crate) fn add_missing_rows(
    config: &mut TenantConfiguration,
    seed: &SeedDocument,
    context: &ApplyContext<'_>,
) -> Vec<RowKey> {
    let revision = config.version().next();
    let mut added = Vec::new();
    for row in seed.rows() {
        let key = row.row_key();
        if config.record(&key).is_some() {
            continue;
        }
        let mut trial = config.clone();
        if apply_at(&mut trial, &[Mutation::create(row.clone())], context, revision).is_ok() {
            *config = trial;
            added.push(key);
        }
    }
    if !added.is_empty() {
        config.set_version(revision);
    }
    added
}
