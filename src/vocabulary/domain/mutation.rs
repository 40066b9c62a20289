//! Mutations of a tenant configuration and their application to a draft.
//!
//! Mutations are applied to a private copy of the current snapshot. Row
//! invariants are checked for every touched row, reference rules for every
//! created, activated, deactivated or deleted row, and whole-configuration
//! invariants on the final state. Only a draft that passes every check is
//! handed back for commit, so a batch either lands completely or not at all.

use super::invariants::{validate_configuration, validate_row};
use super::references::references_of;
use super::{
    ConfigError, ConfigRow, ConfigVersion, RowKey, TenantConfiguration, VocabularyKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// One change to a tenant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a new row.
    Create {
        /// The row to insert.
        row: ConfigRow,
    },
    /// Merge a JSON patch (RFC 7396) into an existing row.
    Update {
        /// Kind of the row.
        kind: VocabularyKind,
        /// Key code of the row.
        code: String,
        /// Merge patch over the row payload.
        patch: Value,
    },
    /// Soft-deactivate a row.
    Deactivate {
        /// Kind of the row.
        kind: VocabularyKind,
        /// Key code of the row.
        code: String,
    },
    /// Re-activate a soft-deactivated row.
    Activate {
        /// Kind of the row.
        kind: VocabularyKind,
        /// Key code of the row.
        code: String,
    },
    /// Hard-delete an unreferenced row.
    Delete {
        /// Kind of the row.
        kind: VocabularyKind,
        /// Key code of the row.
        code: String,
    },
}

impl Mutation {
    /// Builds a [`Mutation::Create`].
    #[must_use]
    pub fn create(row: impl Into<ConfigRow>) -> Self {
        Self::Create { row: row.into() }
    }

    /// Builds a [`Mutation::Update`].
    #[must_use]
    pub fn update(kind: VocabularyKind, code: impl Into<String>, patch: Value) -> Self {
        Self::Update {
            kind,
            code: code.into(),
            patch,
        }
    }

    /// Builds a [`Mutation::Deactivate`].
    #[must_use]
    pub fn deactivate(kind: VocabularyKind, code: impl Into<String>) -> Self {
        Self::Deactivate {
            kind,
            code: code.into(),
        }
    }

    /// Builds a [`Mutation::Activate`].
    #[must_use]
    pub fn activate(kind: VocabularyKind, code: impl Into<String>) -> Self {
        Self::Activate {
            kind,
            code: code.into(),
        }
    }

    /// Builds a [`Mutation::Delete`].
    #[must_use]
    pub fn delete(kind: VocabularyKind, code: impl Into<String>) -> Self {
        Self::Delete {
            kind,
            code: code.into(),
        }
    }

    /// Returns the key of the row the mutation addresses.
    #[must_use]
    pub fn target(&self) -> RowKey {
        match self {
            Self::Create { row } => row.row_key(),
            Self::Update { kind, code, .. }
            | Self::Deactivate { kind, code }
            | Self::Activate { kind, code }
            | Self::Delete { kind, code } => RowKey::normalized(*kind, code),
        }
    }
}

/// Inputs shared by every mutation of one commit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ApplyContext<'a> {
    /// Timestamp recorded on touched rows.
    pub now: DateTime<Utc>,
    /// Upper bound of an automation rule's action list.
    pub max_actions_per_rule: usize,
    /// Keys that historical business rows cite; deleting them is refused.
    pub cited: &'a BTreeSet<RowKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Touch {
    Created,
    Updated,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    Deactivated,
    Deleted,
}

#[derive(Debug, Default)]
struct ChangeSet {
    touched: BTreeMap<RowKey, Touch>,
    released: BTreeMap<RowKey, Release>,
}

impl ChangeSet {
    fn touch(&mut self, key: RowKey, touch: Touch) {
        self.released.remove(&key);
        let merged = match (self.touched.get(&key), touch) {
            (Some(Touch::Created), _) => Touch::Created,
            (Some(Touch::Activated), Touch::Updated) => Touch::Activated,
            _ => touch,
        };
        self.touched.insert(key, merged);
    }

    fn release(&mut self, key: RowKey, release: Release) {
        if release == Release::Deleted {
            self.touched.remove(&key);
        }
        self.released.insert(key, release);
    }
}

/// Applies `mutations` to a copy of `base` and returns the validated draft
/// stamped with the next version.
pub(crate) fn apply_mutations(
    base: &TenantConfiguration,
    mutations: &[Mutation],
    context: &ApplyContext<'_>,
) -> Result<TenantConfiguration, ConfigError> {
    let revision = base.version().next();
    let mut draft = base.clone();
    apply_at(&mut draft, mutations, context, revision)?;
    draft.set_version(revision);
    Ok(draft)
}

/// Applies and validates `mutations` in place without changing the version.
pub(crate) fn apply_at(
    draft: &mut TenantConfiguration,
    mutations: &[Mutation],
    context: &ApplyContext<'_>,
    revision: ConfigVersion,
) -> Result<(), ConfigError> {
    let mut changes = ChangeSet::default();
    for mutation in mutations {
        apply_one(draft, mutation, context, revision, &mut changes)?;
    }

    for (key, touch) in &changes.touched {
        let Some(record) = draft.record(key) else {
            continue;
        };
        validate_row(record.row(), context.max_actions_per_rule)?;
        check_outgoing(draft, record.row(), *touch)?;
    }
    for (key, release) in &changes.released {
        check_incoming(draft, key, *release, context.cited)?;
    }
    validate_configuration(draft)
}

fn apply_one(
    draft: &mut TenantConfiguration,
    mutation: &Mutation,
    context: &ApplyContext<'_>,
    revision: ConfigVersion,
    changes: &mut ChangeSet,
) -> Result<(), ConfigError> {
    let key = mutation.target();
    let missing = || ConfigError::not_found(key.kind(), key.code());

    match mutation {
        Mutation::Create { row } => {
            if draft.record(&key).is_some() {
                return Err(duplicate(row));
            }
            draft.insert(row.clone(), context.now, revision);
            changes.touch(key, Touch::Created);
        }
        Mutation::Update { patch, .. } => {
            let record = draft.record_mut(&key).ok_or_else(missing)?;
            let was_active = record.is_active();
            let row = patched_row(record.row(), patch)?;
            if row.row_key() != key {
                return Err(ConfigError::invalid(
                    key.kind(),
                    format!("'{}' cannot be renamed; create a new row instead", key.code()),
                ));
            }
            let now_active = row.is_active();
            record.replace_row(row, context.now, revision);
            match (was_active, now_active) {
                (true, false) => changes.release(key, Release::Deactivated),
                (false, true) => changes.touch(key, Touch::Activated),
                _ => changes.touch(key, Touch::Updated),
            }
        }
        Mutation::Deactivate { .. } | Mutation::Activate { .. } => {
            if key.kind().is_edge() {
                return Err(ConfigError::invalid(
                    key.kind(),
                    "transitions are removed, not deactivated",
                ));
            }
            let active = matches!(mutation, Mutation::Activate { .. });
            let record = draft.record_mut(&key).ok_or_else(missing)?;
            if record.is_active() == active {
                return Ok(());
            }
            record.set_active(active, context.now, revision);
            if active {
                changes.touch(key, Touch::Activated);
            } else {
                changes.release(key, Release::Deactivated);
            }
        }
        Mutation::Delete { .. } => {
            draft.remove(&key).ok_or_else(missing)?;
            changes.release(key, Release::Deleted);
        }
    }
    Ok(())
}

fn duplicate(row: &ConfigRow) -> ConfigError {
    match row {
        ConfigRow::StatusTransition(edge) => ConfigError::DuplicateEdge {
            from: edge.from.to_string(),
            to: edge.to.to_string(),
        },
        _ => ConfigError::DuplicateCode {
            kind: row.kind(),
            code: row.key_code(),
        },
    }
}

fn patched_row(row: &ConfigRow, patch: &Value) -> Result<ConfigRow, ConfigError> {
    let kind = row.kind();
    let Value::Object(patch_map) = patch else {
        return Err(ConfigError::invalid(kind, "update patch must be a JSON object"));
    };
    let mut payload = row.to_payload()?;
    merge_patch(&mut payload, patch);
    let patched = ConfigRow::from_payload(kind, payload)?;

    let stored = patched.to_payload()?;
    if let Some(unknown) = patch_map
        .keys()
        .find(|name| stored.get(name.as_str()).is_none())
    {
        return Err(ConfigError::invalid(
            kind,
            format!("unknown attribute '{unknown}'"),
        ));
    }
    Ok(patched)
}

/// RFC 7396 JSON merge patch.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (name, value) in patch_map {
            if value.is_null() {
                target_map.remove(name);
            } else {
                merge_patch(target_map.entry(name.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn check_outgoing(
    config: &TenantConfiguration,
    row: &ConfigRow,
    touch: Touch,
) -> Result<(), ConfigError> {
    let enforce_active = row.is_active() && touch != Touch::Updated;
    for reference in references_of(row) {
        let target = reference.target;
        let exists = config.record(&target).is_some();
        let usable = exists && (!reference.require_active || !enforce_active || config.is_active(&target));
        if usable {
            continue;
        }
        if row.kind().is_edge() {
            return Err(ConfigError::UnknownStatus(target.code().to_owned()));
        }
        return Err(ConfigError::not_found(target.kind(), target.code()));
    }

    if let ConfigRow::StatusTransition(edge) = row
        && touch == Touch::Created
        && config
            .row::<super::TaskStatus>(edge.from.as_str())
            .is_some_and(|status| status.is_terminal)
    {
        return Err(ConfigError::TerminalViolation(edge.from.to_string()));
    }
    Ok(())
}

fn check_incoming(
    config: &TenantConfiguration,
    key: &RowKey,
    release: Release,
    cited: &BTreeSet<RowKey>,
) -> Result<(), ConfigError> {
    let in_use = |referenced_by: String| ConfigError::InUse {
        kind: key.kind(),
        code: key.code().to_owned(),
        referenced_by,
    };

    if release == Release::Deleted && cited.contains(key) {
        return Err(in_use("historical records".to_owned()));
    }

    for record in config.records() {
        let blocking = references_of(record.row()).into_iter().any(|reference| {
            reference.target == *key
                && match release {
                    Release::Deleted => true,
                    Release::Deactivated => reference.blocks_deactivation && record.is_active(),
                }
        });
        if blocking {
            return Err(in_use(record.key().to_string()));
        }
    }
    Ok(())
}
