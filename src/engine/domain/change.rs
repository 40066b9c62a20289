//! A proposed task change and the verdict returned for it.

use crate::automation::domain::{ActionIntent, AutomationEvent, EventKind};
use crate::vocabulary::domain::{Code, ConfigVersion, TenantConfiguration, VocabularyDomainError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Key under which validated custom-field values are attached to the entity
/// snapshot presented to rules.
const CUSTOM_FIELDS_KEY: &str = "custom_fields";

/// A task mutation presented to the engine.
///
/// `before` is absent for a creation. Status codes are read from the
/// `status` key of the snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChange {
    entity_kind: String,
    before: Option<Value>,
    after: Value,
    custom_fields: Map<String, Value>,
    payload: Value,
    actor: Value,
}

impl TaskChange {
    /// Describes the creation of a task.
    #[must_use]
    pub fn created(after: Value) -> Self {
        Self {
            entity_kind: "task".to_owned(),
            before: None,
            after,
            custom_fields: Map::new(),
            payload: Value::Object(Map::new()),
            actor: Value::Object(Map::new()),
        }
    }

    /// Describes an update of an existing task.
    #[must_use]
    pub fn updated(before: Value, after: Value) -> Self {
        Self {
            before: Some(before),
            ..Self::created(after)
        }
    }

    /// Sets the entity kind custom fields are validated for.
    #[must_use]
    pub fn with_entity_kind(mut self, entity_kind: impl Into<String>) -> Self {
        self.entity_kind = entity_kind.into();
        self
    }

    /// Sets the submitted custom-field values.
    #[must_use]
    pub fn with_custom_fields(mut self, custom_fields: Map<String, Value>) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    /// Sets the transition payload (`reason`, `role`, ...).
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the acting principal.
    #[must_use]
    pub fn with_actor(mut self, actor: Value) -> Self {
        self.actor = actor;
        self
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    /// Returns the snapshot before the change, if the task existed.
    #[must_use]
    pub const fn before(&self) -> Option<&Value> {
        self.before.as_ref()
    }

    /// Returns the snapshot after the change.
    #[must_use]
    pub const fn after(&self) -> &Value {
        &self.after
    }

    /// Returns the submitted custom-field values.
    #[must_use]
    pub const fn custom_fields(&self) -> &Map<String, Value> {
        &self.custom_fields
    }

    /// Returns the transition payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the acting principal.
    #[must_use]
    pub const fn actor(&self) -> &Value {
        &self.actor
    }

    /// Returns the status before the change, if any.
    #[must_use]
    pub fn status_before(&self) -> Option<&str> {
        self.before.as_ref().and_then(status_of)
    }

    /// Returns the status after the change, if any.
    #[must_use]
    pub fn status_after(&self) -> Option<&str> {
        status_of(&self.after)
    }
}

/// Outcome of an accepted task change.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChangeVerdict {
    /// Configuration version the change was validated against.
    pub version: ConfigVersion,
    /// Custom-field values to store, defaults applied.
    pub fields: BTreeMap<String, Value>,
    /// Events derived from the change, in evaluation order.
    pub events: Vec<AutomationEvent>,
    /// Action intents of every event, concatenated in event order.
    pub intents: Vec<ActionIntent>,
}

/// Derives the events implied by `change`.
///
/// Order: `created` (creations only), `status_changed`, `stage_entered`
/// when the status moved into another stage, then one `field_changed` per
/// changed field in field-name order. Custom fields are compared on their
/// validated values.
///
/// # Errors
///
/// Returns [`VocabularyDomainError`] when a status code in a snapshot is
/// malformed.
pub fn derive_events(
    config: &TenantConfiguration,
    change: &TaskChange,
    fields: &BTreeMap<String, Value>,
    occurred_at: DateTime<Utc>,
) -> Result<Vec<AutomationEvent>, VocabularyDomainError> {
    let before = change
        .before()
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let after = with_custom_fields(change.after(), fields);
    let event = |kind: EventKind| {
        AutomationEvent::new(kind, after.clone(), occurred_at)
            .with_entity_kind(change.entity_kind())
            .with_snapshots(before.clone(), after.clone())
            .with_actor(change.actor().clone())
    };

    let mut events = Vec::new();
    if change.before().is_none() {
        events.push(event(EventKind::Created));
    }

    let status_before = change.status_before().map(Code::new).transpose()?;
    let status_after = change.status_after().map(Code::new).transpose()?;
    if status_before != status_after
        && let Some(to) = status_after
    {
        let stage_before = status_before
            .as_ref()
            .and_then(|status| config.stage_of(status.as_str()));
        let stage_after = config.stage_of(to.as_str());
        if let Some(from) = status_before {
            events.push(event(EventKind::StatusChanged {
                from,
                to: to.clone(),
            }));
        }
        if let Some(stage) = stage_after
            && stage_before.is_none_or(|previous| previous.code != stage.code)
        {
            events.push(event(EventKind::StageEntered {
                stage: stage.code.clone(),
            }));
        }
    }

    if change.before().is_some() {
        for (field, (from, to)) in changed_fields(&before, &after) {
            events.push(event(EventKind::FieldChanged { field, from, to }));
        }
    }
    Ok(events)
}

fn status_of(snapshot: &Value) -> Option<&str> {
    snapshot.get("status").and_then(Value::as_str)
}

fn with_custom_fields(snapshot: &Value, fields: &BTreeMap<String, Value>) -> Value {
    let mut entity = snapshot.as_object().cloned().unwrap_or_default();
    let custom: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    entity.insert(CUSTOM_FIELDS_KEY.to_owned(), Value::Object(custom));
    Value::Object(entity)
}

/// Returns `(from, to)` for every top-level and custom field whose value
/// differs; absent values read as `null`.
fn changed_fields(before: &Value, after: &Value) -> BTreeMap<String, (Value, Value)> {
    let mut changed = BTreeMap::new();
    collect_changes(before, after, &mut changed, |name| name != CUSTOM_FIELDS_KEY);
    let before_custom = before.get(CUSTOM_FIELDS_KEY).cloned().unwrap_or(Value::Null);
    let after_custom = after.get(CUSTOM_FIELDS_KEY).cloned().unwrap_or(Value::Null);
    collect_changes(&before_custom, &after_custom, &mut changed, |_| true);
    changed
}

fn collect_changes(
    before: &Value,
    after: &Value,
    changed: &mut BTreeMap<String, (Value, Value)>,
    include: impl Fn(&str) -> bool,
) {
    let names: BTreeSet<&String> = before
        .as_object()
        .into_iter()
        .chain(after.as_object())
        .flat_map(Map::keys)
        .filter(|name| include(name))
        .collect();
    for name in names {
        let from = before.get(name).cloned().unwrap_or(Value::Null);
        let to = after.get(name).cloned().unwrap_or(Value::Null);
        if from != to {
            changed.entry(name.clone()).or_insert((from, to));
        }
    }
}
