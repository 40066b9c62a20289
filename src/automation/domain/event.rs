//! Events presented to the rule engine.

use crate::vocabulary::domain::Code;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// What happened to the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The entity was created.
    Created,
    /// The entity's status changed.
    StatusChanged {
        /// Previous status.
        from: Code,
        /// New status.
        to: Code,
    },
    /// A field changed value.
    FieldChanged {
        /// Field name.
        field: String,
        /// Previous value; `null` when unset.
        from: Value,
        /// New value; `null` when cleared.
        to: Value,
    },
    /// The entity entered a stage.
    StageEntered {
        /// Entered stage.
        stage: Code,
    },
    /// A scheduled tick of the given cron expression.
    ScheduledTick {
        /// Cron expression that fired.
        schedule: String,
    },
}

impl EventKind {
    /// Returns the snake-case name of the event kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged { .. } => "status_changed",
            Self::FieldChanged { .. } => "field_changed",
            Self::StageEntered { .. } => "stage_entered",
            Self::ScheduledTick { .. } => "scheduled_tick",
        }
    }
}

/// An event together with the entity snapshots it concerns.
///
/// `entity` is the current snapshot; `before` and `after` are the snapshots
/// around the change (both default to empty objects).
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationEvent {
    kind: EventKind,
    entity_kind: String,
    entity: Value,
    before: Value,
    after: Value,
    actor: Value,
    occurred_at: DateTime<Utc>,
}

impl AutomationEvent {
    /// Creates an event for an entity of kind `task`.
    #[must_use]
    pub fn new(kind: EventKind, entity: Value, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            entity_kind: "task".to_owned(),
            entity,
            before: Value::Object(Map::new()),
            after: Value::Object(Map::new()),
            actor: Value::Object(Map::new()),
            occurred_at,
        }
    }

    /// Sets the entity kind.
    #[must_use]
    pub fn with_entity_kind(mut self, entity_kind: impl Into<String>) -> Self {
        self.entity_kind = entity_kind.into();
        self
    }

    /// Sets the snapshots before and after the change.
    #[must_use]
    pub fn with_snapshots(mut self, before: Value, after: Value) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    /// Sets the acting principal.
    #[must_use]
    pub fn with_actor(mut self, actor: Value) -> Self {
        self.actor = actor;
        self
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    /// Returns the entity snapshot.
    #[must_use]
    pub const fn entity(&self) -> &Value {
        &self.entity
    }

    /// Returns the snapshot before the change.
    #[must_use]
    pub const fn before(&self) -> &Value {
        &self.before
    }

    /// Returns the snapshot after the change.
    #[must_use]
    pub const fn after(&self) -> &Value {
        &self.after
    }

    /// Returns the acting principal.
    #[must_use]
    pub const fn actor(&self) -> &Value {
        &self.actor
    }

    /// Returns when the event occurred.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the `event` document conditions and templates read:
    /// `type`, `entity_kind`, `occurred_at` plus the kind's own fields
    /// (`from`/`to`, `field`, `stage` or `schedule`).
    #[must_use]
    pub fn document(&self) -> Value {
        let mut document = match serde_json::to_value(&self.kind) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        document.insert("type".to_owned(), json!(self.kind.name()));
        document.insert("entity_kind".to_owned(), json!(self.entity_kind));
        document.insert(
            "occurred_at".to_owned(),
            json!(self.occurred_at.to_rfc3339()),
        );
        Value::Object(document)
    }
}
