//! Read-only view of a tenant's status graph.

use super::{GuardFailure, StatusTransition, TransitionError};
use crate::automation::expression::Scope;
use crate::vocabulary::domain::{TaskStatus, TenantConfiguration};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Task snapshot and transition payload a guard is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionContext {
    entity: Value,
    payload: Value,
}

impl Default for TransitionContext {
    fn default() -> Self {
        Self {
            entity: Value::Object(Map::new()),
            payload: Value::Object(Map::new()),
        }
    }
}

impl TransitionContext {
    /// Creates a context from the task snapshot and the transition payload.
    #[must_use]
    pub const fn new(entity: Value, payload: Value) -> Self {
        Self { entity, payload }
    }

    /// Returns the task snapshot.
    #[must_use]
    pub const fn entity(&self) -> &Value {
        &self.entity
    }

    /// Returns the transition payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Adjacency view over the statuses and edges of one configuration snapshot.
#[derive(Debug, Clone)]
pub struct TransitionGraph<'a> {
    statuses: BTreeMap<&'a str, (usize, &'a TaskStatus)>,
    edges: BTreeMap<&'a str, Vec<&'a StatusTransition>>,
}

impl<'a> TransitionGraph<'a> {
    /// Builds the graph from a snapshot.
    #[must_use]
    pub fn from_configuration(config: &'a TenantConfiguration) -> Self {
        let statuses = config
            .rows::<TaskStatus>(true)
            .into_iter()
            .enumerate()
            .map(|(rank, status)| (status.code.as_str(), (rank, status)))
            .collect();
        let mut edges: BTreeMap<&'a str, Vec<&'a StatusTransition>> = BTreeMap::new();
        for edge in config.rows::<StatusTransition>(true) {
            edges.entry(edge.from.as_str()).or_default().push(edge);
        }
        Self { statuses, edges }
    }

    /// Returns the status new tasks enter, the predecessor-free entry point.
    #[must_use]
    pub fn entry_status(&self) -> Option<&'a TaskStatus> {
        self.statuses
            .values()
            .map(|(_, status)| *status)
            .find(|status| status.is_active && status.is_default)
    }

    /// Returns the status with `code`, active or not.
    #[must_use]
    pub fn status(&self, code: &str) -> Option<&'a TaskStatus> {
        self.statuses.get(code).map(|(_, status)| *status)
    }

    /// Returns the edge `from -> to`, if present.
    #[must_use]
    pub fn edge(&self, from: &str, to: &str) -> Option<&'a StatusTransition> {
        self.edges
            .get(from)
            .and_then(|edges| edges.iter().copied().find(|edge| edge.to == to))
    }

    /// Returns the active direct successors of `from` in status list order.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::UnknownStatus`] when `from` is not a
    /// status of the tenant.
    pub fn allowed(&self, from: &str) -> Result<Vec<&'a TaskStatus>, TransitionError> {
        if !self.statuses.contains_key(from) {
            return Err(TransitionError::UnknownStatus(from.to_owned()));
        }
        let mut targets: Vec<(usize, &'a TaskStatus)> = self
            .edges
            .get(from)
            .into_iter()
            .flatten()
            .filter_map(|edge| self.statuses.get(edge.to.as_str()).copied())
            .filter(|(_, status)| status.is_active)
            .collect();
        targets.sort_by_key(|(rank, _)| *rank);
        Ok(targets.into_iter().map(|(_, status)| status).collect())
    }

    /// Decides whether a task may move from `from` to `to`.
    ///
    /// Returns `Ok(false)` when no edge exists. When the edge exists, its
    /// preconditions are evaluated in order: reason, required fields, role,
    /// then the guard expression with `now()` bound to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::UnknownStatus`] when `from` is unknown or
    /// `to` is unknown or inactive, [`TransitionError::TerminalViolation`]
    /// when `from` is terminal, and [`TransitionError::GuardFailed`] when a
    /// precondition fails.
    pub fn check(
        &self,
        from: &str,
        to: &str,
        context: &TransitionContext,
        now: DateTime<Utc>,
    ) -> Result<bool, TransitionError> {
        let source = self
            .status(from)
            .ok_or_else(|| TransitionError::UnknownStatus(from.to_owned()))?;
        let target_active = self.status(to).is_some_and(|status| status.is_active);
        if !target_active {
            return Err(TransitionError::UnknownStatus(to.to_owned()));
        }
        if source.is_terminal {
            return Err(TransitionError::TerminalViolation(from.to_owned()));
        }
        let Some(edge) = self.edge(from, to) else {
            return Ok(false);
        };
        check_preconditions(edge, context, now)?;
        Ok(true)
    }
}

fn check_preconditions(
    edge: &StatusTransition,
    context: &TransitionContext,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    let fail = |predicate: String, reason: String| {
        TransitionError::GuardFailed(GuardFailure {
            from: edge.from.to_string(),
            to: edge.to.to_string(),
            predicate,
            reason,
        })
    };

    if edge.requires_reason {
        let has_reason = context
            .payload()
            .get("reason")
            .and_then(Value::as_str)
            .is_some_and(|reason| !reason.trim().is_empty());
        if !has_reason {
            return Err(fail(
                "requires_reason".to_owned(),
                "payload has no reason".to_owned(),
            ));
        }
    }

    for field in &edge.required_fields {
        if !entity_has_field(context.entity(), field) {
            return Err(fail(
                format!("required_field:{field}"),
                format!("entity has no value for '{field}'"),
            ));
        }
    }

    if let Some(role) = &edge.requires_role {
        let presented = context.payload().get("role").and_then(Value::as_str);
        if presented != Some(role.as_str()) {
            return Err(fail(
                format!("requires_role:{role}"),
                format!("acting role is {}", presented.unwrap_or("absent")),
            ));
        }
    }

    let guard = edge.parsed_guard().map_err(|err| {
        fail(
            edge.guard.clone().unwrap_or_default(),
            err.to_string(),
        )
    })?;
    if let Some(expression) = guard {
        let scope = Scope::new(now)
            .with_root("entity", context.entity())
            .with_root("payload", context.payload());
        match expression.evaluate(&scope) {
            Ok(true) => {}
            Ok(false) => {
                return Err(fail(
                    expression.source().to_owned(),
                    "guard evaluated to false".to_owned(),
                ));
            }
            Err(err) => return Err(fail(expression.source().to_owned(), err.to_string())),
        }
    }

    Ok(())
}

/// A field counts as present when it is non-null at the top level of the
/// entity or inside its `custom_fields` object.
fn entity_has_field(entity: &Value, field: &str) -> bool {
    let present = |value: Option<&Value>| value.is_some_and(|found| !found.is_null());
    present(entity.get(field))
        || present(entity.get("custom_fields").and_then(|custom| custom.get(field)))
}
