//! Status transition edges.

use crate::automation::expression::{Expression, GUARD_ROOTS};
use crate::vocabulary::domain::{Code, ConfigError, ConfigRow, RowKey, VocabularyKind, VocabularyRow};
use serde::{Deserialize, Serialize};

/// A directed edge of a tenant's task-status graph, keyed `from->to`.
///
/// Edges are removed rather than deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Source status.
    pub from: Code,
    /// Target status.
    pub to: Code,
    /// Optional label shown for the action (for example `Start work`).
    #[serde(default)]
    pub display_name: String,
    /// Whether the transition payload must carry a non-empty `reason`.
    #[serde(default)]
    pub requires_reason: bool,
    /// Entity fields that must be present for the transition.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Guard expression over `entity` and `payload`.
    #[serde(default)]
    pub guard: Option<String>,
    /// Whether the transition needs an approval step by the caller.
    #[serde(default)]
    pub requires_approval: bool,
    /// Whether the caller should notify watchers on this transition.
    #[serde(default)]
    pub notify_on_transition: bool,
    /// Role the acting user must present in the payload `role`.
    #[serde(default)]
    pub requires_role: Option<String>,
    /// Permits `from == to`.
    #[serde(default)]
    pub allow_self_loop: bool,
}

impl StatusTransition {
    /// Creates an unguarded edge.
    #[must_use]
    pub fn new(from: Code, to: Code) -> Self {
        Self {
            from,
            to,
            display_name: String::new(),
            requires_reason: false,
            required_fields: Vec::new(),
            guard: None,
            requires_approval: false,
            notify_on_transition: false,
            requires_role: None,
            allow_self_loop: false,
        }
    }

    /// Attaches a guard expression.
    #[must_use]
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    /// Requires a non-empty `reason` in the transition payload.
    #[must_use]
    pub const fn requiring_reason(mut self) -> Self {
        self.requires_reason = true;
        self
    }

    /// Requires the given entity fields to be present.
    #[must_use]
    pub fn requiring_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the parsed guard, if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the guard does not parse.
    pub fn parsed_guard(&self) -> Result<Option<Expression>, ConfigError> {
        self.guard
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .map(|source| {
                Expression::parse_with_roots(source, GUARD_ROOTS).map_err(|err| {
                    ConfigError::invalid(
                        VocabularyKind::StatusTransition,
                        format!("guard of {}->{}: {err}", self.from, self.to),
                    )
                })
            })
            .transpose()
    }

    /// Checks the edge's own invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] for an unflagged self-loop, a
    /// blank required field, or a guard that does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.from == self.to && !self.allow_self_loop {
            return Err(ConfigError::invalid(
                VocabularyKind::StatusTransition,
                format!("self-loop on '{}' requires allow_self_loop", self.from),
            ));
        }
        if self.required_fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ConfigError::invalid(
                VocabularyKind::StatusTransition,
                "required field names must not be blank",
            ));
        }
        self.parsed_guard().map(|_| ())
    }
}

impl VocabularyRow for StatusTransition {
    const KIND: VocabularyKind = VocabularyKind::StatusTransition;

    fn key_code(&self) -> String {
        RowKey::transition(&self.from, &self.to).code().to_owned()
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn is_active(&self) -> bool {
        true
    }

    fn set_active(&mut self, _active: bool) {}

    fn from_config_row(row: &ConfigRow) -> Option<&Self> {
        match row {
            ConfigRow::StatusTransition(inner) => Some(inner),
            _ => None,
        }
    }
}
