//! Action intents and the outcome of rule resolution.

use super::ActionKind;
use crate::vocabulary::domain::Code;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of work an intent describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Set a field of the entity.
    SetField,
    /// Send a notification.
    Notify,
    /// Create a follow-up task.
    CreateTask,
    /// Move the entity to another status.
    TransitionStatus,
    /// Call an external endpoint.
    Webhook,
    /// A rule was auto-deactivated after repeated failures.
    RuleQuarantined,
}

impl IntentKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetField => "set_field",
            Self::Notify => "notify",
            Self::CreateTask => "create_task",
            Self::TransitionStatus => "transition_status",
            Self::Webhook => "webhook",
            Self::RuleQuarantined => "rule_quarantined",
        }
    }
}

impl From<ActionKind> for IntentKind {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::SetField => Self::SetField,
            ActionKind::Notify => Self::Notify,
            ActionKind::CreateTask => Self::CreateTask,
            ActionKind::TransitionStatus => Self::TransitionStatus,
            ActionKind::Webhook => Self::Webhook,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of work for the caller to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionIntent {
    /// Deterministic identifier derived from the rule, action and event.
    pub intent_id: String,
    /// Rule that emitted the intent.
    pub rule: Code,
    /// Index of the action within the rule.
    pub action_index: usize,
    /// Kind of work.
    pub kind: IntentKind,
    /// Rendered parameters.
    pub params: BTreeMap<String, String>,
}

impl ActionIntent {
    /// Returns a rendered parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Builds the notification emitted when `rule` is quarantined.
    #[must_use]
    pub fn rule_quarantined(rule: Code, failures: u32, last_error: &str) -> Self {
        let params = BTreeMap::from([
            ("rule".to_owned(), rule.to_string()),
            ("failures".to_owned(), failures.to_string()),
            ("last_error".to_owned(), last_error.to_owned()),
        ]);
        Self {
            intent_id: format!("rq-{rule}-{failures}"),
            rule,
            action_index: 0,
            kind: IntentKind::RuleQuarantined,
            params,
        }
    }
}

/// A rule whose condition or templates could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Failing rule.
    pub rule: Code,
    /// Why evaluation failed.
    pub reason: String,
}

/// Outcome of resolving one event against a configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Emitted intents in (priority, rule code, action index) order.
    pub intents: Vec<ActionIntent>,
    /// Rules whose condition held, in evaluation order.
    pub fired: Vec<Code>,
    /// Rules that matched and evaluated without error, fired or not.
    pub succeeded: Vec<Code>,
    /// Rules that failed to evaluate; treated as not matching.
    pub failures: Vec<RuleFailure>,
    /// Intents dropped because an earlier intent won a conflict.
    pub suppressed: Vec<ActionIntent>,
}

impl Resolution {
    /// Returns whether no intent was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
