//! Automation rule rows and trigger matching.

use super::{ActionKind, ActionSpec, AutomationEvent, EventKind};
use crate::automation::expression::Expression;
use crate::vocabulary::domain::{
    Code, ConfigError, ConfigRow, VocabularyKind, VocabularyRow, default_true,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task fields every tenant has; rules may reference them without a
/// custom-field declaration.
pub const BUILTIN_TASK_FIELDS: &[&str] = &[
    "title",
    "description",
    "status",
    "stage",
    "priority",
    "type",
    "assignee",
    "due_date",
];

/// Event kind a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The entity was created.
    OnCreate,
    /// The entity's status changed.
    OnStatusChange,
    /// A field of the entity changed.
    OnFieldChange,
    /// A scheduled tick fired.
    OnSchedule,
    /// The entity entered a stage.
    OnStageEnter,
}

impl TriggerKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnCreate => "on_create",
            Self::OnStatusChange => "on_status_change",
            Self::OnFieldChange => "on_field_change",
            Self::OnSchedule => "on_schedule",
            Self::OnStageEnter => "on_stage_enter",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints narrowing which events of the trigger kind match.
///
/// An absent parameter is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Source status of a status change.
    #[serde(default)]
    pub from: Option<Code>,
    /// Target status of a status change.
    #[serde(default)]
    pub to: Option<Code>,
    /// Changed field; required for `on_field_change`.
    #[serde(default)]
    pub field: Option<String>,
    /// Entered stage.
    #[serde(default)]
    pub stage: Option<Code>,
    /// Cron expression (seconds first); required for `on_schedule`.
    #[serde(default)]
    pub schedule: Option<String>,
    /// Entity kind the rule applies to.
    #[serde(default)]
    pub entity_kind: Option<String>,
}

impl TriggerParams {
    /// Matches status changes into `to`.
    #[must_use]
    pub fn to_status(to: Code) -> Self {
        Self {
            to: Some(to),
            ..Self::default()
        }
    }
}

/// A declarative `(trigger, condition, actions)` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRule {
    /// Unique rule code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Event kind the rule reacts to.
    pub trigger: TriggerKind,
    /// Event constraints.
    #[serde(default)]
    pub trigger_params: TriggerParams,
    /// Condition over the event; absent means always.
    #[serde(default)]
    pub condition: Option<String>,
    /// Ordered actions emitted when the rule fires.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    /// Evaluation rank; lower runs first, ties broken by code.
    #[serde(default)]
    pub priority: i32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl AutomationRule {
    /// Creates an active rule without condition or actions.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>, trigger: TriggerKind) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            description: None,
            trigger,
            trigger_params: TriggerParams::default(),
            condition: None,
            actions: Vec::new(),
            priority: 0,
            is_active: true,
        }
    }

    /// Sets the trigger parameters.
    #[must_use]
    pub fn with_params(mut self, params: TriggerParams) -> Self {
        self.trigger_params = params;
        self
    }

    /// Sets the condition.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the evaluation rank.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the parsed condition; `None` when the rule is unconditional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the condition does not
    /// parse.
    pub fn parsed_condition(&self) -> Result<Option<Expression>, ConfigError> {
        self.condition
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .map(|source| {
                Expression::parse(source).map_err(|err| {
                    ConfigError::invalid(
                        VocabularyKind::AutomationRule,
                        format!("condition of rule '{}': {err}", self.code),
                    )
                })
            })
            .transpose()
    }

    /// Returns the schedule of an `on_schedule` rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the expression is missing
    /// or not a valid cron expression.
    pub fn schedule(&self) -> Result<cron::Schedule, ConfigError> {
        let expression = self
            .trigger_params
            .schedule
            .as_deref()
            .filter(|expr| !expr.trim().is_empty())
            .ok_or_else(|| self.invalid("on_schedule rules need a schedule".to_owned()))?;
        cron::Schedule::from_str(expression)
            .map_err(|err| self.invalid(format!("invalid cron expression '{expression}': {err}")))
    }

    /// Checks the rule's own invariants.
    ///
    /// Existence of referenced statuses, stages and fields is checked by the
    /// vocabulary store against the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] for an unparsable condition, an
    /// action count outside `1..=max_actions`, an invalid action, trigger
    /// parameters that do not apply to the trigger kind, or an invalid
    /// schedule.
    pub fn validate(&self, max_actions: usize) -> Result<(), ConfigError> {
        self.parsed_condition()?;

        if self.actions.is_empty() || self.actions.len() > max_actions {
            return Err(self.invalid(format!(
                "needs between 1 and {max_actions} actions, has {}",
                self.actions.len()
            )));
        }
        for (index, action) in self.actions.iter().enumerate() {
            action
                .validate()
                .map_err(|reason| self.invalid(format!("action {index}: {reason}")))?;
            if action.kind == ActionKind::TransitionStatus {
                let target = action.param("to").unwrap_or_default();
                let is_template = target.contains("{{");
                if !is_template && Code::new(target).is_err() {
                    return Err(self.invalid(format!(
                        "action {index}: '{target}' is not a status code"
                    )));
                }
            }
        }

        self.validate_trigger_params()
    }

    fn validate_trigger_params(&self) -> Result<(), ConfigError> {
        let params = &self.trigger_params;
        let stray = |name: &str, present: bool| -> Result<(), ConfigError> {
            if present {
                return Err(self.invalid(format!(
                    "trigger parameter '{name}' does not apply to {}",
                    self.trigger
                )));
            }
            Ok(())
        };

        let status_params = params.from.is_some() || params.to.is_some();
        match self.trigger {
            TriggerKind::OnCreate => {
                stray("from/to", status_params)?;
                stray("field", params.field.is_some())?;
                stray("stage", params.stage.is_some())?;
                stray("schedule", params.schedule.is_some())?;
            }
            TriggerKind::OnStatusChange => {
                stray("field", params.field.is_some())?;
                stray("stage", params.stage.is_some())?;
                stray("schedule", params.schedule.is_some())?;
            }
            TriggerKind::OnFieldChange => {
                stray("from/to", status_params)?;
                stray("stage", params.stage.is_some())?;
                stray("schedule", params.schedule.is_some())?;
                let has_field = params
                    .field
                    .as_deref()
                    .is_some_and(|field| !field.trim().is_empty());
                if !has_field {
                    return Err(self.invalid("on_field_change rules need a field".to_owned()));
                }
            }
            TriggerKind::OnStageEnter => {
                stray("from/to", status_params)?;
                stray("field", params.field.is_some())?;
                stray("schedule", params.schedule.is_some())?;
            }
            TriggerKind::OnSchedule => {
                stray("from/to", status_params)?;
                stray("field", params.field.is_some())?;
                stray("stage", params.stage.is_some())?;
                self.schedule()?;
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> ConfigError {
        ConfigError::invalid(
            VocabularyKind::AutomationRule,
            format!("rule '{}': {reason}", self.code),
        )
    }

    /// Returns whether the rule's trigger matches `event`.
    #[must_use]
    pub fn matches(&self, event: &AutomationEvent) -> bool {
        let params = &self.trigger_params;
        if params
            .entity_kind
            .as_deref()
            .is_some_and(|kind| kind != event.entity_kind())
        {
            return false;
        }
        let wildcard = |expected: Option<&Code>, actual: &Code| expected.is_none_or(|code| code == actual);

        match (self.trigger, event.kind()) {
            (TriggerKind::OnCreate, EventKind::Created) => true,
            (TriggerKind::OnStatusChange, EventKind::StatusChanged { from, to }) => {
                wildcard(params.from.as_ref(), from) && wildcard(params.to.as_ref(), to)
            }
            (TriggerKind::OnFieldChange, EventKind::FieldChanged { field, .. }) => {
                params.field.as_deref() == Some(field.as_str())
            }
            (TriggerKind::OnStageEnter, EventKind::StageEntered { stage }) => {
                wildcard(params.stage.as_ref(), stage)
            }
            (TriggerKind::OnSchedule, EventKind::ScheduledTick { schedule }) => {
                params.schedule.as_deref() == Some(schedule.as_str())
            }
            _ => false,
        }
    }

    /// Returns every status code the rule references: trigger endpoints and
    /// literal `transition_status` targets.
    #[must_use]
    pub fn referenced_statuses(&self) -> Vec<Code> {
        let params = &self.trigger_params;
        let mut statuses: Vec<Code> = params.from.iter().chain(&params.to).cloned().collect();
        statuses.extend(
            self.actions
                .iter()
                .filter(|action| action.kind == ActionKind::TransitionStatus)
                .filter_map(|action| action.param("to"))
                .filter_map(|target| Code::new(target).ok()),
        );
        statuses.sort();
        statuses.dedup();
        statuses
    }

    /// Returns the non-built-in field codes the rule references: the trigger
    /// field and literal `set_field` targets.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .trigger_params
            .field
            .iter()
            .cloned()
            .chain(
                self.actions
                    .iter()
                    .filter(|action| action.kind == ActionKind::SetField)
                    .filter_map(|action| action.param("field"))
                    .filter(|field| !field.contains("{{"))
                    .map(str::to_owned),
            )
            .filter(|field| !BUILTIN_TASK_FIELDS.contains(&field.as_str()))
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }
}

impl VocabularyRow for AutomationRule {
    const KIND: VocabularyKind = VocabularyKind::AutomationRule;

    fn key_code(&self) -> String {
        self.code.as_str().to_owned()
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    fn from_config_row(row: &ConfigRow) -> Option<&Self> {
        match row {
            ConfigRow::AutomationRule(inner) => Some(inner),
            _ => None,
        }
    }
}
