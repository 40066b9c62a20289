//! Automation rules, events and the intents they resolve to.

mod action;
mod error;
mod event;
mod health;
mod intent;
mod resolve;
mod rule;

pub use action::{ActionKind, ActionSpec};
pub use error::ActionParseError;
pub use event::{AutomationEvent, EventKind};
pub use health::{HealthUpdate, RuleHealth};
pub use intent::{ActionIntent, IntentKind, Resolution, RuleFailure};
pub use resolve::resolve_rules;
pub use rule::{AutomationRule, BUILTIN_TASK_FIELDS, TriggerKind, TriggerParams};
