//! Port contracts for the automation rule engine.

pub mod health;

pub use health::{RuleHealthError, RuleHealthResult, RuleHealthStore};

#[cfg(test)]
pub use health::MockRuleHealthStore;
