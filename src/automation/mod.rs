//! Automation rule engine.
//!
//! Rules are vocabulary rows of kind `automation_rule`. Resolving an event
//! against a snapshot is pure and yields [`domain::ActionIntent`]s for the
//! caller to execute; the engine never performs side effects itself beyond
//! tracking rule health and quarantining rules that keep failing.

pub mod adapters;
pub mod domain;
pub mod expression;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
