//! In-memory adapters for automation ports.

mod health;

pub use health::InMemoryRuleHealthStore;
