//! Unit tests for the vocabulary store.
//!
//! Domain tests exercise the pure mutation pipeline; service tests drive
//! the store through the in-memory repository.

mod domain_tests;
mod service_tests;
