//! Unit tests for the automation rule engine.
