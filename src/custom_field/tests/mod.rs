//! Unit tests for the custom-field engine.
