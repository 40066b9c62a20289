//! Unit tests for the engine flow.
