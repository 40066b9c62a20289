//! Adapter implementations for custom-field ports.

pub mod memory;
