//! Adapter implementations for tenant vocabulary ports.

pub mod memory;
pub mod postgres;
