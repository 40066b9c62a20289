//! Custom-field engine.
//!
//! Declarations are vocabulary rows; this module validates submitted values
//! against them. Business-entity references are confirmed through the
//! [`ports::ReferenceResolver`] port under a deadline.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
