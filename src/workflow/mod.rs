//! Task-status transition graph.
//!
//! Edges are vocabulary rows of the tenant configuration; this module
//! evaluates them. Domain types live in [`domain`] and the orchestration
//! service in [`services`].

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
