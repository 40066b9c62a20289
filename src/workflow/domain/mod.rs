//! Domain model of the task-status transition graph.
//!
//! Edges are configuration rows ([`StatusTransition`]) stored in the tenant
//! vocabulary; [`TransitionGraph`] is a read-only view over one snapshot.

mod error;
mod graph;
mod transition;

pub use error::{GuardFailure, TransitionError};
pub use graph::{TransitionContext, TransitionGraph};
pub use transition::StatusTransition;
