//! Task changes, verdicts and event derivation.

mod change;

pub use change::{TaskChange, TaskChangeVerdict, derive_events};
