//! Application services for the transition graph.

mod transitions;

pub use transitions::TransitionService;
