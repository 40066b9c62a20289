//! End-to-end evaluation of task changes.
//!
//! A caller presents a tenant and a task change; the engine validates the
//! change against one configuration snapshot (transition graph and custom
//! fields), derives the events it implies, runs the rule engine for each and
//! returns a verdict together with the ordered action intents.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
