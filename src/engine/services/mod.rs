//! Application services composing the bounded contexts.

mod engine;

pub use engine::CustomizationEngine;
