//! Port contracts for the custom-field engine.

pub mod resolver;

pub use resolver::{ReferenceResolver, ResolverError};

#[cfg(test)]
pub use resolver::MockReferenceResolver;
