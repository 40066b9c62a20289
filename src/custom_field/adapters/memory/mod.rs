//! In-memory adapters for custom-field ports.

mod resolver;

pub use resolver::{InMemoryReferenceResolver, RejectAllReferences};
