//! In-memory adapters for tenant vocabularies.

mod repository;
mod usage;

pub use repository::InMemoryConfigurationRepository;
pub use usage::{InMemoryCodeUsage, NoExternalUsage};
