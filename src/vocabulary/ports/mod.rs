//! Port contracts for tenant vocabularies.
//!
//! Ports define infrastructure-agnostic interfaces used by the vocabulary
//! services.

pub mod repository;
pub mod usage;

pub use repository::{ConfigRepositoryError, ConfigRepositoryResult, ConfigurationRepository};
pub use usage::CodeUsageProbe;
