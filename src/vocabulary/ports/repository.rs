//! Repository port for tenant configuration snapshots.

use crate::vocabulary::domain::{ConfigVersion, TenantConfiguration, TenantId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for configuration repository operations.
pub type ConfigRepositoryResult<T> = Result<T, ConfigRepositoryError>;

/// Configuration persistence contract.
///
/// A tenant's configuration is stored and replaced as a whole. Commits are
/// compare-and-swap on the stored version, which makes concurrent writers
/// observable instead of silently overwriting each other.
#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// Loads the latest committed snapshot of a tenant.
    ///
    /// Returns `None` when the tenant has never been written.
    async fn load(&self, tenant: &TenantId) -> ConfigRepositoryResult<Option<TenantConfiguration>>;

    /// Replaces the stored configuration with `snapshot` if the stored
    /// version still equals `expected` (0 for a tenant never written).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigRepositoryError::VersionStale`] when another writer
    /// committed first.
    async fn commit(
        &self,
        snapshot: &TenantConfiguration,
        expected: ConfigVersion,
    ) -> ConfigRepositoryResult<()>;
}

/// Errors returned by configuration repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ConfigRepositoryError {
    /// The stored version moved on since the snapshot was read.
    #[error("configuration version is stale: expected {expected}, found {actual}")]
    VersionStale {
        /// Version the writer based its change on.
        expected: ConfigVersion,
        /// Version currently stored.
        actual: ConfigVersion,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConfigRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
