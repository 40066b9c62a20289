//! In-memory configuration repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::vocabulary::{
    domain::{ConfigVersion, TenantConfiguration, TenantId},
    ports::{ConfigRepositoryError, ConfigRepositoryResult, ConfigurationRepository},
};

/// Thread-safe in-memory configuration repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigurationRepository {
    state: Arc<RwLock<HashMap<TenantId, TenantConfiguration>>>,
}

impl InMemoryConfigurationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigurationRepository for InMemoryConfigurationRepository {
    async fn load(&self, tenant: &TenantId) -> ConfigRepositoryResult<Option<TenantConfiguration>> {
        let state = self.state.read().map_err(|err| {
            ConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.get(tenant).cloned())
    }

    async fn commit(
        &self,
        snapshot: &TenantConfiguration,
        expected: ConfigVersion,
    ) -> ConfigRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            ConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let actual = state
            .get(snapshot.tenant_id())
            .map_or(ConfigVersion::UNWRITTEN, TenantConfiguration::version);
        if actual != expected {
            return Err(ConfigRepositoryError::VersionStale { expected, actual });
        }

        state.insert(snapshot.tenant_id().clone(), snapshot.clone());
        Ok(())
    }
}
