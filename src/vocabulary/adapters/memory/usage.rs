//! Code-usage probes that need no business storage.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::vocabulary::{
    domain::{RowKey, TenantId},
    ports::{CodeUsageProbe, ConfigRepositoryError, ConfigRepositoryResult},
};

/// Probe for deployments where no historical rows cite vocabulary codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalUsage;

#[async_trait]
impl CodeUsageProbe for NoExternalUsage {
    async fn is_cited(&self, _tenant: &TenantId, _key: &RowKey) -> ConfigRepositoryResult<bool> {
        Ok(false)
    }
}

/// Probe backed by an explicit, mutable set of cited keys.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCodeUsage {
    cited: Arc<RwLock<HashMap<TenantId, BTreeSet<RowKey>>>>,
}

impl InMemoryCodeUsage {
    /// Creates a probe with no cited codes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that historical rows of `tenant` cite `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn cite(&self, tenant: &TenantId, key: RowKey) -> ConfigRepositoryResult<()> {
        let mut cited = self.cited.write().map_err(|err| {
            ConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        cited.entry(tenant.clone()).or_default().insert(key);
        Ok(())
    }
}

#[async_trait]
impl CodeUsageProbe for InMemoryCodeUsage {
    async fn is_cited(&self, tenant: &TenantId, key: &RowKey) -> ConfigRepositoryResult<bool> {
        let cited = self.cited.read().map_err(|err| {
            ConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(cited.get(tenant).is_some_and(|keys| keys.contains(key)))
    }
}
