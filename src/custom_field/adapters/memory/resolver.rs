//! Reference resolvers backed by process memory.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::custom_field::ports::{ReferenceResolver, ResolverError};
use crate::vocabulary::domain::TenantId;

/// Resolver for deployments without business-entity references; every
/// reference is reported missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllReferences;

#[async_trait]
impl ReferenceResolver for RejectAllReferences {
    async fn exists(
        &self,
        _tenant: &TenantId,
        _entity: &str,
        _id: &str,
    ) -> Result<bool, ResolverError> {
        Ok(false)
    }
}

/// Resolver backed by an explicit registry of `(entity, id)` pairs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceResolver {
    known: Arc<RwLock<HashMap<TenantId, BTreeSet<(String, String)>>>>,
}

impl InMemoryReferenceResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active entity.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the lock is poisoned.
    pub fn register(
        &self,
        tenant: &TenantId,
        entity: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<(), ResolverError> {
        let mut known = self
            .known
            .write()
            .map_err(|err| ResolverError::new(err.to_string()))?;
        known
            .entry(tenant.clone())
            .or_default()
            .insert((entity.into(), id.into()));
        Ok(())
    }
}

#[async_trait]
impl ReferenceResolver for InMemoryReferenceResolver {
    async fn exists(&self, tenant: &TenantId, entity: &str, id: &str) -> Result<bool, ResolverError> {
        let known = self
            .known
            .read()
            .map_err(|err| ResolverError::new(err.to_string()))?;
        Ok(known
            .get(tenant)
            .is_some_and(|pairs| pairs.contains(&(entity.to_owned(), id.to_owned()))))
    }
}
