//! CRUD surface over every vocabulary kind.

use super::{TenantConfigStore, TenantContext};
use crate::error::CustomizationResult;
use crate::vocabulary::{
    domain::{
        ConfigError, ConfigRow, ConfigVersion, Mutation, RowKey, SeedDocument,
        TenantConfiguration, VocabularyKind, VocabularyRecord, VocabularyRow,
    },
    ports::ConfigurationRepository,
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

/// Row filter for [`VocabularyService::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Whether soft-deactivated rows are returned.
    pub include_inactive: bool,
}

impl ListFilter {
    /// Active rows only.
    #[must_use]
    pub const fn active() -> Self {
        Self {
            include_inactive: false,
        }
    }

    /// Active and inactive rows.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            include_inactive: true,
        }
    }
}

/// Vocabulary store operations, uniform across kinds.
///
/// Every write commits exactly one new configuration version.
pub struct VocabularyService<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    store: Arc<TenantConfigStore<R, C>>,
}

impl<R, C> Clone for VocabularyService<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R, C> VocabularyService<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a vocabulary service over a shared store.
    #[must_use]
    pub const fn new(store: Arc<TenantConfigStore<R, C>>) -> Self {
        Self { store }
    }

    /// Inserts a row and returns it with its assigned timestamps.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` when the code exists (active or not),
    /// `InvalidConfig` for invariant violations, and `NotFound` when a
    /// referenced row (for example a subsource's parent) is missing or
    /// inactive.
    pub async fn create(
        &self,
        context: &TenantContext,
        row: impl Into<ConfigRow>,
    ) -> CustomizationResult<VocabularyRecord> {
        let mutation = Mutation::create(row);
        self.commit_one(context, mutation).await
    }

    /// Returns the row stored under `code`, active or not.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no such row exists.
    pub async fn get(
        &self,
        context: &TenantContext,
        kind: VocabularyKind,
        code: &str,
    ) -> CustomizationResult<VocabularyRecord> {
        let config = self.store.snapshot(context).await?;
        record_of(&config, &RowKey::normalized(kind, code))
    }

    /// Returns the typed row of kind `T` stored under `code`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no such row exists.
    pub async fn get_row<T>(&self, context: &TenantContext, code: &str) -> CustomizationResult<T>
    where
        T: VocabularyRow + Clone,
    {
        let record = self.get(context, T::KIND, code).await?;
        record
            .typed::<T>()
            .cloned()
            .ok_or_else(|| ConfigError::not_found(T::KIND, code).into())
    }

    /// Returns the rows of `kind` ordered by (`order`, creation).
    ///
    /// The cancellation signal is checked between rows.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` or a repository error.
    pub async fn list(
        &self,
        context: &TenantContext,
        kind: VocabularyKind,
        filter: ListFilter,
    ) -> CustomizationResult<Vec<VocabularyRecord>> {
        let config = self.store.snapshot(context).await?;
        let mut rows = Vec::new();
        for record in config.records_of(kind, filter.include_inactive) {
            context.ensure_live()?;
            rows.push(record.clone());
        }
        Ok(rows)
    }

    /// Merges `patch` (RFC 7396) into the row stored under `code`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidConfig` for unknown attributes, renames
    /// or invariant violations, and `InUse` when the patch deactivates a
    /// row that active rows depend on.
    pub async fn update(
        &self,
        context: &TenantContext,
        kind: VocabularyKind,
        code: &str,
        patch: Value,
    ) -> CustomizationResult<VocabularyRecord> {
        self.commit_one(context, Mutation::update(kind, code, patch))
            .await
    }

    /// Soft-deactivates a row; historical references stay intact.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InUse` when an active row holds a mandatory
    /// reference to it.
    pub async fn deactivate(
        &self,
        context: &TenantContext,
        kind: VocabularyKind,
        code: &str,
    ) -> CustomizationResult<VocabularyRecord> {
        self.commit_one(context, Mutation::deactivate(kind, code))
            .await
    }

    /// Re-activates a soft-deactivated row, re-running its reference checks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the row, or a row it requires to be active,
    /// is missing or inactive.
    pub async fn activate(
        &self,
        context: &TenantContext,
        kind: VocabularyKind,
        code: &str,
    ) -> CustomizationResult<VocabularyRecord> {
        self.commit_one(context, Mutation::activate(kind, code))
            .await
    }

    /// Hard-deletes an unreferenced row and returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InUse` when any row references it or
    /// historical business rows cite it.
    pub async fn delete(
        &self,
        context: &TenantContext,
        kind: VocabularyKind,
        code: &str,
    ) -> CustomizationResult<ConfigVersion> {
        let committed = self
            .store
            .mutate(context, &[Mutation::delete(kind, code)])
            .await?;
        Ok(committed.version())
    }

    /// Commits several mutations as one unit with one version bump.
    ///
    /// Invariants are checked on the final state, so a batch may pass
    /// through states that would be refused one mutation at a time. Pin the
    /// context to make the batch conditional on a version.
    ///
    /// # Errors
    ///
    /// Returns the first violation; nothing is committed in that case.
    pub async fn apply_batch(
        &self,
        context: &TenantContext,
        mutations: &[Mutation],
    ) -> CustomizationResult<TenantConfiguration> {
        self.store.mutate(context, mutations).await
    }

    /// Adds the canonical seed rows the tenant lacks.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`, `VersionStale`, or a repository error.
    pub async fn upgrade_seed(&self, context: &TenantContext) -> CustomizationResult<Vec<RowKey>> {
        self.store.upgrade_seed(context).await
    }

    /// Creates every row of `document` in one unit.
    ///
    /// # Errors
    ///
    /// Returns the first violation, including `DuplicateCode` for rows the
    /// tenant already has.
    pub async fn import_seed_document(
        &self,
        context: &TenantContext,
        document: &SeedDocument,
    ) -> CustomizationResult<TenantConfiguration> {
        self.store.mutate(context, &document.to_mutations()).await
    }

    /// Returns the tenant's current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`, `VersionStale` for an outdated pin, or a
    /// repository error.
    pub async fn snapshot(&self, context: &TenantContext) -> CustomizationResult<TenantConfiguration> {
        self.store.snapshot(context).await
    }

    async fn commit_one(
        &self,
        context: &TenantContext,
        mutation: Mutation,
    ) -> CustomizationResult<VocabularyRecord> {
        let key = mutation.target();
        let committed = self.store.mutate(context, &[mutation]).await?;
        record_of(&committed, &key)
    }
}

fn record_of(config: &TenantConfiguration, key: &RowKey) -> CustomizationResult<VocabularyRecord> {
    config
        .record(key)
        .cloned()
        .ok_or_else(|| ConfigError::not_found(key.kind(), key.code()).into())
}
