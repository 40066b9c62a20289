//! Versioned, per-tenant configuration store.

use super::TenantContext;
use crate::config::EngineConfig;
use crate::error::CustomizationResult;
use crate::vocabulary::{
    adapters::memory::NoExternalUsage,
    domain::{
        ApplyContext, ConfigVersion, Mutation, RowKey, SeedDocument, TenantConfiguration,
        TenantId, add_missing_rows, apply_mutations,
    },
    ports::{CodeUsageProbe, ConfigRepositoryError, ConfigurationRepository},
};
use mockable::Clock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Serializes writers per tenant and commits validated snapshots.
///
/// Reads go to the repository on every call and return an immutable
/// snapshot. Writes take the tenant's exclusive lock, apply the mutations
/// to a draft and commit it with a compare-and-swap on the version, so a
/// failed or cancelled call leaves nothing behind.
pub struct TenantConfigStore<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    usage: Arc<dyn CodeUsageProbe>,
    config: EngineConfig,
    /// Per-tenant write locks. Entries are never evicted, so the map grows
    /// with the number of distinct tenants this store has served.
    locks: Mutex<HashMap<TenantId, Arc<Mutex<()>>>>,
}

impl<R, C> TenantConfigStore<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a store whose codes are never cited by business rows.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, config: EngineConfig) -> Self {
        Self {
            repository,
            clock,
            usage: Arc::new(NoExternalUsage),
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the probe consulted before hard deletes.
    #[must_use]
    pub fn with_usage_probe(mut self, usage: Arc<dyn CodeUsageProbe>) -> Self {
        self.usage = usage;
        self
    }

    /// Returns the engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the store's clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the current snapshot of the context's tenant, seeding it on
    /// first access when seeding is enabled.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`, `VersionStale` when the context is pinned to
    /// another version, or a repository error.
    pub async fn snapshot(&self, context: &TenantContext) -> CustomizationResult<TenantConfiguration> {
        context.ensure_live()?;
        if let Some(stored) = self.repository.load(context.tenant()).await? {
            context.ensure_version(stored.version())?;
            return Ok(stored);
        }

        let lock = self.tenant_lock(context.tenant()).await;
        let _guard = lock.lock().await;
        let config = self.load_or_seed(context.tenant()).await?;
        context.ensure_version(config.version())?;
        Ok(config)
    }

    /// Applies `mutations` as one unit and commits the next version.
    ///
    /// An empty batch commits nothing and returns the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation, `VersionStale` when the
    /// context's pin is outdated or another writer won the commit,
    /// `Cancelled` when the signal fires before the commit, or a
    /// repository error.
    pub async fn mutate(
        &self,
        context: &TenantContext,
        mutations: &[Mutation],
    ) -> CustomizationResult<TenantConfiguration> {
        context.ensure_live()?;
        let cited = self.cited_keys(context.tenant(), mutations).await?;

        let lock = self.tenant_lock(context.tenant()).await;
        let _guard = lock.lock().await;
        let base = self.load_or_seed(context.tenant()).await?;
        context.ensure_version(base.version())?;
        if mutations.is_empty() {
            return Ok(base);
        }

        let draft = apply_mutations(&base, mutations, &self.apply_context(&cited))?;
        context.ensure_live()?;
        self.repository.commit(&draft, base.version()).await?;
        info!(
            tenant = %context.tenant(),
            version = %draft.version(),
            mutations = mutations.len(),
            "committed configuration change"
        );
        Ok(draft)
    }

    /// Adds the canonical seed rows the tenant lacks.
    ///
    /// Existing rows are never modified; rows that would break an invariant
    /// of the tenant's customized configuration are skipped. No version is
    /// committed when nothing was added.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`, `VersionStale`, or a repository error.
    pub async fn upgrade_seed(&self, context: &TenantContext) -> CustomizationResult<Vec<RowKey>> {
        context.ensure_live()?;
        let seed = SeedDocument::canonical()?;

        let lock = self.tenant_lock(context.tenant()).await;
        let _guard = lock.lock().await;
        let mut config = self.load_or_seed(context.tenant()).await?;
        let base_version = config.version();
        context.ensure_version(base_version)?;

        let no_citations = BTreeSet::new();
        let added = add_missing_rows(&mut config, &seed, &self.apply_context(&no_citations));
        if added.is_empty() {
            return Ok(added);
        }
        context.ensure_live()?;
        self.repository.commit(&config, base_version).await?;
        info!(
            tenant = %context.tenant(),
            version = %config.version(),
            added = added.len(),
            "upgraded tenant seed"
        );
        Ok(added)
    }

    /// Returns the tenant's write lock, creating it on first use.
    ///
    /// The entry stays in the map for the life of the store. That is one
    /// small allocation per tenant; a process serving an unbounded tenant
    /// population should build stores per shard or restart periodically.
    async fn tenant_lock(&self, tenant: &TenantId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(tenant.clone()).or_default())
    }

    /// Loads the tenant, committing the canonical seed when it was never
    /// written. Callers hold the tenant lock.
    ///
    /// Another process may seed the same tenant first; the losing commit
    /// then adopts the stored configuration.
    async fn load_or_seed(&self, tenant: &TenantId) -> CustomizationResult<TenantConfiguration> {
        if let Some(stored) = self.repository.load(tenant).await? {
            return Ok(stored);
        }
        let empty = TenantConfiguration::empty(tenant.clone());
        if !self.config.seed_defaults {
            return Ok(empty);
        }

        let seed = SeedDocument::canonical()?;
        let no_citations = BTreeSet::new();
        let seeded = apply_mutations(&empty, &seed.to_mutations(), &self.apply_context(&no_citations))?;
        if let Err(err) = self.repository.commit(&seeded, ConfigVersion::UNWRITTEN).await {
            if !matches!(err, ConfigRepositoryError::VersionStale { .. }) {
                return Err(err.into());
            }
            let Some(stored) = self.repository.load(tenant).await? else {
                return Err(err.into());
            };
            debug!(tenant = %tenant, "tenant was seeded by another writer");
            return Ok(stored);
        }
        info!(
            tenant = %tenant,
            version = %seeded.version(),
            rows = seed.rows().len(),
            "seeded tenant configuration"
        );
        Ok(seeded)
    }

    async fn cited_keys(
        &self,
        tenant: &TenantId,
        mutations: &[Mutation],
    ) -> CustomizationResult<BTreeSet<RowKey>> {
        let mut cited = BTreeSet::new();
        for mutation in mutations {
            if !matches!(mutation, Mutation::Delete { .. }) {
                continue;
            }
            let key = mutation.target();
            if self.usage.is_cited(tenant, &key).await? {
                cited.insert(key);
            }
        }
        Ok(cited)
    }

    fn apply_context<'a>(&self, cited: &'a BTreeSet<RowKey>) -> ApplyContext<'a> {
        ApplyContext {
            now: self.clock.utc(),
            max_actions_per_rule: self.config.max_actions_per_rule,
            cited,
        }
    }
}
