//! Edge management and transition checks against the current snapshot.

use crate::error::{CustomizationError, CustomizationResult};
use crate::vocabulary::{
    domain::{Code, ConfigError, Mutation, RowKey, TaskStatus, VocabularyKind},
    ports::ConfigurationRepository,
    services::{TenantConfigStore, TenantContext},
};
use crate::workflow::domain::{StatusTransition, TransitionContext, TransitionGraph};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Transition-graph operations of one tenant.
pub struct TransitionService<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    store: Arc<TenantConfigStore<R, C>>,
}

impl<R, C> Clone for TransitionService<R, C>
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

impl<R, C> TransitionService<R, C>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a transition service over a shared store.
    #[must_use]
    pub const fn new(store: Arc<TenantConfigStore<R, C>>) -> Self {
        Self { store }
    }

    /// Adds an edge.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` when an endpoint is absent or inactive,
    /// `DuplicateEdge` when the pair exists, `TerminalViolation` when the
    /// source is terminal, and `InvalidConfig` for an unflagged self-loop or
    /// a guard that does not parse.
    pub async fn add_edge(
        &self,
        context: &TenantContext,
        edge: StatusTransition,
    ) -> CustomizationResult<StatusTransition> {
        let key = RowKey::transition(&edge.from, &edge.to);
        let committed = self.store.mutate(context, &[Mutation::create(edge)]).await?;
        committed
            .row::<StatusTransition>(key.code())
            .cloned()
            .ok_or_else(|| ConfigError::not_found(key.kind(), key.code()).into())
    }

    /// Removes the edge `from -> to`; returns whether one was removed.
    ///
    /// Removing an absent edge is a no-op that commits nothing.
    ///
    /// # Errors
    ///
    /// Returns `InUse` when historical rows cite the edge, or a repository
    /// error.
    pub async fn remove_edge(
        &self,
        context: &TenantContext,
        from: &Code,
        to: &Code,
    ) -> CustomizationResult<bool> {
        let key = RowKey::transition(from, to);
        let config = self.store.snapshot(context).await?;
        if config.record(&key).is_none() {
            debug!(tenant = %context.tenant(), edge = key.code(), "edge absent; nothing to remove");
            return Ok(false);
        }
        let removal = self
            .store
            .mutate(context, &[Mutation::delete(VocabularyKind::StatusTransition, key.code())])
            .await;
        match removal {
            Ok(_) => Ok(true),
            Err(CustomizationError::Config(ConfigError::NotFound { .. })) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Returns the active direct successors of `from` in status order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus` when `from` is not a status of the tenant.
    pub async fn allowed(
        &self,
        context: &TenantContext,
        from: &str,
    ) -> CustomizationResult<Vec<TaskStatus>> {
        let config = self.store.snapshot(context).await?;
        let graph = TransitionGraph::from_configuration(&config);
        let targets = graph.allowed(&normalize(from))?;
        Ok(targets.into_iter().cloned().collect())
    }

    /// Returns the status new tasks enter.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the tenant has no active default status.
    pub async fn entry_status(&self, context: &TenantContext) -> CustomizationResult<TaskStatus> {
        let config = self.store.snapshot(context).await?;
        TransitionGraph::from_configuration(&config)
            .entry_status()
            .cloned()
            .ok_or_else(|| ConfigError::not_found(VocabularyKind::TaskStatus, "default").into())
    }

    /// Decides whether a task may move from `from` to `to`.
    ///
    /// Returns `Ok(false)` when no edge connects the statuses; guards are
    /// evaluated with `now()` bound to the store's clock.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStatus`, `TerminalViolation`, or `GuardFailed` with
    /// the failing predicate.
    pub async fn check(
        &self,
        context: &TenantContext,
        from: &str,
        to: &str,
        transition: &TransitionContext,
    ) -> CustomizationResult<bool> {
        let config = self.store.snapshot(context).await?;
        let graph = TransitionGraph::from_configuration(&config);
        let verdict = graph.check(
            &normalize(from),
            &normalize(to),
            transition,
            self.store.clock().utc(),
        )?;
        Ok(verdict)
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
