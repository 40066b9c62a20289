//! Port for rule-health bookkeeping.

use crate::automation::domain::{HealthUpdate, RuleHealth};
use crate::vocabulary::domain::{Code, TenantId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for rule-health store operations.
pub type RuleHealthResult<T> = Result<T, RuleHealthError>;

/// Stores the failure streak and last fire time of each rule.
///
/// Fire history is not kept; replaying an event fires its rules again.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleHealthStore: Send + Sync {
    /// Returns the health of `rule`, or the default for an unseen rule.
    async fn load(&self, tenant: &TenantId, rule: &Code) -> RuleHealthResult<RuleHealth>;

    /// Folds `update` into the health of `rule` as one atomic step.
    ///
    /// Returns the updated health and, when the update reached the
    /// quarantine threshold, the streak length that triggered it.
    async fn apply(
        &self,
        tenant: &TenantId,
        rule: &Code,
        update: &HealthUpdate,
    ) -> RuleHealthResult<(RuleHealth, Option<u32>)>;
}

/// Errors returned by rule-health stores.
#[derive(Debug, Clone, Error)]
pub enum RuleHealthError {
    /// Persistence-layer failure.
    #[error("rule health persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RuleHealthError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
