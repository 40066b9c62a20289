//! Port for confirming references to business entities.

use crate::vocabulary::domain::TenantId;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a reference resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("reference resolver failed: {reason}")]
pub struct ResolverError {
    reason: String,
}

impl ResolverError {
    /// Creates a resolver error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Answers whether a business entity exists and is active.
///
/// Implemented by the collaborator that owns the entity (for example the
/// lead or project service). Calls are bounded by the caller's deadline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Returns whether `id` names an active `entity` of `tenant`.
    async fn exists(&self, tenant: &TenantId, entity: &str, id: &str)
    -> Result<bool, ResolverError>;
}
