//! Port through which business services report historical code usage.

use super::ConfigRepositoryResult;
use crate::vocabulary::domain::{RowKey, TenantId};
use async_trait::async_trait;

/// Answers whether historical business rows cite a vocabulary code.
///
/// Consulted before a hard delete; a cited code can only be deactivated.
#[async_trait]
pub trait CodeUsageProbe: Send + Sync {
    /// Returns whether any historical row of `tenant` cites `key`.
    async fn is_cited(&self, tenant: &TenantId, key: &RowKey) -> ConfigRepositoryResult<bool>;
}
