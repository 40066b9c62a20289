//! In-memory rule-health store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::automation::{
    domain::{HealthUpdate, RuleHealth},
    ports::{RuleHealthError, RuleHealthResult, RuleHealthStore},
};
use crate::vocabulary::domain::{Code, TenantId};

/// Thread-safe in-memory rule-health store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleHealthStore {
    state: Arc<RwLock<HashMap<(TenantId, Code), RuleHealth>>>,
}

impl InMemoryRuleHealthStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleHealthStore for InMemoryRuleHealthStore {
    async fn load(&self, tenant: &TenantId, rule: &Code) -> RuleHealthResult<RuleHealth> {
        let state = self
            .state
            .read()
            .map_err(|err| RuleHealthError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state
            .get(&(tenant.clone(), rule.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn apply(
        &self,
        tenant: &TenantId,
        rule: &Code,
        update: &HealthUpdate,
    ) -> RuleHealthResult<(RuleHealth, Option<u32>)> {
        let mut state = self
            .state
            .write()
            .map_err(|err| RuleHealthError::persistence(std::io::Error::other(err.to_string())))?;
        let health = state.entry((tenant.clone(), rule.clone())).or_default();
        let quarantined = health.apply(update);
        Ok((health.clone(), quarantined))
    }
}
