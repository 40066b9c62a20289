//! The customization engine facade.

use crate::automation::{ports::RuleHealthStore, services::AutomationService};
use crate::custom_field::{ports::ReferenceResolver, services::CustomFieldService};
use crate::engine::domain::{TaskChange, TaskChangeVerdict, derive_events};
use crate::error::{CustomizationError, CustomizationResult};
use crate::vocabulary::{
    ports::ConfigurationRepository,
    services::{TenantConfigStore, TenantContext, VocabularyService},
};
use crate::workflow::{
    domain::{TransitionContext, TransitionError, TransitionGraph},
    services::TransitionService,
};
use mockable::Clock;
use std::sync::Arc;

/// Entry point bundling the services of every context over one store.
pub struct CustomizationEngine<R, C, V, H>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    V: ReferenceResolver,
    H: RuleHealthStore,
{
    store: Arc<TenantConfigStore<R, C>>,
    vocabulary: VocabularyService<R, C>,
    transitions: TransitionService<R, C>,
    custom_fields: CustomFieldService<R, C, V>,
    automation: AutomationService<R, C, H>,
}

impl<R, C, V, H> CustomizationEngine<R, C, V, H>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    V: ReferenceResolver,
    H: RuleHealthStore,
{
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<TenantConfigStore<R, C>>, resolver: Arc<V>, health: Arc<H>) -> Self {
        Self {
            vocabulary: VocabularyService::new(Arc::clone(&store)),
            transitions: TransitionService::new(Arc::clone(&store)),
            custom_fields: CustomFieldService::new(Arc::clone(&store), resolver),
            automation: AutomationService::new(Arc::clone(&store), health),
            store,
        }
    }

    /// Returns the vocabulary store operations.
    #[must_use]
    pub const fn vocabulary(&self) -> &VocabularyService<R, C> {
        &self.vocabulary
    }

    /// Returns the transition-graph operations.
    #[must_use]
    pub const fn transitions(&self) -> &TransitionService<R, C> {
        &self.transitions
    }

    /// Returns the custom-field operations.
    #[must_use]
    pub const fn custom_fields(&self) -> &CustomFieldService<R, C, V> {
        &self.custom_fields
    }

    /// Returns the automation-rule operations.
    #[must_use]
    pub const fn automation(&self) -> &AutomationService<R, C, H> {
        &self.automation
    }

    /// Validates `change` and returns the resulting intents.
    ///
    /// Everything is evaluated against a single snapshot. A status change
    /// must follow an edge of the transition graph; a creation must enter
    /// an active status. Custom fields are validated next, then the derived
    /// events run through the rule engine in order.
    ///
    /// # Errors
    ///
    /// Returns `TransitionNotAllowed` when no edge connects the statuses,
    /// the transition and custom-field errors unchanged, `Cancelled`,
    /// `VersionStale` for an outdated pin, or a repository error. Rule
    /// failures are contained in the rule engine and never returned.
    pub async fn apply_task_change(
        &self,
        context: &TenantContext,
        change: &TaskChange,
    ) -> CustomizationResult<TaskChangeVerdict> {
        let config = self.store.snapshot(context).await?;
        let now = self.store.clock().utc();
        let graph = TransitionGraph::from_configuration(&config);

        let status_before = change.status_before().map(normalize);
        let status_after = change.status_after().map(normalize);
        match (status_before, status_after) {
            (Some(from), Some(to)) if from != to => {
                let transition =
                    TransitionContext::new(change.after().clone(), change.payload().clone());
                if !graph.check(&from, &to, &transition, now)? {
                    return Err(CustomizationError::TransitionNotAllowed { from, to });
                }
            }
            (None, Some(code)) => {
                if !graph.status(&code).is_some_and(|row| row.is_active) {
                    return Err(TransitionError::UnknownStatus(code).into());
                }
            }
            _ => {}
        }

        let fields = self
            .custom_fields
            .validate_in(context, &config, change.entity_kind(), change.custom_fields())
            .await?;
        let events = derive_events(&config, change, &fields, now)?;

        let mut intents = Vec::new();
        for event in &events {
            context.ensure_live()?;
            let resolution = self.automation.evaluate_in(context, &config, event).await?;
            intents.extend(resolution.intents);
        }

        Ok(TaskChangeVerdict {
            version: config.version(),
            fields,
            events,
            intents,
        })
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
