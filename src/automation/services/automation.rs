//! Event evaluation with rule-health tracking and quarantine.

use crate::automation::{
    domain::{
        ActionIntent, AutomationEvent, AutomationRule, HealthUpdate, Resolution, RuleFailure,
        RuleHealth, TriggerKind, resolve_rules,
    },
    ports::RuleHealthStore,
};
use crate::error::CustomizationResult;
use crate::vocabulary::{
    domain::{Code, ConfigError, Mutation, TenantConfiguration, VocabularyKind},
    ports::ConfigurationRepository,
    services::{TenantConfigStore, TenantContext},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Automation-rule operations of one tenant.
///
/// Evaluation is pure with respect to the snapshot; the only side effects
/// are rule-health bookkeeping and the auto-deactivation of rules whose
/// failure streak reaches the configured threshold. Neither can fail an
/// evaluation: bookkeeping errors are logged and the resolution is
/// returned as resolved.
pub struct AutomationService<R, C, H>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    H: RuleHealthStore,
{
    store: Arc<TenantConfigStore<R, C>>,
    health: Arc<H>,
}

impl<R, C, H> Clone for AutomationService<R, C, H>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    H: RuleHealthStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            health: Arc::clone(&self.health),
        }
    }
}

impl<R, C, H> AutomationService<R, C, H>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    H: RuleHealthStore,
{
    /// Creates an automation service.
    #[must_use]
    pub const fn new(store: Arc<TenantConfigStore<R, C>>, health: Arc<H>) -> Self {
        Self { store, health }
    }

    /// Creates a rule.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode`, `InvalidConfig` for an unparsable condition
    /// or malformed actions, and `NotFound` when the trigger or a
    /// `set_field` action names an unknown status, stage or field.
    pub async fn create_rule(
        &self,
        context: &TenantContext,
        rule: AutomationRule,
    ) -> CustomizationResult<AutomationRule> {
        let code = rule.code.clone();
        let committed = self.store.mutate(context, &[Mutation::create(rule)]).await?;
        committed
            .row::<AutomationRule>(code.as_str())
            .cloned()
            .ok_or_else(|| {
                ConfigError::not_found(VocabularyKind::AutomationRule, code.as_str()).into()
            })
    }

    /// Resolves `event` against the tenant's current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`, `VersionStale` for an outdated pin, or a
    /// repository error while loading the snapshot.
    pub async fn evaluate(
        &self,
        context: &TenantContext,
        event: &AutomationEvent,
    ) -> CustomizationResult<Resolution> {
        let config = self.store.snapshot(context).await?;
        self.evaluate_in(context, &config, event).await
    }

    /// Resolves `event` against an already loaded snapshot.
    ///
    /// Failed rules are logged, counted, and quarantined once their streak
    /// reaches the threshold; each quarantine appends a
    /// `rule_quarantined` intent to the resolution. A quarantine whose
    /// commit fails (the rule was deleted meanwhile, or another writer won
    /// the commit) is logged and emits no intent.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` when the context's signal has fired.
    pub async fn evaluate_in(
        &self,
        context: &TenantContext,
        config: &TenantConfiguration,
        event: &AutomationEvent,
    ) -> CustomizationResult<Resolution> {
        context.ensure_live()?;
        let mut resolution = resolve_rules(config, event);

        for rule in &resolution.succeeded {
            let update = HealthUpdate::Succeeded {
                fired: resolution.fired.contains(rule),
                at: event.occurred_at(),
            };
            if let Err(err) = self.health.apply(context.tenant(), rule, &update).await {
                warn!(
                    tenant = %context.tenant(),
                    rule = %rule,
                    error = %err,
                    "failed to record rule success"
                );
            }
        }

        for intent in &resolution.suppressed {
            debug!(
                tenant = %context.tenant(),
                rule = %intent.rule,
                intent = %intent.intent_id,
                kind = %intent.kind,
                "intent suppressed by an earlier conflicting intent"
            );
        }

        let mut quarantined = Vec::new();
        for failure in &resolution.failures {
            if let Some(intent) = self.record_failure(context, failure).await {
                quarantined.push(intent);
            }
        }
        resolution.intents.extend(quarantined);
        Ok(resolution)
    }

    /// Returns the next fire time after `after` of every active
    /// `on_schedule` rule, ordered by time then code.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled`, a repository error, or `InvalidConfig` for a
    /// stored schedule that no longer parses.
    pub async fn upcoming_schedules(
        &self,
        context: &TenantContext,
        after: DateTime<Utc>,
    ) -> CustomizationResult<Vec<(Code, DateTime<Utc>)>> {
        let config = self.store.snapshot(context).await?;
        let mut upcoming = Vec::new();
        for rule in config.rows::<AutomationRule>(false) {
            if rule.trigger != TriggerKind::OnSchedule {
                continue;
            }
            if let Some(next) = rule.schedule()?.after(&after).next() {
                upcoming.push((rule.code.clone(), next));
            }
        }
        upcoming.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(upcoming)
    }

    /// Returns the recorded health of `rule`.
    ///
    /// # Errors
    ///
    /// Returns a rule-health store error.
    pub async fn rule_health(
        &self,
        context: &TenantContext,
        rule: &Code,
    ) -> CustomizationResult<RuleHealth> {
        Ok(self.health.load(context.tenant(), rule).await?)
    }

    async fn record_failure(
        &self,
        context: &TenantContext,
        failure: &RuleFailure,
    ) -> Option<ActionIntent> {
        let settings = self.store.config();
        let update = HealthUpdate::Failed {
            reason: failure.reason.clone(),
            at: self.store.clock().utc(),
            window: chrono::Duration::from_std(settings.quarantine_window())
                .unwrap_or(chrono::Duration::MAX),
            threshold: settings.quarantine_threshold,
        };
        warn!(
            tenant = %context.tenant(),
            rule = %failure.rule,
            reason = %failure.reason,
            "automation rule failed to evaluate"
        );
        let streak = match self.health.apply(context.tenant(), &failure.rule, &update).await {
            Ok((_, Some(streak))) => streak,
            Ok((_, None)) => return None,
            Err(err) => {
                warn!(
                    tenant = %context.tenant(),
                    rule = %failure.rule,
                    error = %err,
                    "failed to record rule failure"
                );
                return None;
            }
        };

        let deactivate = [Mutation::deactivate(
            VocabularyKind::AutomationRule,
            failure.rule.as_str(),
        )];
        if let Err(err) = self.store.mutate(&context.unpinned(), &deactivate).await {
            warn!(
                tenant = %context.tenant(),
                rule = %failure.rule,
                failures = streak,
                error = %err,
                "failed to quarantine automation rule"
            );
            return None;
        }
        warn!(
            tenant = %context.tenant(),
            rule = %failure.rule,
            failures = streak,
            "automation rule quarantined"
        );
        Some(ActionIntent::rule_quarantined(
            failure.rule.clone(),
            streak,
            &failure.reason,
        ))
    }
}
