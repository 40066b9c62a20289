//! Declaring custom fields and validating submitted values.

use crate::custom_field::{
    domain::{CustomFieldDefinition, FieldValidationError, PendingReference, validate_fields},
    ports::ReferenceResolver,
};
use crate::error::CustomizationResult;
use crate::vocabulary::{
    domain::{ConfigError, Mutation, TenantConfiguration, VocabularyKind},
    ports::ConfigurationRepository,
    services::{TenantConfigStore, TenantContext},
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Custom-field declarations and payload validation of one tenant.
pub struct CustomFieldService<R, C, V>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    V: ReferenceResolver,
{
    store: Arc<TenantConfigStore<R, C>>,
    resolver: Arc<V>,
}

impl<R, C, V> Clone for CustomFieldService<R, C, V>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    V: ReferenceResolver,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R, C, V> CustomFieldService<R, C, V>
where
    R: ConfigurationRepository,
    C: Clock + Send + Sync,
    V: ReferenceResolver,
{
    /// Creates a custom-field service.
    #[must_use]
    pub const fn new(store: Arc<TenantConfigStore<R, C>>, resolver: Arc<V>) -> Self {
        Self { store, resolver }
    }

    /// Declares a field.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode`, or `InvalidConfig` when the constraints do
    /// not fit the field kind.
    pub async fn declare(
        &self,
        context: &TenantContext,
        field: CustomFieldDefinition,
    ) -> CustomizationResult<CustomFieldDefinition> {
        let code = field.code.clone();
        let committed = self.store.mutate(context, &[Mutation::create(field)]).await?;
        committed
            .row::<CustomFieldDefinition>(code.as_str())
            .cloned()
            .ok_or_else(|| ConfigError::not_found(VocabularyKind::CustomField, code.as_str()).into())
    }

    /// Returns the active declarations applying to `entity_kind`, in list
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` or a repository error.
    pub async fn declared_for(
        &self,
        context: &TenantContext,
        entity_kind: &str,
    ) -> CustomizationResult<Vec<CustomFieldDefinition>> {
        let config = self.store.snapshot(context).await?;
        Ok(config
            .custom_fields()
            .into_iter()
            .filter(|field| field.applies_to(entity_kind))
            .cloned()
            .collect())
    }

    /// Validates `submitted` for an entity of `entity_kind` against the
    /// current snapshot and returns the values to store, defaults applied.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`, `UnknownField` (strict mode), `TypeMismatch`,
    /// `ConstraintViolation`, or `ResolverTimeout` when an entity
    /// reference is not confirmed before the deadline.
    pub async fn validate(
        &self,
        context: &TenantContext,
        entity_kind: &str,
        submitted: &Map<String, Value>,
    ) -> CustomizationResult<BTreeMap<String, Value>> {
        let config = self.store.snapshot(context).await?;
        self.validate_in(context, &config, entity_kind, submitted).await
    }

    /// Validates against an already loaded snapshot.
    ///
    /// # Errors
    ///
    /// See [`CustomFieldService::validate`].
    pub async fn validate_in(
        &self,
        context: &TenantContext,
        config: &TenantConfiguration,
        entity_kind: &str,
        submitted: &Map<String, Value>,
    ) -> CustomizationResult<BTreeMap<String, Value>> {
        let validation = validate_fields(
            config,
            entity_kind,
            submitted,
            self.store.config().field_mode,
        )?;
        let deadline = context
            .deadline()
            .unwrap_or_else(|| self.store.config().resolver_timeout());
        for reference in validation.pending() {
            context.ensure_live()?;
            self.confirm(context, reference, deadline).await?;
        }
        Ok(validation.into_values())
    }

    async fn confirm(
        &self,
        context: &TenantContext,
        reference: &PendingReference,
        deadline: Duration,
    ) -> Result<(), FieldValidationError> {
        let lookup = self
            .resolver
            .exists(context.tenant(), &reference.entity, &reference.id);
        let exists = tokio::time::timeout(deadline, lookup)
            .await
            .map_err(|_| FieldValidationError::ResolverTimeout {
                field: reference.field.clone(),
                timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|err| FieldValidationError::ResolverFailed {
                field: reference.field.clone(),
                reason: err.reason().to_owned(),
            })?;
        if exists {
            return Ok(());
        }
        Err(FieldValidationError::ConstraintViolation {
            field: reference.field.clone(),
            reason: format!(
                "{} '{}' does not exist or is inactive",
                reference.entity, reference.id
            ),
        })
    }
}
