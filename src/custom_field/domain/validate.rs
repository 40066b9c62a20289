//! Pure validation of submitted custom-field values.
//!
//! Everything except business-entity references is decided here, against
//! the declarations and the vocabulary snapshot. Entity references are
//! returned as [`PendingReference`]s for the service to resolve.

use super::{CustomFieldDefinition, FieldKind, FieldValidationError, ReferenceTarget};
use crate::vocabulary::domain::{RowKey, TenantConfiguration};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Policy for submitted fields that are not declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    /// Undeclared fields are rejected with `UnknownField`.
    #[default]
    Strict,
    /// Undeclared fields are dropped.
    Lenient,
}

/// An entity reference awaiting confirmation by the external resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReference {
    /// Field code.
    pub field: String,
    /// Referenced business entity kind.
    pub entity: String,
    /// Referenced identifier.
    pub id: String,
}

/// Outcome of the synchronous validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidation {
    values: BTreeMap<String, Value>,
    pending: Vec<PendingReference>,
}

impl FieldValidation {
    /// Returns the accepted values with defaults applied.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Returns entity references still to be resolved.
    #[must_use]
    pub fn pending(&self) -> &[PendingReference] {
        &self.pending
    }

    /// Consumes the validation into its accepted values.
    #[must_use]
    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

/// Validates `submitted` for an entity of `entity_kind`.
///
/// Declared fields are processed in code order and the first failure is
/// returned. `null` counts as absent. Defaults fill absent optional fields
/// only; a required field must always be supplied. Values for inactive or foreign-kind
/// declarations are dropped silently; undeclared values are handled per
/// `mode`.
///
/// # Errors
///
/// Returns the first [`FieldValidationError`] encountered.
pub fn validate_fields(
    config: &TenantConfiguration,
    entity_kind: &str,
    submitted: &Map<String, Value>,
    mode: FieldMode,
) -> Result<FieldValidation, FieldValidationError> {
    let all_fields = config.rows::<CustomFieldDefinition>(true);
    let mut declared: Vec<&CustomFieldDefinition> = all_fields
        .iter()
        .copied()
        .filter(|field| field.is_active && field.applies_to(entity_kind))
        .collect();
    declared.sort_by(|a, b| a.code.cmp(&b.code));

    let mut values = BTreeMap::new();
    let mut pending = Vec::new();

    for field in &declared {
        let code = field.code.as_str();
        let supplied = submitted.get(code).filter(|value| !value.is_null());
        let fallback = field.default_value.as_ref().filter(|_| !field.required);
        let Some(value) = supplied.or(fallback) else {
            if field.required {
                return Err(FieldValidationError::MissingField(code.to_owned()));
            }
            continue;
        };

        let accepted = check_value(field, value)?;
        if let Some(reference) = reference_of(field, &accepted, config)? {
            pending.push(reference);
        }
        values.insert(code.to_owned(), accepted);
    }

    if mode == FieldMode::Strict {
        let known_elsewhere = |key: &str| {
            all_fields
                .iter()
                .any(|field| field.code == key && (!field.is_active || !field.applies_to(entity_kind)))
        };
        let unknown = submitted.keys().find(|key| {
            !values.contains_key(key.as_str())
                && !declared.iter().any(|field| field.code == key.as_str())
                && !known_elsewhere(key)
        });
        if let Some(key) = unknown {
            return Err(FieldValidationError::UnknownField(key.clone()));
        }
    }

    Ok(FieldValidation { values, pending })
}

/// Checks a single value against the field's kind and constraints,
/// returning the value to store.
///
/// # Errors
///
/// Returns [`FieldValidationError::TypeMismatch`] or
/// [`FieldValidationError::ConstraintViolation`].
pub fn check_value(
    field: &CustomFieldDefinition,
    value: &Value,
) -> Result<Value, FieldValidationError> {
    let code = field.code.as_str();
    let mismatch = || FieldValidationError::TypeMismatch {
        field: code.to_owned(),
        expected: field.field_kind,
        found: describe(value),
    };
    let violation = |reason: String| FieldValidationError::ConstraintViolation {
        field: code.to_owned(),
        reason,
    };

    match field.field_kind {
        FieldKind::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                return Err(mismatch());
            }
            check_range(field, value).map_err(violation)?;
        }
        FieldKind::Decimal => {
            if !value.is_number() {
                return Err(mismatch());
            }
            check_range(field, value).map_err(violation)?;
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return Err(mismatch());
            }
        }
        FieldKind::Text | FieldKind::Longtext => {
            let text = value.as_str().ok_or_else(mismatch)?;
            check_text(field, text).map_err(violation)?;
        }
        FieldKind::Enum => {
            let text = value.as_str().ok_or_else(mismatch)?;
            if !field.constraints.enum_values.iter().any(|allowed| allowed == text) {
                return Err(violation(format!(
                    "'{text}' is not one of [{}]",
                    field.constraints.enum_values.join(", ")
                )));
            }
        }
        FieldKind::Date => {
            let text = value.as_str().ok_or_else(mismatch)?;
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| violation(format!("'{text}' is not an ISO-8601 date")))?;
        }
        FieldKind::Datetime => {
            let text = value.as_str().ok_or_else(mismatch)?;
            DateTime::parse_from_rfc3339(text)
                .map_err(|_| violation(format!("'{text}' is not an ISO-8601 timestamp")))?;
        }
        FieldKind::Reference => {
            let text = value.as_str().ok_or_else(mismatch)?;
            if text.trim().is_empty() {
                return Err(violation("reference must not be blank".to_owned()));
            }
        }
    }

    Ok(value.clone())
}

fn check_range(field: &CustomFieldDefinition, value: &Value) -> Result<(), String> {
    let Some(number) = value.as_f64() else {
        return Err("value is not a finite number".to_owned());
    };
    if let Some(min) = field.constraints.min
        && number < min
    {
        return Err(format!("{value} is below the minimum {min}"));
    }
    if let Some(max) = field.constraints.max
        && number > max
    {
        return Err(format!("{value} is above the maximum {max}"));
    }
    Ok(())
}

fn check_text(field: &CustomFieldDefinition, text: &str) -> Result<(), String> {
    let length = text.chars().count();
    if let Some(min) = field.constraints.min_length
        && length < min
    {
        return Err(format!("length {length} is below the minimum {min}"));
    }
    if let Some(max) = field.constraints.max_length
        && length > max
    {
        return Err(format!("length {length} is above the maximum {max}"));
    }
    let pattern = field
        .compiled_pattern()
        .map_err(|err| format!("pattern does not compile: {err}"))?;
    if let Some(regex) = pattern
        && !regex.is_match(text)
    {
        return Err(format!("'{text}' does not match the required pattern"));
    }
    Ok(())
}

fn reference_of(
    field: &CustomFieldDefinition,
    value: &Value,
    config: &TenantConfiguration,
) -> Result<Option<PendingReference>, FieldValidationError> {
    let (Some(target), Some(id)) = (&field.constraints.reference, value.as_str()) else {
        return Ok(None);
    };
    match target {
        ReferenceTarget::Vocabulary(kind) => {
            let key = RowKey::new(*kind, id.trim().to_ascii_lowercase());
            let active = config.record(&key).is_some_and(|record| record.is_active());
            if active {
                Ok(None)
            } else {
                Err(FieldValidationError::ConstraintViolation {
                    field: field.code.to_string(),
                    reason: format!("{kind} '{id}' does not exist or is inactive"),
                })
            }
        }
        ReferenceTarget::Entity(entity) => Ok(Some(PendingReference {
            field: field.code.to_string(),
            entity: entity.clone(),
            id: id.to_owned(),
        })),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(_) => "a boolean".to_owned(),
        Value::Number(number) if number.is_f64() => "a fractional number".to_owned(),
        Value::Number(_) => "a number".to_owned(),
        Value::String(_) => "a string".to_owned(),
        Value::Array(_) => "an array".to_owned(),
        Value::Object(_) => "an object".to_owned(),
    }
}
