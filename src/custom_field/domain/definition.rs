//! Custom field declarations.

use super::{FieldValidationError, check_value};
use crate::vocabulary::domain::{Code, ConfigError, VocabularyKind, default_true, standard_row};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Value type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Longtext,
    /// Whole number.
    Integer,
    /// Any number.
    Decimal,
    /// `true` or `false`.
    Boolean,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    Date,
    /// RFC 3339 timestamp.
    Datetime,
    /// One of a declared set of strings.
    Enum,
    /// Identifier of a vocabulary row or business entity.
    Reference,
}

impl FieldKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Longtext => "longtext",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Enum => "enum",
            Self::Reference => "reference",
        }
    }

    const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    const fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Longtext)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a reference field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTarget {
    /// A row of the tenant's own vocabulary, checked against the snapshot.
    Vocabulary(VocabularyKind),
    /// A business entity kind, checked through the reference resolver.
    Entity(String),
}

/// Kind-specific constraints of a custom field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// Inclusive lower bound for numeric fields.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper bound for numeric fields.
    #[serde(default)]
    pub max: Option<f64>,
    /// Minimum character count for text fields.
    #[serde(default)]
    pub min_length: Option<usize>,
    /// Maximum character count for text fields.
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Regular expression the whole text value must match.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Allowed values of an enum field.
    #[serde(default)]
    pub enum_values: Vec<String>,
    /// Target of a reference field.
    #[serde(default)]
    pub reference: Option<ReferenceTarget>,
}

fn default_applies_to() -> Vec<String> {
    vec!["task".to_owned()]
}

/// A typed attribute attachable to task-like entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    /// Unique field code; also the key in submitted value maps.
    pub code: Code,
    /// Human-readable label.
    pub display_name: String,
    /// Value type.
    pub field_kind: FieldKind,
    /// Whether a value must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Value applied when none is supplied.
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Kind-specific constraints.
    #[serde(default)]
    pub constraints: FieldConstraints,
    /// Entity kinds the field attaches to.
    #[serde(default = "default_applies_to")]
    pub applies_to: Vec<String>,
    /// List and form position.
    #[serde(default)]
    pub order: u32,
    /// Statuses on which the field is shown; empty means all.
    #[serde(default)]
    pub visible_on_statuses: Vec<Code>,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

standard_row!(CustomFieldDefinition, CustomField);

impl CustomFieldDefinition {
    /// Creates an optional, active field attached to tasks.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>, field_kind: FieldKind) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            field_kind,
            required: false,
            default_value: None,
            constraints: FieldConstraints::default(),
            applies_to: default_applies_to(),
            order: 0,
            visible_on_statuses: Vec::new(),
            is_active: true,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the inclusive numeric range.
    #[must_use]
    pub const fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.min = min;
        self.constraints.max = max;
        self
    }

    /// Sets the allowed enum values.
    #[must_use]
    pub fn with_enum_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.constraints.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the text pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Sets the reference target.
    #[must_use]
    pub fn with_reference(mut self, target: ReferenceTarget) -> Self {
        self.constraints.reference = Some(target);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Sets the entity kinds the field attaches to.
    #[must_use]
    pub fn applying_to(mut self, kinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.applies_to = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether the field attaches to `entity_kind`.
    #[must_use]
    pub fn applies_to(&self, entity_kind: &str) -> bool {
        self.applies_to.iter().any(|kind| kind == entity_kind)
    }

    /// Compiles the anchored text pattern, if any.
    ///
    /// # Errors
    ///
    /// Returns the regex error when the pattern does not compile.
    pub fn compiled_pattern(&self) -> Result<Option<Regex>, regex::Error> {
        self.constraints
            .pattern
            .as_deref()
            .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
            .transpose()
    }

    /// Checks that the constraints are coherent with the field kind and that
    /// the default value satisfies them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] describing the first
    /// incoherence found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_coherence()
            .map_err(|reason| ConfigError::invalid(VocabularyKind::CustomField, reason))
    }

    fn check_coherence(&self) -> Result<(), String> {
        let kind = self.field_kind;
        let constraints = &self.constraints;
        let code = &self.code;

        if self.applies_to.is_empty() || self.applies_to.iter().any(|k| k.trim().is_empty()) {
            return Err(format!("field '{code}' must apply to at least one entity kind"));
        }

        let has_range = constraints.min.is_some() || constraints.max.is_some();
        if has_range && !kind.is_numeric() {
            return Err(format!("field '{code}': min/max only apply to numeric kinds"));
        }
        if let (Some(min), Some(max)) = (constraints.min, constraints.max)
            && min > max
        {
            return Err(format!("field '{code}': min {min} exceeds max {max}"));
        }

        let has_text_rules = constraints.min_length.is_some()
            || constraints.max_length.is_some()
            || constraints.pattern.is_some();
        if has_text_rules && !kind.is_textual() {
            return Err(format!(
                "field '{code}': length and pattern only apply to text kinds"
            ));
        }
        if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length)
            && min > max
        {
            return Err(format!(
                "field '{code}': min_length {min} exceeds max_length {max}"
            ));
        }
        self.compiled_pattern()
            .map_err(|err| format!("field '{code}': invalid pattern: {err}"))?;

        match (kind, constraints.enum_values.is_empty()) {
            (FieldKind::Enum, true) => {
                return Err(format!("enum field '{code}' needs enum_values"));
            }
            (FieldKind::Enum, false) => {
                let unique: BTreeSet<&String> = constraints.enum_values.iter().collect();
                if unique.len() != constraints.enum_values.len() {
                    return Err(format!("enum field '{code}' repeats a value"));
                }
            }
            (_, false) => {
                return Err(format!("field '{code}': enum_values only apply to enum fields"));
            }
            (_, true) => {}
        }

        match (&constraints.reference, kind) {
            (None, FieldKind::Reference) => {
                return Err(format!("reference field '{code}' must name its target"));
            }
            (Some(ReferenceTarget::Entity(entity)), FieldKind::Reference)
                if entity.trim().is_empty() =>
            {
                return Err(format!("reference field '{code}' names an empty entity kind"));
            }
            (Some(_), other) if other != FieldKind::Reference => {
                return Err(format!("field '{code}': only reference fields name a target"));
            }
            _ => {}
        }

        if let Some(default) = &self.default_value {
            if kind == FieldKind::Reference {
                return Err(format!("reference field '{code}' cannot carry a default"));
            }
            check_value(self, default).map_err(|err: FieldValidationError| {
                format!("default of field '{code}' is invalid: {err}")
            })?;
        }

        Ok(())
    }
}
