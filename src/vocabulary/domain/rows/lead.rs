//! Lead categorisation rows: channels, sources and subsources.

use super::{VocabularyRow, default_true};
use crate::vocabulary::domain::{Code, ConfigRow, RowKey, VocabularyKind};
use serde::{Deserialize, Serialize};

/// A lead channel (for example `digital` or `referral`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique channel code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Channel {
    /// Creates an active channel.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order: 0,
            is_active: true,
        }
    }
}

standard_row!(Channel, Channel);

/// A lead source such as `google` or `walk_in`.
///
/// Deactivating a source keeps it available for historical aggregation; it
/// only stops new subsources from being attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSource {
    /// Unique source code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Channel this source belongs to.
    #[serde(default)]
    pub parent_channel: Option<Code>,
    /// Key under which analytics aggregate leads from this source.
    #[serde(default)]
    pub analytics_key: Option<String>,
    /// Free-form source category (for example `paid` or `organic`).
    #[serde(default)]
    pub source_type: Option<String>,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Whether leads default to this source; at most one active default.
    #[serde(default)]
    pub is_default: bool,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl LeadSource {
    /// Creates an active lead source.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            parent_channel: None,
            analytics_key: None,
            source_type: None,
            order: 0,
            is_default: false,
            is_active: true,
        }
    }

    /// Attaches the source to a channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Code) -> Self {
        self.parent_channel = Some(channel);
        self
    }

    /// Returns the analytics key, falling back to the code.
    #[must_use]
    pub fn effective_analytics_key(&self) -> &str {
        self.analytics_key
            .as_deref()
            .unwrap_or_else(|| self.code.as_str())
    }
}

standard_row!(LeadSource, LeadSource);

/// A subsource under a lead source, keyed `parent/code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadSubSource {
    /// Subsource code, unique under its parent.
    pub code: Code,
    /// Parent lead source.
    pub parent_source: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Acquisition cost per lead; non-negative.
    #[serde(default)]
    pub cost_per_lead: Option<f64>,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl LeadSubSource {
    /// Creates an active subsource under `parent_source`.
    #[must_use]
    pub fn new(parent_source: Code, code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            parent_source,
            display_name: display_name.into(),
            order: 0,
            cost_per_lead: None,
            is_active: true,
        }
    }
}

impl VocabularyRow for LeadSubSource {
    const KIND: VocabularyKind = VocabularyKind::LeadSubSource;

    fn key_code(&self) -> String {
        RowKey::subsource(&self.parent_source, &self.code)
            .code()
            .to_owned()
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    fn from_config_row(row: &ConfigRow) -> Option<&Self> {
        match row {
            ConfigRow::LeadSubSource(inner) => Some(inner),
            _ => None,
        }
    }
}
