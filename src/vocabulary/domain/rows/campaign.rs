//! Campaign customisation rows.

use super::default_true;
use crate::vocabulary::domain::Code;
use serde::{Deserialize, Serialize};

/// A campaign type with budget and duration guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignType {
    /// Unique campaign type code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Typical campaign length in days.
    #[serde(default)]
    pub typical_duration_days: Option<u32>,
    /// Lower budget bound; non-negative.
    #[serde(default)]
    pub min_budget: Option<f64>,
    /// Upper budget bound; not below `min_budget`.
    #[serde(default)]
    pub max_budget: Option<f64>,
    /// Whether new campaigns default to this type; at most one active default.
    #[serde(default)]
    pub is_default: bool,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CampaignType {
    /// Creates an active campaign type.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order: 0,
            typical_duration_days: None,
            min_budget: None,
            max_budget: None,
            is_default: false,
            is_active: true,
        }
    }
}

standard_row!(CampaignType, CampaignType);

/// A campaign lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStatus {
    /// Unique campaign status code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Whether new campaigns start here; at most one active initial status.
    #[serde(default)]
    pub is_initial: bool,
    /// Whether the status closes a campaign.
    #[serde(default)]
    pub is_final: bool,
    /// Whether the campaign may be edited in this status.
    #[serde(default = "default_true")]
    pub allows_editing: bool,
    /// Optional display colour.
    #[serde(default)]
    pub color_hex: Option<String>,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CampaignStatus {
    /// Creates an active, editable campaign status.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order: 0,
            is_initial: false,
            is_final: false,
            allows_editing: true,
            color_hex: None,
            is_active: true,
        }
    }
}

standard_row!(CampaignStatus, CampaignStatus);

/// A campaign delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignChannel {
    /// Unique campaign channel code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Identifier of the external integration delivering this channel.
    #[serde(default)]
    pub integration_key: Option<String>,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CampaignChannel {
    /// Creates an active campaign channel.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order: 0,
            integration_key: None,
            is_active: true,
        }
    }
}

standard_row!(CampaignChannel, CampaignChannel);

/// A campaign budget type denominated in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetType {
    /// Unique budget type code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// ISO-4217 currency code, three upper-case letters.
    pub currency: String,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl BudgetType {
    /// Creates an active budget type.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order: 0,
            currency: currency.into(),
            is_active: true,
        }
    }
}

standard_row!(BudgetType, BudgetType);

/// A reusable campaign blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignTemplate {
    /// Unique template code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Campaign type; must exist and be active when the template is created.
    pub campaign_type: Code,
    /// Channels pre-selected for campaigns built from this template.
    #[serde(default)]
    pub default_channels: Vec<Code>,
    /// Budget pre-filled for new campaigns; non-negative.
    #[serde(default)]
    pub default_budget: Option<f64>,
    /// Duration pre-filled for new campaigns.
    #[serde(default)]
    pub default_duration_days: Option<u32>,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CampaignTemplate {
    /// Creates an active template for the given campaign type.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>, campaign_type: Code) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            campaign_type,
            default_channels: Vec::new(),
            default_budget: None,
            default_duration_days: None,
            order: 0,
            is_active: true,
        }
    }
}

standard_row!(CampaignTemplate, CampaignTemplate);
