//! Sales milestone rows.

use super::default_true;
use crate::vocabulary::domain::Code;
use serde::{Deserialize, Serialize};

/// A milestone in a sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneType {
    /// Unique milestone type code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Whether reaching the milestone closes the pipeline.
    #[serde(default)]
    pub is_terminal: bool,
    /// Expected days to reach the milestone.
    #[serde(default)]
    pub expected_duration_days: Option<u32>,
    /// Grouping category (for example `booking` or `payment`).
    #[serde(default)]
    pub category: Option<String>,
    /// Service-level target in days.
    #[serde(default)]
    pub sla_days: Option<u32>,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MilestoneType {
    /// Creates an active, non-terminal milestone type.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order: 0,
            is_terminal: false,
            expected_duration_days: None,
            category: None,
            sla_days: None,
            is_active: true,
        }
    }
}

standard_row!(MilestoneType, MilestoneType);

/// One entry of a milestone template sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneStep {
    /// Referenced milestone type.
    pub milestone_type: Code,
    /// Position in the sequence; strictly increasing.
    pub order: u32,
}

impl MilestoneStep {
    /// Creates a sequence entry.
    #[must_use]
    pub const fn new(milestone_type: Code, order: u32) -> Self {
        Self {
            milestone_type,
            order,
        }
    }
}

/// An ordered sequence of milestone types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTemplate {
    /// Unique template identifier.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Pipeline this template applies to (for example `residential`).
    pub template_type: String,
    /// Ordered milestones; non-empty.
    pub sequence: Vec<MilestoneStep>,
    /// Whether the template is the default for its type; at most one active
    /// default per template type.
    #[serde(default)]
    pub is_default: bool,
    /// Estimated days to complete the whole sequence.
    #[serde(default)]
    pub estimated_days: Option<u32>,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MilestoneTemplate {
    /// Creates an active template with the given sequence.
    #[must_use]
    pub fn new(
        code: Code,
        display_name: impl Into<String>,
        template_type: impl Into<String>,
        sequence: impl IntoIterator<Item = MilestoneStep>,
    ) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            template_type: template_type.into(),
            sequence: sequence.into_iter().collect(),
            is_default: false,
            estimated_days: None,
            order: 0,
            is_active: true,
        }
    }
}

standard_row!(MilestoneTemplate, MilestoneTemplate);
