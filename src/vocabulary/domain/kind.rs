//! Vocabulary dimensions.

use super::VocabularyDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension of a tenant's configurable vocabulary.
///
/// [`VocabularyKind::ALL`] lists kinds in dependency order: a kind only
/// references kinds that appear before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
    /// Lead categorisation channel.
    Channel,
    /// Lead source, optionally under a channel.
    LeadSource,
    /// Lead subsource under a source.
    LeadSubSource,
    /// Campaign type.
    CampaignType,
    /// Campaign status.
    CampaignStatus,
    /// Campaign delivery channel.
    CampaignChannel,
    /// Campaign budget type.
    BudgetType,
    /// Campaign template.
    CampaignTemplate,
    /// Sales milestone type.
    MilestoneType,
    /// Ordered milestone template.
    MilestoneTemplate,
    /// Task status.
    TaskStatus,
    /// Task stage grouping statuses.
    TaskStage,
    /// Task priority level.
    PriorityLevel,
    /// Task type.
    TaskType,
    /// Notification type.
    NotificationType,
    /// Custom field declaration.
    CustomField,
    /// Edge of the task-status transition graph.
    StatusTransition,
    /// Automation rule.
    AutomationRule,
}

impl VocabularyKind {
    /// Every kind, in dependency order.
    pub const ALL: [Self; 18] = [
        Self::Channel,
        Self::LeadSource,
        Self::LeadSubSource,
        Self::CampaignType,
        Self::CampaignStatus,
        Self::CampaignChannel,
        Self::BudgetType,
        Self::CampaignTemplate,
        Self::MilestoneType,
        Self::MilestoneTemplate,
        Self::TaskStatus,
        Self::TaskStage,
        Self::PriorityLevel,
        Self::TaskType,
        Self::NotificationType,
        Self::CustomField,
        Self::StatusTransition,
        Self::AutomationRule,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::LeadSource => "lead_source",
            Self::LeadSubSource => "lead_sub_source",
            Self::CampaignType => "campaign_type",
            Self::CampaignStatus => "campaign_status",
            Self::CampaignChannel => "campaign_channel",
            Self::BudgetType => "budget_type",
            Self::CampaignTemplate => "campaign_template",
            Self::MilestoneType => "milestone_type",
            Self::MilestoneTemplate => "milestone_template",
            Self::TaskStatus => "task_status",
            Self::TaskStage => "task_stage",
            Self::PriorityLevel => "priority_level",
            Self::TaskType => "task_type",
            Self::NotificationType => "notification_type",
            Self::CustomField => "custom_field",
            Self::StatusTransition => "status_transition",
            Self::AutomationRule => "automation_rule",
        }
    }

    /// Returns `true` for kinds whose rows are never soft-deactivated.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        matches!(self, Self::StatusTransition)
    }
}

impl fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for VocabularyKind {
    type Error = VocabularyDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| VocabularyDomainError::UnknownKind(value.to_owned()))
    }
}
