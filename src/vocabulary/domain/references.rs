//! Cross-row references between vocabulary rows.

use super::{ConfigRow, RowKey, VocabularyKind};

/// A reference from one row to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    /// Referenced row.
    pub target: RowKey,
    /// The target must be active when the referencing row is created or
    /// activated.
    pub require_active: bool,
    /// An active referencing row prevents the target's deactivation.
    pub blocks_deactivation: bool,
}

impl Reference {
    const fn existing(target: RowKey) -> Self {
        Self {
            target,
            require_active: false,
            blocks_deactivation: false,
        }
    }

    const fn active(target: RowKey) -> Self {
        Self {
            target,
            require_active: true,
            blocks_deactivation: false,
        }
    }

    const fn mandatory(target: RowKey) -> Self {
        Self {
            target,
            require_active: true,
            blocks_deactivation: true,
        }
    }
}

fn key(kind: VocabularyKind, code: &impl AsRef<str>) -> RowKey {
    RowKey::new(kind, code.as_ref())
}

/// Lists the rows `row` references.
pub(crate) fn references_of(row: &ConfigRow) -> Vec<Reference> {
    match row {
        ConfigRow::LeadSource(source) => source
            .parent_channel
            .iter()
            .map(|channel| Reference::existing(key(VocabularyKind::Channel, channel)))
            .collect(),
        ConfigRow::LeadSubSource(sub) => vec![Reference::active(key(
            VocabularyKind::LeadSource,
            &sub.parent_source,
        ))],
        ConfigRow::CampaignTemplate(template) => {
            let mut refs = vec![Reference::active(key(
                VocabularyKind::CampaignType,
                &template.campaign_type,
            ))];
            refs.extend(
                template
                    .default_channels
                    .iter()
                    .map(|channel| Reference::active(key(VocabularyKind::CampaignChannel, channel))),
            );
            refs
        }
        ConfigRow::MilestoneTemplate(template) => template
            .sequence
            .iter()
            .map(|step| Reference::mandatory(key(VocabularyKind::MilestoneType, &step.milestone_type)))
            .collect(),
        ConfigRow::TaskStage(stage) => {
            let mut refs: Vec<Reference> = stage
                .status_codes
                .iter()
                .map(|status| Reference::existing(key(VocabularyKind::TaskStatus, status)))
                .collect();
            refs.extend(
                stage
                    .auto_advance_to
                    .iter()
                    .map(|next| Reference::mandatory(key(VocabularyKind::TaskStage, next))),
            );
            refs
        }
        ConfigRow::TaskType(task_type) => task_type
            .default_priority
            .iter()
            .map(|priority| Reference::mandatory(key(VocabularyKind::PriorityLevel, priority)))
            .chain(
                task_type
                    .default_status
                    .iter()
                    .map(|status| Reference::mandatory(key(VocabularyKind::TaskStatus, status))),
            )
            .collect(),
        ConfigRow::CustomField(field) => field
            .visible_on_statuses
            .iter()
            .map(|status| Reference::existing(key(VocabularyKind::TaskStatus, status)))
            .collect(),
        ConfigRow::StatusTransition(edge) => vec![
            Reference::active(key(VocabularyKind::TaskStatus, &edge.from)),
            Reference::active(key(VocabularyKind::TaskStatus, &edge.to)),
        ],
        ConfigRow::AutomationRule(rule) => {
            let mut refs: Vec<Reference> = rule
                .referenced_statuses()
                .iter()
                .map(|status| Reference::mandatory(key(VocabularyKind::TaskStatus, status)))
                .collect();
            refs.extend(
                rule.trigger_params
                    .stage
                    .iter()
                    .map(|stage| Reference::mandatory(key(VocabularyKind::TaskStage, stage))),
            );
            refs.extend(
                rule.referenced_fields()
                    .iter()
                    .map(|field| Reference::mandatory(RowKey::new(VocabularyKind::CustomField, field))),
            );
            refs
        }
        ConfigRow::Channel(_)
        | ConfigRow::CampaignType(_)
        | ConfigRow::CampaignStatus(_)
        | ConfigRow::CampaignChannel(_)
        | ConfigRow::BudgetType(_)
        | ConfigRow::MilestoneType(_)
        | ConfigRow::TaskStatus(_)
        | ConfigRow::PriorityLevel(_)
        | ConfigRow::NotificationType(_) => Vec::new(),
    }
}
