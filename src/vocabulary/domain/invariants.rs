//! Per-row and whole-configuration invariants.

use super::{
    CampaignStatus, CampaignType, Code, ConfigError, ConfigRow, LeadSource, MilestoneTemplate,
    PriorityLevel, TaskStage, TaskStatus, TenantConfiguration, VocabularyKind,
};
use crate::workflow::domain::StatusTransition;
use std::collections::{BTreeMap, BTreeSet};

/// Checks the invariants a row must satisfy on its own.
pub(crate) fn validate_row(row: &ConfigRow, max_actions: usize) -> Result<(), ConfigError> {
    let kind = row.kind();
    let invalid = |reason: String| ConfigError::invalid(kind, reason);

    if !kind.is_edge() && row.display_name().trim().is_empty() {
        return Err(invalid(format!("'{}' needs a display name", row.key_code())));
    }

    match row {
        ConfigRow::TaskStatus(status) => {
            check_color(Some(status.color_hex.as_str())).map_err(invalid)
        }
        ConfigRow::TaskStage(stage) => {
            check_bounds(stage.min_duration_hours, stage.max_duration_hours, "duration hours")
                .map_err(invalid)?;
            if stage.auto_advance_to.as_ref() == Some(&stage.code) {
                return Err(invalid(format!("stage '{}' cannot advance to itself", stage.code)));
            }
            check_unique(stage.status_codes.iter().map(Code::as_str), "status").map_err(invalid)
        }
        ConfigRow::PriorityLevel(priority) => {
            check_bounds(
                priority.sla_response_hours,
                priority.sla_resolution_hours,
                "SLA response/resolution hours",
            )
            .map_err(invalid)?;
            check_color(priority.color_hex.as_deref()).map_err(invalid)
        }
        ConfigRow::NotificationType(notification) => {
            if notification.is_active && notification.channels.is_empty() {
                return Err(invalid(format!(
                    "active notification type '{}' needs at least one channel",
                    notification.code
                )));
            }
            Ok(())
        }
        ConfigRow::CustomField(field) => field.validate(),
        ConfigRow::StatusTransition(edge) => edge.validate(),
        ConfigRow::AutomationRule(rule) => rule.validate(max_actions),
        ConfigRow::LeadSubSource(sub) => {
            check_amount(sub.cost_per_lead, "cost per lead").map_err(invalid)
        }
        ConfigRow::CampaignType(campaign_type) => {
            check_amount(campaign_type.min_budget, "minimum budget").map_err(invalid)?;
            check_amount(campaign_type.max_budget, "maximum budget").map_err(invalid)?;
            if let (Some(min), Some(max)) = (campaign_type.min_budget, campaign_type.max_budget)
                && min > max
            {
                return Err(invalid(format!(
                    "minimum budget {min} exceeds maximum budget {max}"
                )));
            }
            Ok(())
        }
        ConfigRow::CampaignStatus(status) => {
            if status.is_initial && status.is_final {
                return Err(invalid(format!(
                    "campaign status '{}' cannot be both initial and final",
                    status.code
                )));
            }
            check_color(status.color_hex.as_deref()).map_err(invalid)
        }
        ConfigRow::BudgetType(budget) => {
            let valid = budget.currency.len() == 3
                && budget.currency.chars().all(|c| c.is_ascii_uppercase());
            if valid {
                Ok(())
            } else {
                Err(invalid(format!(
                    "currency '{}' is not an ISO-4217 code",
                    budget.currency
                )))
            }
        }
        ConfigRow::CampaignTemplate(template) => {
            check_amount(template.default_budget, "default budget").map_err(invalid)?;
            check_unique(
                template.default_channels.iter().map(Code::as_str),
                "default channel",
            )
            .map_err(invalid)
        }
        ConfigRow::MilestoneTemplate(template) => {
            if template.sequence.is_empty() {
                return Err(invalid(format!(
                    "milestone template '{}' needs at least one step",
                    template.code
                )));
            }
            let increasing = template
                .sequence
                .windows(2)
                .all(|pair| matches!(pair, [a, b] if a.order < b.order));
            if increasing {
                Ok(())
            } else {
                Err(invalid(format!(
                    "milestone template '{}' step order must be strictly increasing",
                    template.code
                )))
            }
        }
        ConfigRow::Channel(_)
        | ConfigRow::LeadSource(_)
        | ConfigRow::CampaignChannel(_)
        | ConfigRow::MilestoneType(_)
        | ConfigRow::TaskType(_) => Ok(()),
    }
}

/// Checks invariants spanning several rows of the final configuration.
pub(crate) fn validate_configuration(config: &TenantConfiguration) -> Result<(), ConfigError> {
    at_most_one(
        VocabularyKind::TaskStatus,
        "default status",
        config.rows::<TaskStatus>(false).iter().filter(|s| s.is_default).map(|s| s.code.as_str()),
    )?;
    at_most_one(
        VocabularyKind::LeadSource,
        "default lead source",
        config.rows::<LeadSource>(false).iter().filter(|s| s.is_default).map(|s| s.code.as_str()),
    )?;
    at_most_one(
        VocabularyKind::CampaignType,
        "default campaign type",
        config.rows::<CampaignType>(false).iter().filter(|t| t.is_default).map(|t| t.code.as_str()),
    )?;
    at_most_one(
        VocabularyKind::CampaignStatus,
        "initial campaign status",
        config
            .rows::<CampaignStatus>(false)
            .iter()
            .filter(|s| s.is_initial)
            .map(|s| s.code.as_str()),
    )?;

    let mut template_defaults: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for template in config.rows::<MilestoneTemplate>(false) {
        if template.is_default {
            template_defaults
                .entry(template.template_type.as_str())
                .or_default()
                .push(template.code.as_str());
        }
    }
    for (template_type, codes) in template_defaults {
        at_most_one(
            VocabularyKind::MilestoneTemplate,
            &format!("default {template_type} template"),
            codes.into_iter(),
        )?;
    }

    check_terminal_edges(config)?;
    check_stage_mapping(config)?;
    check_priority_weights(config)
}

fn check_terminal_edges(config: &TenantConfiguration) -> Result<(), ConfigError> {
    let terminal: BTreeSet<&str> = config
        .rows::<TaskStatus>(true)
        .into_iter()
        .filter(|status| status.is_terminal)
        .map(|status| status.code.as_str())
        .collect();
    if let Some(edge) = config
        .rows::<StatusTransition>(true)
        .into_iter()
        .find(|edge| terminal.contains(edge.from.as_str()))
    {
        return Err(ConfigError::invalid(
            VocabularyKind::TaskStatus,
            format!(
                "terminal status '{}' has an outgoing transition to '{}'",
                edge.from, edge.to
            ),
        ));
    }
    Ok(())
}

fn check_stage_mapping(config: &TenantConfiguration) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::invalid(VocabularyKind::TaskStage, reason);
    let stages = config.rows::<TaskStage>(false);
    if stages.is_empty() {
        return Ok(());
    }

    let mut orders = BTreeSet::new();
    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for stage in &stages {
        if !orders.insert(stage.order) {
            return Err(invalid(format!(
                "active stages must have distinct orders; {} is repeated",
                stage.order
            )));
        }
        for status in &stage.status_codes {
            if let Some(previous) = owner.insert(status.as_str(), stage.code.as_str()) {
                return Err(invalid(format!(
                    "status '{status}' is mapped by both '{previous}' and '{}'",
                    stage.code
                )));
            }
        }
    }

    if let Some(unmapped) = config
        .rows::<TaskStatus>(false)
        .into_iter()
        .find(|status| !owner.contains_key(status.code.as_str()))
    {
        return Err(invalid(format!(
            "active status '{}' is not mapped to an active stage",
            unmapped.code
        )));
    }
    Ok(())
}

fn check_priority_weights(config: &TenantConfiguration) -> Result<(), ConfigError> {
    let mut weights = BTreeMap::new();
    for priority in config.rows::<PriorityLevel>(false) {
        if let Some(previous) = weights.insert(priority.weight, priority.code.as_str()) {
            return Err(ConfigError::invalid(
                VocabularyKind::PriorityLevel,
                format!(
                    "priorities '{previous}' and '{}' share weight {}",
                    priority.code, priority.weight
                ),
            ));
        }
    }
    Ok(())
}

fn at_most_one<'a>(
    kind: VocabularyKind,
    what: &str,
    mut codes: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    match (codes.next(), codes.next()) {
        (Some(first), Some(second)) => Err(ConfigError::invalid(
            kind,
            format!("at most one {what} allowed, found '{first}' and '{second}'"),
        )),
        _ => Ok(()),
    }
}

fn check_color(color: Option<&str>) -> Result<(), String> {
    let Some(hex) = color else {
        return Ok(());
    };
    let digits = hex.strip_prefix('#').unwrap_or_default();
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(format!("'{hex}' is not a hex colour"))
    }
}

fn check_bounds(min: Option<u32>, max: Option<u32>, what: &str) -> Result<(), String> {
    if let (Some(low), Some(high)) = (min, max)
        && low > high
    {
        return Err(format!("minimum {what} {low} exceeds maximum {high}"));
    }
    Ok(())
}

fn check_amount(amount: Option<f64>, what: &str) -> Result<(), String> {
    if let Some(value) = amount
        && (!value.is_finite() || value < 0.0)
    {
        return Err(format!("{what} must be a non-negative number, got {value}"));
    }
    Ok(())
}

fn check_unique<'a>(values: impl Iterator<Item = &'a str>, what: &str) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(format!("{what} '{value}' is listed twice"));
        }
    }
    Ok(())
}
