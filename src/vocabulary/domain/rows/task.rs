//! Task vocabulary rows: statuses, stages, types, priorities and
//! notification types.

use super::default_true;
use crate::vocabulary::domain::Code;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_color() -> String {
    "#6b7280".to_owned()
}

/// A task status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Unique status code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Display colour as `#rrggbb`.
    #[serde(default = "default_color")]
    pub color_hex: String,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Whether new tasks start in this status.
    #[serde(default)]
    pub is_default: bool,
    /// Whether the status closes a task.
    #[serde(default)]
    pub is_terminal: bool,
    /// Whether tasks in this status are blocked on something external.
    #[serde(default)]
    pub is_blocking: bool,
    /// Whether task fields may be edited in this status.
    #[serde(default = "default_true")]
    pub allows_editing: bool,
    /// Whether the task may be reassigned in this status.
    #[serde(default = "default_true")]
    pub allows_reassignment: bool,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl TaskStatus {
    /// Creates an active, non-terminal status at order 0.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            description: None,
            color_hex: default_color(),
            order: 0,
            is_default: false,
            is_terminal: false,
            is_blocking: false,
            allows_editing: true,
            allows_reassignment: true,
            is_active: true,
        }
    }

    /// Sets the list position.
    #[must_use]
    pub const fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Marks the status as terminal.
    #[must_use]
    pub const fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }

    /// Marks the status as the tenant default.
    #[must_use]
    pub const fn default_status(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Sets the display colour.
    #[must_use]
    pub fn with_color(mut self, color_hex: impl Into<String>) -> Self {
        self.color_hex = color_hex.into();
        self
    }
}

standard_row!(TaskStatus, TaskStatus);

/// A stage grouping task statuses.
///
/// The status-to-stage mapping lives on the stage: every status listed in
/// `status_codes` belongs to this stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStage {
    /// Unique stage code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Stage position; unique among active stages.
    #[serde(default)]
    pub order: u32,
    /// Statuses grouped under this stage.
    #[serde(default)]
    pub status_codes: Vec<Code>,
    /// Service-level target for time spent in the stage.
    #[serde(default)]
    pub sla_minutes: Option<u32>,
    /// Minimum expected duration.
    #[serde(default)]
    pub min_duration_hours: Option<u32>,
    /// Maximum expected duration.
    #[serde(default)]
    pub max_duration_hours: Option<u32>,
    /// Stage a task advances to automatically once this one completes.
    #[serde(default)]
    pub auto_advance_to: Option<Code>,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl TaskStage {
    /// Creates an active stage grouping the given statuses.
    #[must_use]
    pub fn new(
        code: Code,
        display_name: impl Into<String>,
        order: u32,
        status_codes: impl IntoIterator<Item = Code>,
    ) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            order,
            status_codes: status_codes.into_iter().collect(),
            sla_minutes: None,
            min_duration_hours: None,
            max_duration_hours: None,
            auto_advance_to: None,
            is_active: true,
        }
    }
}

standard_row!(TaskStage, TaskStage);

/// A task type with default priority and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType {
    /// Unique type code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority assigned to new tasks of this type.
    #[serde(default)]
    pub default_priority: Option<Code>,
    /// Status assigned to new tasks of this type.
    #[serde(default)]
    pub default_status: Option<Code>,
    /// Days until a new task of this type is due.
    #[serde(default)]
    pub default_due_days: Option<u32>,
    /// Whether tasks of this type relate to a lead.
    #[serde(default)]
    pub is_lead_related: bool,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl TaskType {
    /// Creates an active task type without defaults.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            description: None,
            default_priority: None,
            default_status: None,
            default_due_days: None,
            is_lead_related: false,
            order: 0,
            is_active: true,
        }
    }

    /// Sets the default priority code.
    #[must_use]
    pub fn with_default_priority(mut self, priority: Code) -> Self {
        self.default_priority = Some(priority);
        self
    }

    /// Sets the default status code.
    #[must_use]
    pub fn with_default_status(mut self, status: Code) -> Self {
        self.default_status = Some(status);
        self
    }
}

standard_row!(TaskType, TaskType);

/// A priority level; a higher weight means a higher priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityLevel {
    /// Unique priority code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Relative weight; unique among active priorities.
    pub weight: i32,
    /// Overall service-level target in hours.
    #[serde(default)]
    pub sla_hours: Option<u32>,
    /// Target hours until first response.
    #[serde(default)]
    pub sla_response_hours: Option<u32>,
    /// Target hours until resolution.
    #[serde(default)]
    pub sla_resolution_hours: Option<u32>,
    /// Whether breaching the target escalates the task.
    #[serde(default)]
    pub escalation_enabled: bool,
    /// Optional display colour.
    #[serde(default)]
    pub color_hex: Option<String>,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl PriorityLevel {
    /// Creates an active priority with the given weight.
    #[must_use]
    pub fn new(code: Code, display_name: impl Into<String>, weight: i32) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            weight,
            sla_hours: None,
            sla_response_hours: None,
            sla_resolution_hours: None,
            escalation_enabled: false,
            color_hex: None,
            order: 0,
            is_active: true,
        }
    }
}

standard_row!(PriorityLevel, PriorityLevel);

/// Delivery channel of a notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationChannel {
    /// E-mail delivery.
    Email,
    /// SMS delivery.
    Sms,
    /// Mobile push delivery.
    Push,
    /// In-application inbox.
    InApp,
}

impl NotificationChannel {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
            Self::InApp => "in-app",
        }
    }
}

/// A notification type and the channels it is delivered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationType {
    /// Unique notification type code.
    pub code: Code,
    /// Human-readable name.
    pub display_name: String,
    /// Delivery channels; at least one while active.
    #[serde(default)]
    pub channels: BTreeSet<NotificationChannel>,
    /// Template used when no other template is named.
    #[serde(default)]
    pub default_template_id: Option<String>,
    /// Grouping category.
    #[serde(default)]
    pub category: Option<String>,
    /// Whether recipients may dismiss the notification.
    #[serde(default = "default_true")]
    pub is_dismissable: bool,
    /// Days after which the notification is archived.
    #[serde(default)]
    pub auto_archive_days: Option<u32>,
    /// List position.
    #[serde(default)]
    pub order: u32,
    /// Soft-deactivation flag.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NotificationType {
    /// Creates an active notification type on the given channels.
    #[must_use]
    pub fn new(
        code: Code,
        display_name: impl Into<String>,
        channels: impl IntoIterator<Item = NotificationChannel>,
    ) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            channels: channels.into_iter().collect(),
            default_template_id: None,
            category: None,
            is_dismissable: true,
            auto_archive_days: None,
            order: 0,
            is_active: true,
        }
    }
}

standard_row!(NotificationType, NotificationType);
