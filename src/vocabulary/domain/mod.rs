//! Domain model for tenant vocabularies.
//!
//! Typed configuration rows, the versioned [`TenantConfiguration`] snapshot,
//! mutations with their invariants, and seed documents.

mod error;
mod ids;
mod invariants;
mod kind;
mod mutation;
mod references;
mod rows;
mod seed;
mod snapshot;

pub use error::{ConfigError, VocabularyDomainError};
pub use ids::{Code, ConfigVersion, RowKey, TenantId};
pub use kind::VocabularyKind;
pub use mutation::Mutation;
pub use rows::{
    BudgetType, CampaignChannel, CampaignStatus, CampaignTemplate, CampaignType, Channel,
    ConfigRow, LeadSource, LeadSubSource, MilestoneStep, MilestoneTemplate, MilestoneType,
    NotificationChannel, NotificationType, PersistedRecordData, PriorityLevel, TaskStage,
    TaskStatus, TaskType, VocabularyRecord, VocabularyRow,
};
pub use seed::{SeedDocument, SeedDocumentError};
pub use snapshot::{KindSummary, PersistedConfigurationData, TenantConfiguration};

pub(crate) use mutation::{ApplyContext, apply_mutations};
pub(crate) use rows::{default_true, standard_row};
pub(crate) use seed::add_missing_rows;
pub(crate) use snapshot::sha256_hex;
