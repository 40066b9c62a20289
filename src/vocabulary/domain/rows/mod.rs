//! Typed configuration rows and the polymorphic [`ConfigRow`] union.
//!
//! Every vocabulary kind has one row type. The rows share a uniform shape
//! (key code, display name, order, active flag) exposed through
//! [`VocabularyRow`], so the store can treat the whole vocabulary as a single
//! table keyed by `(tenant, kind, code)`.

/// Implements [`VocabularyRow`] for rows carrying `code`, `display_name`,
/// `order` and `is_active` fields.
macro_rules! standard_row {
    ($ty:ty, $variant:ident) => {
        impl $crate::vocabulary::domain::VocabularyRow for $ty {
            const KIND: $crate::vocabulary::domain::VocabularyKind =
                $crate::vocabulary::domain::VocabularyKind::$variant;

            fn key_code(&self) -> String {
                self.code.as_str().to_owned()
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

            fn from_config_row(row: &$crate::vocabulary::domain::ConfigRow) -> Option<&Self> {
                match row {
                    $crate::vocabulary::domain::ConfigRow::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use standard_row;

mod campaign;
mod lead;
mod milestone;
mod task;

pub use campaign::{BudgetType, CampaignChannel, CampaignStatus, CampaignTemplate, CampaignType};
pub use lead::{Channel, LeadSource, LeadSubSource};
pub use milestone::{MilestoneStep, MilestoneTemplate, MilestoneType};
pub use task::{NotificationChannel, NotificationType, PriorityLevel, TaskStage, TaskStatus, TaskType};

use super::{ConfigError, ConfigVersion, RowKey, VocabularyKind};
use crate::automation::domain::AutomationRule;
use crate::custom_field::domain::CustomFieldDefinition;
use crate::workflow::domain::StatusTransition;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const fn default_true() -> bool {
    true
}

/// Uniform view over a typed vocabulary row.
pub trait VocabularyRow: Sized {
    /// Vocabulary kind this row type belongs to.
    const KIND: VocabularyKind;

    /// Returns the storage key code (see [`RowKey`]).
    fn key_code(&self) -> String;

    /// Returns the human-readable name.
    fn display_name(&self) -> &str;

    /// Returns the list position; ties are broken by creation order.
    fn order(&self) -> u32 {
        0
    }

    /// Returns whether the row is active.
    fn is_active(&self) -> bool;

    /// Sets the active flag. Kinds that cannot be deactivated ignore it.
    fn set_active(&mut self, active: bool);

    /// Borrows the typed row out of the union when the kind matches.
    fn from_config_row(row: &ConfigRow) -> Option<&Self>;

    /// Returns the storage key of this row.
    fn row_key(&self) -> RowKey {
        RowKey::new(Self::KIND, self.key_code())
    }
}

macro_rules! config_union {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// A configuration row of any vocabulary kind.
        ///
        /// Serialised with an internal `kind` tag; the untagged remainder is
        /// the row payload stored verbatim by persistence adapters.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind", rename_all = "snake_case")]
        pub enum ConfigRow {
            $(
                #[doc = concat!("A [`", stringify!($ty), "`] row.")]
                $variant($ty),
            )+
        }

        impl ConfigRow {
            /// Returns the vocabulary kind of the row.
            #[must_use]
            pub const fn kind(&self) -> VocabularyKind {
                match self {
                    $(Self::$variant(_) => VocabularyKind::$variant,)+
                }
            }

            /// Returns the storage key code.
            #[must_use]
            pub fn key_code(&self) -> String {
                match self {
                    $(Self::$variant(row) => row.key_code(),)+
                }
            }

            /// Returns the human-readable name.
            #[must_use]
            pub fn display_name(&self) -> &str {
                match self {
                    $(Self::$variant(row) => row.display_name(),)+
                }
            }

            /// Returns the list position.
            #[must_use]
            pub fn order(&self) -> u32 {
                match self {
                    $(Self::$variant(row) => row.order(),)+
                }
            }

            /// Returns whether the row is active.
            #[must_use]
            pub fn is_active(&self) -> bool {
                match self {
                    $(Self::$variant(row) => row.is_active(),)+
                }
            }

            pub(crate) fn set_active(&mut self, active: bool) {
                match self {
                    $(Self::$variant(row) => row.set_active(active),)+
                }
            }
        }

        $(
            impl From<$ty> for ConfigRow {
                fn from(row: $ty) -> Self {
                    Self::$variant(row)
                }
            }
        )+
    };
}

config_union! {
    Channel(Channel),
    LeadSource(LeadSource),
    LeadSubSource(LeadSubSource),
    CampaignType(CampaignType),
    CampaignStatus(CampaignStatus),
    CampaignChannel(CampaignChannel),
    BudgetType(BudgetType),
    CampaignTemplate(CampaignTemplate),
    MilestoneType(MilestoneType),
    MilestoneTemplate(MilestoneTemplate),
    TaskStatus(TaskStatus),
    TaskStage(TaskStage),
    PriorityLevel(PriorityLevel),
    TaskType(TaskType),
    NotificationType(NotificationType),
    CustomField(CustomFieldDefinition),
    StatusTransition(StatusTransition),
    AutomationRule(AutomationRule),
}

impl ConfigRow {
    /// Returns the storage key of the row.
    #[must_use]
    pub fn row_key(&self) -> RowKey {
        RowKey::new(self.kind(), self.key_code())
    }

    /// Serialises the row payload without the `kind` tag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when serialisation fails.
    pub fn to_payload(&self) -> Result<Value, ConfigError> {
        let mut value = serde_json::to_value(self)
            .map_err(|err| ConfigError::invalid(self.kind(), err.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.remove("kind");
        }
        Ok(value)
    }

    /// Rebuilds a row of `kind` from a stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the payload is not an
    /// object or does not describe a valid row of that kind.
    pub fn from_payload(kind: VocabularyKind, payload: Value) -> Result<Self, ConfigError> {
        let Value::Object(mut map) = payload else {
            return Err(ConfigError::invalid(kind, "row payload must be a JSON object"));
        };
        map.insert("kind".to_owned(), Value::String(kind.as_str().to_owned()));
        serde_json::from_value(Value::Object(map))
            .map_err(|err| ConfigError::invalid(kind, err.to_string()))
    }
}

/// A persisted configuration row with bookkeeping metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    row: ConfigRow,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sequence: u64,
    revision: ConfigVersion,
}

/// Parameters for reconstructing a record from storage.
#[derive(Debug, Clone)]
pub struct PersistedRecordData {
    /// The typed row.
    pub row: ConfigRow,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Tenant-wide insertion sequence, used to break creation-time ties.
    pub sequence: u64,
    /// Configuration version that last touched the row.
    pub revision: ConfigVersion,
}

impl VocabularyRecord {
    pub(crate) fn new(
        row: ConfigRow,
        timestamp: DateTime<Utc>,
        sequence: u64,
        revision: ConfigVersion,
    ) -> Self {
        let millis = timestamp.trunc_subsecs(3);
        Self {
            row,
            created_at: millis,
            updated_at: millis,
            sequence,
            revision,
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRecordData) -> Self {
        Self {
            row: data.row,
            created_at: data.created_at,
            updated_at: data.updated_at,
            sequence: data.sequence,
            revision: data.revision,
        }
    }

    /// Returns the typed row.
    #[must_use]
    pub const fn row(&self) -> &ConfigRow {
        &self.row
    }

    /// Returns the row's vocabulary kind.
    #[must_use]
    pub const fn kind(&self) -> VocabularyKind {
        self.row.kind()
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> RowKey {
        self.row.row_key()
    }

    /// Returns whether the row is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.row.is_active()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the tenant-wide insertion sequence.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the configuration version that last touched the row.
    #[must_use]
    pub const fn revision(&self) -> ConfigVersion {
        self.revision
    }

    /// Borrows the typed row when it has kind `R`.
    #[must_use]
    pub fn typed<R: VocabularyRow>(&self) -> Option<&R> {
        R::from_config_row(&self.row)
    }

    pub(crate) fn replace_row(
        &mut self,
        row: ConfigRow,
        timestamp: DateTime<Utc>,
        revision: ConfigVersion,
    ) {
        self.row = row;
        self.touch(timestamp, revision);
    }

    pub(crate) fn set_active(
        &mut self,
        active: bool,
        timestamp: DateTime<Utc>,
        revision: ConfigVersion,
    ) {
        self.row.set_active(active);
        self.touch(timestamp, revision);
    }

    /// Timestamps are kept at millisecond precision.
    fn touch(&mut self, timestamp: DateTime<Utc>, revision: ConfigVersion) {
        self.updated_at = timestamp.trunc_subsecs(3);
        self.revision = revision;
    }

    /// Sort key implementing list order: `order`, then creation time, then
    /// insertion sequence.
    pub(crate) fn list_order(&self) -> (u32, DateTime<Utc>, u64) {
        (self.row.order(), self.created_at, self.sequence)
    }
}
