//! Immutable, versioned view of a tenant's configuration.

use super::{
    ConfigRow, ConfigVersion, PriorityLevel, RowKey, TaskStage, TaskStatus, TenantId,
    VocabularyKind, VocabularyRecord, VocabularyRow,
};
use crate::automation::domain::AutomationRule;
use crate::custom_field::domain::CustomFieldDefinition;
use crate::workflow::domain::StatusTransition;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Every row of one tenant at one configuration version.
///
/// Snapshots are never mutated once handed out; the store builds a new one
/// per commit. Version 0 denotes a tenant that has never been written.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantConfiguration {
    tenant_id: TenantId,
    version: ConfigVersion,
    records: BTreeMap<RowKey, VocabularyRecord>,
    next_sequence: u64,
}

/// Parameters for reconstructing a snapshot from storage.
#[derive(Debug, Clone)]
pub struct PersistedConfigurationData {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Stored configuration version.
    pub version: ConfigVersion,
    /// Every stored row, active or not.
    pub records: Vec<VocabularyRecord>,
}

/// Active and inactive row counts of one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    /// Number of active rows.
    pub active: usize,
    /// Number of inactive rows.
    pub inactive: usize,
}

impl TenantConfiguration {
    /// Creates the empty, never-written configuration of a tenant.
    #[must_use]
    pub const fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            version: ConfigVersion::UNWRITTEN,
            records: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Reconstructs a snapshot from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedConfigurationData) -> Self {
        let next_sequence = data
            .records
            .iter()
            .map(|record| record.sequence().saturating_add(1))
            .max()
            .unwrap_or(0);
        let records = data
            .records
            .into_iter()
            .map(|record| (record.key(), record))
            .collect();
        Self {
            tenant_id: data.tenant_id,
            version: data.version,
            records,
            next_sequence,
        }
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the configuration version.
    #[must_use]
    pub const fn version(&self) -> ConfigVersion {
        self.version
    }

    /// Returns whether the tenant has ever been written.
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.version.value() > 0
    }

    /// Returns every record in key order.
    pub fn records(&self) -> impl Iterator<Item = &VocabularyRecord> {
        self.records.values()
    }

    /// Returns the record stored under `key`, active or not.
    #[must_use]
    pub fn record(&self, key: &RowKey) -> Option<&VocabularyRecord> {
        self.records.get(key)
    }

    /// Returns whether an active record is stored under `key`.
    #[must_use]
    pub fn is_active(&self, key: &RowKey) -> bool {
        self.record(key).is_some_and(VocabularyRecord::is_active)
    }

    /// Returns the records of `kind` in list order (`order`, then creation).
    #[must_use]
    pub fn records_of(&self, kind: VocabularyKind, include_inactive: bool) -> Vec<&VocabularyRecord> {
        let mut records: Vec<&VocabularyRecord> = self
            .records
            .values()
            .filter(|record| record.kind() == kind)
            .filter(|record| include_inactive || record.is_active())
            .collect();
        records.sort_by_key(|record| record.list_order());
        records
    }

    /// Returns the typed rows of kind `R` in list order.
    #[must_use]
    pub fn rows<R: VocabularyRow>(&self, include_inactive: bool) -> Vec<&R> {
        self.records_of(R::KIND, include_inactive)
            .into_iter()
            .filter_map(VocabularyRecord::typed::<R>)
            .collect()
    }

    /// Returns the typed row of kind `R` stored under `key_code`.
    #[must_use]
    pub fn row<R: VocabularyRow>(&self, key_code: &str) -> Option<&R> {
        self.record(&RowKey::new(R::KIND, key_code))
            .and_then(VocabularyRecord::typed::<R>)
    }

    /// Returns the active task statuses in list order.
    #[must_use]
    pub fn task_statuses(&self) -> Vec<&TaskStatus> {
        self.rows(false)
    }

    /// Returns the active default task status, if any.
    #[must_use]
    pub fn default_status(&self) -> Option<&TaskStatus> {
        self.task_statuses().into_iter().find(|status| status.is_default)
    }

    /// Returns the active task stages in list order.
    #[must_use]
    pub fn task_stages(&self) -> Vec<&TaskStage> {
        self.rows(false)
    }

    /// Returns the active stage that groups `status`, if any.
    #[must_use]
    pub fn stage_of(&self, status: &str) -> Option<&TaskStage> {
        self.task_stages()
            .into_iter()
            .find(|stage| stage.status_codes.iter().any(|code| code == status))
    }

    /// Returns the active priority levels in list order.
    #[must_use]
    pub fn priorities(&self) -> Vec<&PriorityLevel> {
        self.rows(false)
    }

    /// Returns every transition edge.
    #[must_use]
    pub fn transitions(&self) -> Vec<&StatusTransition> {
        self.rows(true)
    }

    /// Returns the active custom-field declarations in list order.
    #[must_use]
    pub fn custom_fields(&self) -> Vec<&CustomFieldDefinition> {
        self.rows(false)
    }

    /// Returns the active automation rules in list order.
    #[must_use]
    pub fn automation_rules(&self) -> Vec<&AutomationRule> {
        self.rows(false)
    }

    /// Returns a SHA-256 digest over the canonical row encoding.
    ///
    /// Covers each row's kind, key and payload in key order; versions and
    /// timestamps are excluded, so equal configurations have equal digests.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, record) in &self.records {
            let payload = record
                .row()
                .to_payload()
                .map(|value| value.to_string())
                .unwrap_or_default();
            hasher.update(key.kind().as_str().as_bytes());
            hasher.update([0]);
            hasher.update(key.code().as_bytes());
            hasher.update([0]);
            hasher.update(payload.as_bytes());
            hasher.update([0xff]);
        }
        hex(&hasher.finalize())
    }

    /// Returns per-kind row counts; kinds without rows are omitted.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<VocabularyKind, KindSummary> {
        let mut summary: BTreeMap<VocabularyKind, KindSummary> = BTreeMap::new();
        for record in self.records.values() {
            let entry = summary.entry(record.kind()).or_default();
            if record.is_active() {
                entry.active = entry.active.saturating_add(1);
            } else {
                entry.inactive = entry.inactive.saturating_add(1);
            }
        }
        summary
    }

    pub(crate) fn insert(
        &mut self,
        row: ConfigRow,
        timestamp: DateTime<Utc>,
        revision: ConfigVersion,
    ) -> RowKey {
        let key = row.row_key();
        let record = VocabularyRecord::new(row, timestamp, self.next_sequence, revision);
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.records.insert(key.clone(), record);
        key
    }

    pub(crate) fn record_mut(&mut self, key: &RowKey) -> Option<&mut VocabularyRecord> {
        self.records.get_mut(key)
    }

    pub(crate) fn remove(&mut self, key: &RowKey) -> Option<VocabularyRecord> {
        self.records.remove(key)
    }

    pub(crate) const fn set_version(&mut self, version: ConfigVersion) {
        self.version = version;
    }
}

/// Hex-encodes the SHA-256 digest of `input`.
pub(crate) fn sha256_hex(input: &[u8]) -> String {
    hex(&Sha256::digest(input))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
