//! Diesel row models for tenant configuration persistence.

use super::schema::{tenant_config_versions, tenant_vocabulary};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for stored vocabulary rows.
///
/// The tenant is fixed by the query filter and the active flag travels in
/// the payload, so neither column is selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tenant_vocabulary)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoredVocabularyRow {
    /// Vocabulary kind name.
    pub kind: String,
    /// Row key code, checked against the decoded payload.
    pub code: String,
    /// Row payload.
    pub payload: Value,
    /// Insertion sequence.
    pub sequence: i64,
    /// Version that last touched the row.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for vocabulary rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tenant_vocabulary)]
pub struct NewVocabularyRow {
    /// Owning tenant.
    pub tenant_id: String,
    /// Vocabulary kind name.
    pub kind: String,
    /// Row key code.
    pub code: String,
    /// Row payload.
    pub payload: Value,
    /// Soft-deactivation flag.
    pub is_active: bool,
    /// Insertion sequence.
    pub sequence: i64,
    /// Version that last touched the row.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for a tenant's first version row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tenant_config_versions)]
pub struct NewConfigVersionRow {
    /// Owning tenant.
    pub tenant_id: String,
    /// Committed version.
    pub version: i64,
    /// Commit time.
    pub updated_at: DateTime<Utc>,
}
