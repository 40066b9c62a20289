//! Diesel schema for tenant configuration persistence.

diesel::table! {
    /// Committed configuration version per tenant.
    tenant_config_versions (tenant_id) {
        /// Owning tenant.
        #[max_length = 255]
        tenant_id -> Varchar,
        /// Latest committed version.
        version -> Int8,
        /// Time of the latest commit.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Vocabulary rows of every kind, keyed by tenant, kind and code.
    tenant_vocabulary (tenant_id, kind, code) {
        /// Owning tenant.
        #[max_length = 255]
        tenant_id -> Varchar,
        /// Vocabulary kind name.
        #[max_length = 50]
        kind -> Varchar,
        /// Row key code (`parent/code` for subsources, `from->to` for edges).
        #[max_length = 255]
        code -> Varchar,
        /// Row payload as written by the engine.
        payload -> Jsonb,
        /// Soft-deactivation flag mirrored from the payload.
        is_active -> Bool,
        /// Insertion sequence used as the final list-order tie-break.
        sequence -> Int8,
        /// Configuration version that last touched the row.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tenant_config_versions, tenant_vocabulary);
