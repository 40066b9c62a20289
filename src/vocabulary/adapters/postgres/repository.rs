//! `PostgreSQL` repository implementation for tenant configuration storage.

use super::{
    models::{NewConfigVersionRow, NewVocabularyRow, StoredVocabularyRow},
    schema::{tenant_config_versions, tenant_vocabulary},
};
use crate::vocabulary::{
    domain::{
        ConfigRow, ConfigVersion, PersistedConfigurationData, PersistedRecordData,
        TenantConfiguration, TenantId, VocabularyKind, VocabularyRecord,
    },
    ports::{ConfigRepositoryError, ConfigRepositoryResult, ConfigurationRepository},
};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by configuration adapters.
pub type ConfigPgPool = Pool<ConnectionManager<PgConnection>>;

/// Rows per multi-row insert, well below the bind-parameter limit.
const INSERT_CHUNK: usize = 500;

/// `PostgreSQL`-backed configuration repository.
///
/// A commit rewrites the tenant's rows inside one transaction that holds
/// the tenant's version row `FOR UPDATE`, so readers never observe a
/// half-written configuration.
#[derive(Debug, Clone)]
pub struct PostgresConfigurationRepository {
    pool: ConfigPgPool,
}

impl PostgresConfigurationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ConfigPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ConfigRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ConfigRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ConfigRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ConfigRepositoryError::persistence)?
    }
}

impl From<DieselError> for ConfigRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ConfigurationRepository for PostgresConfigurationRepository {
    async fn load(&self, tenant: &TenantId) -> ConfigRepositoryResult<Option<TenantConfiguration>> {
        let tenant_id = tenant.clone();
        self.run_blocking(move |connection| {
            // One snapshot for both reads, so a concurrent commit cannot pair
            // an old version with new rows.
            connection
                .build_transaction()
                .repeatable_read()
                .read_only()
                .run::<_, ConfigRepositoryError, _>(|tx| {
                    let stored_version = tenant_config_versions::table
                        .filter(tenant_config_versions::tenant_id.eq(tenant_id.as_str()))
                        .select(tenant_config_versions::version)
                        .first::<i64>(tx)
                        .optional()?;
                    let Some(raw_version) = stored_version else {
                        return Ok(None);
                    };

                    let rows = tenant_vocabulary::table
                        .filter(tenant_vocabulary::tenant_id.eq(tenant_id.as_str()))
                        .select(StoredVocabularyRow::as_select())
                        .load::<StoredVocabularyRow>(tx)?;
                    let records = rows
                        .into_iter()
                        .map(row_to_record)
                        .collect::<ConfigRepositoryResult<Vec<_>>>()?;

                    Ok(Some(TenantConfiguration::from_persisted(
                        PersistedConfigurationData {
                            tenant_id,
                            version: to_version(raw_version)?,
                            records,
                        },
                    )))
                })
        })
        .await
    }

    async fn commit(
        &self,
        snapshot: &TenantConfiguration,
        expected: ConfigVersion,
    ) -> ConfigRepositoryResult<()> {
        let tenant_id = snapshot.tenant_id().as_str().to_owned();
        let next_version = to_db(snapshot.version().value())?;
        let new_rows = snapshot
            .records()
            .map(|record| to_new_row(&tenant_id, record))
            .collect::<ConfigRepositoryResult<Vec<_>>>()?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, ConfigRepositoryError, _>(|tx| {
                let stored_version = tenant_config_versions::table
                    .filter(tenant_config_versions::tenant_id.eq(&tenant_id))
                    .select(tenant_config_versions::version)
                    .for_update()
                    .first::<i64>(tx)
                    .optional()?;
                let actual = stored_version.map_or(Ok(ConfigVersion::UNWRITTEN), to_version)?;
                if actual != expected {
                    return Err(ConfigRepositoryError::VersionStale { expected, actual });
                }

                if stored_version.is_some() {
                    diesel::update(
                        tenant_config_versions::table
                            .filter(tenant_config_versions::tenant_id.eq(&tenant_id)),
                    )
                    .set((
                        tenant_config_versions::version.eq(next_version),
                        tenant_config_versions::updated_at.eq(Utc::now().trunc_subsecs(3)),
                    ))
                    .execute(tx)?;
                } else {
                    insert_first_version(tx, &tenant_id, next_version, expected)?;
                }

                diesel::delete(
                    tenant_vocabulary::table.filter(tenant_vocabulary::tenant_id.eq(&tenant_id)),
                )
                .execute(tx)?;
                for chunk in new_rows.chunks(INSERT_CHUNK) {
                    diesel::insert_into(tenant_vocabulary::table)
                        .values(chunk)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }
}

/// Inserts the version row of a tenant's first commit.
///
/// Two first writers race on the primary key; the loser sees a unique
/// violation, which means version 1 was committed by the other writer.
fn insert_first_version(
    connection: &mut PgConnection,
    tenant_id: &str,
    version: i64,
    expected: ConfigVersion,
) -> ConfigRepositoryResult<()> {
    diesel::insert_into(tenant_config_versions::table)
        .values(&NewConfigVersionRow {
            tenant_id: tenant_id.to_owned(),
            version,
            updated_at: Utc::now().trunc_subsecs(3),
        })
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ConfigRepositoryError::VersionStale {
                    expected,
                    actual: ConfigVersion::INITIAL,
                }
            }
            other => ConfigRepositoryError::persistence(other),
        })?;
    Ok(())
}

fn to_new_row(tenant_id: &str, record: &VocabularyRecord) -> ConfigRepositoryResult<NewVocabularyRow> {
    let key = record.key();
    let payload = record
        .row()
        .to_payload()
        .map_err(ConfigRepositoryError::persistence)?;
    Ok(NewVocabularyRow {
        tenant_id: tenant_id.to_owned(),
        kind: key.kind().as_str().to_owned(),
        code: key.code().to_owned(),
        payload,
        is_active: record.is_active(),
        sequence: to_db(record.sequence())?,
        revision: to_db(record.revision().value())?,
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    })
}

fn row_to_record(row: StoredVocabularyRow) -> ConfigRepositoryResult<VocabularyRecord> {
    let StoredVocabularyRow {
        kind,
        code,
        payload,
        sequence,
        revision,
        created_at,
        updated_at,
    } = row;
    let vocabulary_kind =
        VocabularyKind::try_from(kind.as_str()).map_err(ConfigRepositoryError::persistence)?;
    let config_row = ConfigRow::from_payload(vocabulary_kind, payload)
        .map_err(ConfigRepositoryError::persistence)?;
    let record = VocabularyRecord::from_persisted(PersistedRecordData {
        row: config_row,
        created_at,
        updated_at,
        sequence: u64::try_from(sequence).map_err(ConfigRepositoryError::persistence)?,
        revision: to_version(revision)?,
    });
    if record.key().code() != code {
        return Err(ConfigRepositoryError::persistence(std::io::Error::other(format!(
            "stored {kind} row keyed `{code}` decodes as `{}`",
            record.key().code()
        ))));
    }
    Ok(record)
}

fn to_version(raw: i64) -> ConfigRepositoryResult<ConfigVersion> {
    u64::try_from(raw)
        .map(ConfigVersion::new)
        .map_err(ConfigRepositoryError::persistence)
}

fn to_db(value: u64) -> ConfigRepositoryResult<i64> {
    i64::try_from(value).map_err(ConfigRepositoryError::persistence)
}

#[cfg(test)]
mod tests {
    use super::{row_to_record, to_new_row};
    use crate::vocabulary::{
        adapters::postgres::models::StoredVocabularyRow,
        domain::{
            Code, ConfigRow, ConfigVersion, PersistedRecordData, PriorityLevel, VocabularyRecord,
        },
        ports::ConfigRepositoryError,
    };
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn record() -> VocabularyRecord {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let priority = PriorityLevel::new(Code::new("urgent").expect("valid code"), "Urgent", 50);
        VocabularyRecord::from_persisted(PersistedRecordData {
            row: ConfigRow::PriorityLevel(priority),
            created_at: at,
            updated_at: at,
            sequence: 7,
            revision: ConfigVersion::new(3),
        })
    }

    fn stored(kind: &str, tenant_row: &super::NewVocabularyRow) -> StoredVocabularyRow {
        StoredVocabularyRow {
            kind: kind.to_owned(),
            code: tenant_row.code.clone(),
            payload: tenant_row.payload.clone(),
            sequence: tenant_row.sequence,
            revision: tenant_row.revision,
            created_at: tenant_row.created_at,
            updated_at: tenant_row.updated_at,
        }
    }

    #[rstest]
    fn stored_rows_restore_the_record() {
        let original = record();

        let row = to_new_row("acme", &original).expect("row converts");
        let restored = row_to_record(stored(&row.kind, &row)).expect("record restores");

        assert_eq!(row.kind, "priority_level");
        assert_eq!(row.code, "urgent");
        assert_eq!(restored, original);
    }

    #[rstest]
    #[case("no_such_kind")]
    #[case("")]
    fn unknown_kinds_are_persistence_errors(#[case] kind: &str) {
        let row = to_new_row("acme", &record()).expect("row converts");

        let result = row_to_record(stored(kind, &row));

        assert!(matches!(result, Err(ConfigRepositoryError::Persistence(_))));
    }

    #[rstest]
    fn negative_versions_are_rejected() {
        let row = to_new_row("acme", &record()).expect("row converts");
        let mut corrupt = stored(&row.kind, &row);
        corrupt.revision = -1;

        assert!(row_to_record(corrupt).is_err());
    }

    #[rstest]
    fn key_columns_must_match_the_payload() {
        let row = to_new_row("acme", &record()).expect("row converts");
        let mut corrupt = stored(&row.kind, &row);
        corrupt.code = "routine".to_owned();

        let result = row_to_record(corrupt);

        assert!(matches!(result, Err(ConfigRepositoryError::Persistence(_))));
    }
}
