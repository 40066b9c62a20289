//! Shared helpers for `PostgreSQL` integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use tenant_workflow::{
    config::EngineConfig,
    vocabulary::{
        adapters::{memory::InMemoryConfigurationRepository, postgres::PostgresConfigurationRepository},
        domain::TenantConfiguration,
        services::{TenantConfigStore, TenantContext},
    },
};
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL to create the configuration tables.
const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-01-01-000000_create_tenant_vocabulary/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "tenant_workflow_test_template";

static DATABASE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Store backed by the `PostgreSQL` repository.
pub type PgStore = TenantConfigStore<PostgresConfigurationRepository, DefaultClock>;

/// Creates a tokio runtime for async operations in tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("SQL error: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Returns a database name no other test in this run uses.
pub fn unique_database(prefix: &str) -> String {
    let ordinal = DATABASE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{pid}_{ordinal}", pid = std::process::id())
}

/// Creates a test database from the template.
pub fn create_database(cluster: &TestCluster, db_name: &str) -> Result<(), BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)
}

/// Opens a repository on an existing test database.
///
/// Every call builds its own pool, so two repositories behave like two
/// processes sharing the database.
pub fn open_repository(
    cluster: &TestCluster,
    db_name: &str,
    pool_size: u32,
) -> Result<PostgresConfigurationRepository, BoxError> {
    let url = cluster.connection().database_url(db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(PostgresConfigurationRepository::new(pool))
}

/// Builds a seeding store over a repository.
pub fn store_over(repository: PostgresConfigurationRepository) -> PgStore {
    TenantConfigStore::new(
        Arc::new(repository),
        Arc::new(DefaultClock),
        EngineConfig::default(),
    )
}

/// Returns a seeded, never-persisted snapshot of `tenant`.
pub fn seeded_snapshot(runtime: &Runtime, tenant: &str) -> TenantConfiguration {
    let store = TenantConfigStore::new(
        Arc::new(InMemoryConfigurationRepository::new()),
        Arc::new(DefaultClock),
        EngineConfig::default(),
    );
    let context = TenantContext::for_tenant(tenant).expect("valid tenant");
    runtime
        .block_on(store.snapshot(&context))
        .expect("in-memory seed succeeds")
}

/// Cleans up a test database.
fn cleanup_database(cluster: &TestCluster, db_name: &str) {
    if let Err(e) = cluster.drop_database(db_name) {
        eprintln!("Warning: failed to drop test database {db_name}: {e}");
    }
}

/// Guard that ensures test database cleanup runs even if the test panics.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        cleanup_database(self.cluster, &self.db_name);
    }
}
