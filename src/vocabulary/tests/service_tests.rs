//! Store and service tests over the in-memory repository.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{CustomizationError, ErrorKind};
use crate::vocabulary::{
    adapters::memory::{InMemoryCodeUsage, InMemoryConfigurationRepository},
    ports::CodeUsageProbe,
    domain::{
        Code, ConfigVersion, LeadSource, LeadSubSource, Mutation, RowKey, SeedDocument,
        TaskStatus, VocabularyKind,
    },
    services::{ListFilter, TenantConfigStore, TenantContext, VocabularyService},
};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio_util::sync::CancellationToken;

type TestStore = TenantConfigStore<InMemoryConfigurationRepository, DefaultClock>;
type TestService = VocabularyService<InMemoryConfigurationRepository, DefaultClock>;

fn code(raw: &str) -> Code {
    Code::new(raw).expect("valid code")
}

fn store_with(config: EngineConfig) -> Arc<TestStore> {
    Arc::new(TenantConfigStore::new(
        Arc::new(InMemoryConfigurationRepository::new()),
        Arc::new(DefaultClock),
        config,
    ))
}

#[fixture]
fn service() -> TestService {
    VocabularyService::new(store_with(EngineConfig::default()))
}

#[fixture]
fn context() -> TenantContext {
    TenantContext::for_tenant("t1").expect("valid tenant")
}

/// Clock frozen at an instant with sub-millisecond digits.
struct NanoClock(DateTime<Utc>);

impl Clock for NanoClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn codes(records: &[crate::vocabulary::domain::VocabularyRecord]) -> Vec<String> {
    records.iter().map(|record| record.key().code().to_owned()).collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_read_installs_the_canonical_seed(service: TestService, context: TenantContext) {
    let statuses = service
        .list(&context, VocabularyKind::TaskStatus, ListFilter::active())
        .await
        .expect("list succeeds");

    assert_eq!(
        codes(&statuses),
        vec!["pending", "in_progress", "completed", "cancelled"]
    );
    let snapshot = service.snapshot(&context).await.expect("snapshot loads");
    assert_eq!(snapshot.version(), ConfigVersion::INITIAL);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seeding_can_be_disabled(context: TenantContext) {
    let service = VocabularyService::new(store_with(EngineConfig {
        seed_defaults: false,
        ..EngineConfig::default()
    }));

    let snapshot = service.snapshot(&context).await.expect("snapshot loads");

    assert_eq!(snapshot.version(), ConfigVersion::UNWRITTEN);
    assert!(snapshot.task_statuses().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_rows_read_back_equal(service: TestService, context: TenantContext) {
    let status = TaskStatus::new(code("blocked"), "Blocked").with_order(25);

    service
        .create(&context, status.clone())
        .await
        .expect("create succeeds");
    let stored: TaskStatus = service
        .get_row(&context, "Blocked")
        .await
        .expect("row exists");

    assert_eq!(stored, status);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_write_bumps_the_version(service: TestService, context: TenantContext) {
    let created = service
        .create(&context, TaskStatus::new(code("blocked"), "Blocked").with_order(25))
        .await
        .expect("create succeeds");
    let updated = service
        .update(
            &context,
            VocabularyKind::TaskStatus,
            "blocked",
            json!({"display_name": "On hold"}),
        )
        .await
        .expect("update succeeds");

    assert_eq!(created.revision(), ConfigVersion::new(2));
    assert_eq!(updated.revision(), ConfigVersion::new(3));
    assert_eq!(
        updated.typed::<TaskStatus>().map(|status| status.display_name.as_str()),
        Some("On hold")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivated_rows_are_only_listed_on_request(
    service: TestService,
    context: TenantContext,
) {
    service
        .create(&context, TaskStatus::new(code("blocked"), "Blocked").with_order(25))
        .await
        .expect("create succeeds");
    service
        .deactivate(&context, VocabularyKind::TaskStatus, "blocked")
        .await
        .expect("deactivate succeeds");

    let active = service
        .list(&context, VocabularyKind::TaskStatus, ListFilter::active())
        .await
        .expect("list succeeds");
    let all = service
        .list(&context, VocabularyKind::TaskStatus, ListFilter::all())
        .await
        .expect("list succeeds");

    assert!(!codes(&active).contains(&"blocked".to_owned()));
    assert!(codes(&all).contains(&"blocked".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activation_rechecks_parent_references(service: TestService, context: TenantContext) {
    service
        .create(&context, LeadSource::new(code("google"), "Google"))
        .await
        .expect("source created");
    service
        .create(&context, LeadSubSource::new(code("google"), code("cpc"), "CPC"))
        .await
        .expect("subsource created");
    service
        .deactivate(&context, VocabularyKind::LeadSubSource, "google/cpc")
        .await
        .expect("subsource deactivated");
    service
        .deactivate(&context, VocabularyKind::LeadSource, "google")
        .await
        .expect("source deactivated");

    let result = service
        .activate(&context, VocabularyKind::LeadSubSource, "google/cpc")
        .await;

    assert_eq!(result.map_err(|err| err.kind()).err(), Some(ErrorKind::NotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_cited_codes_is_refused(context: TenantContext) {
    let usage = Arc::new(InMemoryCodeUsage::new());
    let store = TenantConfigStore::new(
        Arc::new(InMemoryConfigurationRepository::new()),
        Arc::new(DefaultClock),
        EngineConfig::default(),
    )
    .with_usage_probe(Arc::clone(&usage) as Arc<dyn CodeUsageProbe>);
    let service = VocabularyService::new(Arc::new(store));
    service
        .create(&context, LeadSource::new(code("fair"), "Trade fair"))
        .await
        .expect("source created");
    usage
        .cite(context.tenant(), RowKey::new(VocabularyKind::LeadSource, "fair"))
        .expect("citation recorded");

    let result = service
        .delete(&context, VocabularyKind::LeadSource, "fair")
        .await;

    assert_eq!(result.map_err(|err| err.kind()).err(), Some(ErrorKind::InUse));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreferenced_rows_can_be_deleted(service: TestService, context: TenantContext) {
    service
        .create(&context, LeadSource::new(code("fair"), "Trade fair"))
        .await
        .expect("source created");

    let version = service
        .delete(&context, VocabularyKind::LeadSource, "fair")
        .await
        .expect("delete succeeds");
    let lookup = service.get(&context, VocabularyKind::LeadSource, "fair").await;

    assert_eq!(version, ConfigVersion::new(3));
    assert_eq!(lookup.map_err(|err| err.kind()).err(), Some(ErrorKind::NotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pinned_writes_fail_once_another_writer_committed(
    service: TestService,
    context: TenantContext,
) {
    let seeded = service.snapshot(&context).await.expect("snapshot loads");
    let pinned = context.clone().pinned(seeded.version());
    service
        .update(&context, VocabularyKind::TaskStatus, "in_progress", json!({"display_name": "Doing"}))
        .await
        .expect("unpinned update succeeds");

    let result = service
        .update(&pinned, VocabularyKind::TaskStatus, "in_progress", json!({"display_name": "Working"}))
        .await;

    let err = result.expect_err("pinned update must be stale");
    assert_eq!(err.kind(), ErrorKind::VersionStale);
    assert!(err.is_retryable());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batches_commit_as_one_version(service: TestService, context: TenantContext) {
    let committed = service
        .apply_batch(
            &context,
            &[
                Mutation::create(LeadSource::new(code("google"), "Google")),
                Mutation::create(LeadSubSource::new(code("google"), code("cpc"), "CPC")),
            ],
        )
        .await
        .expect("batch commits");

    assert_eq!(committed.version(), ConfigVersion::new(2));
    assert!(committed.row::<LeadSubSource>("google/cpc").is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_batches_commit_nothing(service: TestService, context: TenantContext) {
    let result = service
        .apply_batch(
            &context,
            &[
                Mutation::create(LeadSource::new(code("google"), "Google")),
                Mutation::create(LeadSubSource::new(code("bing"), code("cpc"), "CPC")),
            ],
        )
        .await;

    assert!(result.is_err());
    let snapshot = service.snapshot(&context).await.expect("snapshot loads");
    assert_eq!(snapshot.version(), ConfigVersion::INITIAL);
    assert!(snapshot.row::<LeadSource>("google").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_calls_leave_no_trace(service: TestService, context: TenantContext) {
    service.snapshot(&context).await.expect("snapshot loads");
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = context.clone().with_cancellation(token);

    let result = service
        .create(&cancelled, TaskStatus::new(code("blocked"), "Blocked"))
        .await;

    assert!(matches!(result, Err(CustomizationError::Cancelled)));
    let snapshot = service.snapshot(&context).await.expect("snapshot loads");
    assert!(snapshot.row::<TaskStatus>("blocked").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seed_upgrade_only_adds_missing_rows(service: TestService, context: TenantContext) {
    service
        .update(&context, VocabularyKind::PriorityLevel, "low", json!({"display_name": "Whenever"}))
        .await
        .expect("update succeeds");
    service
        .delete(&context, VocabularyKind::PriorityLevel, "critical")
        .await
        .expect("delete succeeds");

    let added = service.upgrade_seed(&context).await.expect("upgrade succeeds");
    let again = service.upgrade_seed(&context).await.expect("upgrade succeeds");

    assert_eq!(added, vec![RowKey::new(VocabularyKind::PriorityLevel, "critical")]);
    assert!(again.is_empty());
    let low = service
        .get_row::<crate::vocabulary::domain::PriorityLevel>(&context, "low")
        .await
        .expect("low exists");
    assert_eq!(low.display_name, "Whenever");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seed_documents_import_in_one_unit(service: TestService, context: TenantContext) {
    let document = SeedDocument::parse(
        r#"{
            "lead_sub_source": [{"code": "cpc", "parent_source": "google", "display_name": "CPC"}],
            "lead_source": [{"code": "google", "display_name": "Google"}]
        }"#,
    )
    .expect("document parses");

    let committed = service
        .import_seed_document(&context, &document)
        .await
        .expect("import succeeds");
    let repeated = service.import_seed_document(&context, &document).await;

    assert_eq!(committed.version(), ConfigVersion::new(2));
    assert_eq!(
        repeated.map_err(|err| err.kind()).err(),
        Some(ErrorKind::DuplicateCode)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tenants_are_isolated(service: TestService, context: TenantContext) {
    let other = TenantContext::for_tenant("t2").expect("valid tenant");
    service
        .create(&context, TaskStatus::new(code("blocked"), "Blocked").with_order(25))
        .await
        .expect("create succeeds");

    let lookup = service.get(&other, VocabularyKind::TaskStatus, "blocked").await;

    assert_eq!(lookup.map_err(|err| err.kind()).err(), Some(ErrorKind::NotFound));
}

#[rstest]
fn blank_tenants_are_caught_at_the_boundary() {
    let result = TenantContext::for_tenant(" ");

    assert_eq!(result.map_err(|err| err.kind()).err(), Some(ErrorKind::InvalidConfig));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn timestamps_are_stored_at_millisecond_precision(context: TenantContext) {
    let instant = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid instant")
        + chrono::Duration::nanoseconds(123_456_789);
    let service = VocabularyService::new(Arc::new(TenantConfigStore::new(
        Arc::new(InMemoryConfigurationRepository::new()),
        Arc::new(NanoClock(instant)),
        EngineConfig::default(),
    )));

    let created = service
        .create(&context, TaskStatus::new(code("blocked"), "Blocked").with_order(25))
        .await
        .expect("create succeeds");
    let updated = service
        .update(
            &context,
            VocabularyKind::TaskStatus,
            "blocked",
            json!({"display_name": "On hold"}),
        )
        .await
        .expect("update succeeds");

    assert_eq!(created.created_at().timestamp_subsec_nanos(), 123_000_000);
    assert_eq!(updated.updated_at().timestamp_subsec_nanos(), 123_000_000);
    assert_eq!(updated.created_at(), created.created_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_first_reads_share_one_seed(context: TenantContext) {
    let repository = Arc::new(InMemoryConfigurationRepository::new());
    let stores: Vec<Arc<TestStore>> = (0..4)
        .map(|_| {
            Arc::new(TenantConfigStore::new(
                Arc::clone(&repository),
                Arc::new(DefaultClock),
                EngineConfig::default(),
            ))
        })
        .collect();

    let handles: Vec<_> = stores
        .iter()
        .map(|store| {
            let racer = Arc::clone(store);
            let tenant = context.clone();
            tokio::spawn(async move { racer.snapshot(&tenant).await })
        })
        .collect();
    let mut versions = Vec::new();
    for handle in handles {
        let snapshot = handle.await.expect("task joins").expect("first read succeeds");
        versions.push(snapshot.version());
    }

    assert_eq!(versions, vec![ConfigVersion::new(1); 4]);
}
