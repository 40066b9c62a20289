//! First-touch seeding against a shared `PostgreSQL` database.

use super::helpers::{
    CleanupGuard, create_database, ensure_template, open_repository, store_over, test_runtime,
    unique_database,
};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use tenant_workflow::vocabulary::{
    domain::{Code, ConfigVersion, TaskStatus},
    services::{TenantContext, VocabularyService},
};

#[rstest]
fn independent_stores_agree_on_the_first_seed(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = unique_database("test_seed_race");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    create_database(shared_test_cluster, &db_name).expect("database setup");
    let first = store_over(
        open_repository(shared_test_cluster, &db_name, 2).expect("repository setup"),
    );
    let second = store_over(
        open_repository(shared_test_cluster, &db_name, 2).expect("repository setup"),
    );
    let context = TenantContext::for_tenant("acme").expect("valid tenant");
    let rt = test_runtime();

    let (left, right) =
        rt.block_on(async { tokio::join!(first.snapshot(&context), second.snapshot(&context)) });
    let left = left.expect("first reader sees the seed");
    let right = right.expect("second reader sees the seed");

    assert_eq!(left.version(), ConfigVersion::new(1));
    assert_eq!(left, right);
}

#[rstest]
fn writes_through_the_store_survive_a_reload(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = unique_database("test_store_reload");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    create_database(shared_test_cluster, &db_name).expect("database setup");
    let writer = VocabularyService::new(std::sync::Arc::new(store_over(
        open_repository(shared_test_cluster, &db_name, 2).expect("repository setup"),
    )));
    let reader = store_over(
        open_repository(shared_test_cluster, &db_name, 2).expect("repository setup"),
    );
    let context = TenantContext::for_tenant("acme").expect("valid tenant");
    let rt = test_runtime();
    let blocked = TaskStatus::new(Code::new("blocked").expect("valid code"), "Blocked")
        .with_order(25);

    let created = rt
        .block_on(writer.create(&context, blocked.clone()))
        .expect("create succeeds");
    let reloaded = rt.block_on(reader.snapshot(&context)).expect("snapshot loads");

    assert_eq!(reloaded.version(), ConfigVersion::new(2));
    assert_eq!(reloaded.row::<TaskStatus>("blocked"), Some(&blocked));
    assert_eq!(
        reloaded.record(&created.key()).map(|record| record.created_at()),
        Some(created.created_at())
    );
}
