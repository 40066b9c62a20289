//! Commit and load behaviour of the `PostgreSQL` configuration repository.

use super::helpers::{
    CleanupGuard, create_database, ensure_template, open_repository, seeded_snapshot,
    test_runtime, unique_database,
};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use tenant_workflow::vocabulary::{
    domain::{ConfigVersion, TenantId},
    ports::{ConfigRepositoryError, ConfigurationRepository},
};

#[rstest]
fn committed_snapshots_load_back_equal(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = unique_database("test_round_trip");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    create_database(shared_test_cluster, &db_name).expect("database setup");
    let repo = open_repository(shared_test_cluster, &db_name, 1).expect("repository setup");
    let rt = test_runtime();
    let snapshot = seeded_snapshot(&rt, "acme");

    rt.block_on(repo.commit(&snapshot, ConfigVersion::UNWRITTEN))
        .expect("commit succeeds");
    let loaded = rt
        .block_on(repo.load(snapshot.tenant_id()))
        .expect("load succeeds")
        .expect("tenant exists");

    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.digest(), snapshot.digest());
}

#[rstest]
fn unwritten_tenants_load_as_none(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = unique_database("test_unwritten");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    create_database(shared_test_cluster, &db_name).expect("database setup");
    let repo = open_repository(shared_test_cluster, &db_name, 1).expect("repository setup");
    let rt = test_runtime();
    let tenant = TenantId::new("nobody").expect("valid tenant");

    let loaded = rt.block_on(repo.load(&tenant)).expect("load succeeds");

    assert!(loaded.is_none());
}

#[rstest]
fn stale_commits_are_rejected(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = unique_database("test_stale");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    create_database(shared_test_cluster, &db_name).expect("database setup");
    let repo = open_repository(shared_test_cluster, &db_name, 1).expect("repository setup");
    let rt = test_runtime();
    let snapshot = seeded_snapshot(&rt, "acme");
    rt.block_on(repo.commit(&snapshot, ConfigVersion::UNWRITTEN))
        .expect("first commit succeeds");

    let replay = rt.block_on(repo.commit(&snapshot, ConfigVersion::UNWRITTEN));
    let loaded = rt
        .block_on(repo.load(snapshot.tenant_id()))
        .expect("load succeeds")
        .expect("tenant exists");

    assert!(matches!(
        replay,
        Err(ConfigRepositoryError::VersionStale { expected, actual })
            if expected == ConfigVersion::UNWRITTEN && actual == ConfigVersion::new(1)
    ));
    assert_eq!(loaded, snapshot);
}

#[rstest]
fn racing_first_commits_have_one_winner(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = unique_database("test_first_commit_race");
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    create_database(shared_test_cluster, &db_name).expect("database setup");
    let first = open_repository(shared_test_cluster, &db_name, 1).expect("repository setup");
    let second = open_repository(shared_test_cluster, &db_name, 1).expect("repository setup");
    let rt = test_runtime();
    let snapshot = seeded_snapshot(&rt, "acme");

    let (left, right) = rt.block_on(async {
        tokio::join!(
            first.commit(&snapshot, ConfigVersion::UNWRITTEN),
            second.commit(&snapshot, ConfigVersion::UNWRITTEN),
        )
    });

    let outcomes = [left, right];
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let stale = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(ConfigRepositoryError::VersionStale { .. })))
        .count();
    assert_eq!((winners, stale), (1, 1));
}
