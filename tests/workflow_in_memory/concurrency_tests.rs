//! Version pinning and concurrent writers.

use super::helpers::{TestEngine, engine, t1};
use rstest::rstest;
use serde_json::json;
use tenant_workflow::{
    error::ErrorKind,
    vocabulary::{domain::VocabularyKind, services::TenantContext},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_pinned_updates_let_exactly_one_win(engine: TestEngine, t1: TenantContext) {
    let base = engine
        .vocabulary()
        .snapshot(&t1)
        .await
        .expect("snapshot loads")
        .version();
    let pinned = t1.clone().pinned(base);
    let rename = |name: &'static str| {
        let context = pinned.clone();
        let vocabulary = engine.vocabulary().clone();
        async move {
            vocabulary
                .update(
                    &context,
                    VocabularyKind::TaskStatus,
                    "in_progress",
                    json!({"display_name": name}),
                )
                .await
        }
    };

    let (first, second) = tokio::join!(rename("Doing"), rename("Working"));

    let outcomes = [first.map(|record| record.revision()), second.map(|record| record.revision())];
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let stale = outcomes
        .iter()
        .filter(|outcome| {
            outcome
                .as_ref()
                .is_err_and(|err| err.kind() == ErrorKind::VersionStale)
        })
        .count();
    let current = engine
        .vocabulary()
        .snapshot(&t1)
        .await
        .expect("snapshot loads")
        .version();

    assert_eq!((winners, stale), (1, 1));
    assert_eq!(current, base.next());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_errors_are_retryable(engine: TestEngine, t1: TenantContext) {
    let base = engine
        .vocabulary()
        .snapshot(&t1)
        .await
        .expect("snapshot loads")
        .version();
    engine
        .vocabulary()
        .update(&t1, VocabularyKind::TaskStatus, "pending", json!({"display_name": "Queued"}))
        .await
        .expect("unpinned update succeeds");

    let stale = engine
        .vocabulary()
        .update(
            &t1.clone().pinned(base),
            VocabularyKind::TaskStatus,
            "pending",
            json!({"display_name": "Backlog"}),
        )
        .await
        .expect_err("pinned update is stale");

    assert_eq!(stale.kind(), ErrorKind::VersionStale);
    assert!(stale.is_retryable());
}
