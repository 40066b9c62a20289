//! Round-trip laws and reference boundaries of the vocabulary store.

use super::helpers::{TestEngine, code, engine, t1};
use rstest::rstest;
use serde_json::json;
use tenant_workflow::{
    automation::domain::{ActionKind, ActionSpec, AutomationRule, TriggerKind, TriggerParams},
    custom_field::domain::{CustomFieldDefinition, FieldKind},
    error::ErrorKind,
    vocabulary::{
        domain::{PriorityLevel, VocabularyKind},
        services::{ListFilter, TenantContext},
    },
    workflow::domain::StatusTransition,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_rows_read_back_unchanged(engine: TestEngine, t1: TenantContext) {
    let priority = PriorityLevel::new(code("blocker"), "Blocker", 50);

    engine
        .vocabulary()
        .create(&t1, priority.clone())
        .await
        .expect("priority created");
    let read = engine
        .vocabulary()
        .get_row::<PriorityLevel>(&t1, "BLOCKER")
        .await
        .expect("priority found");

    assert_eq!(read, priority);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updates_merge_into_the_row(engine: TestEngine, t1: TenantContext) {
    engine
        .vocabulary()
        .update(&t1, VocabularyKind::PriorityLevel, "high", json!({"display_name": "Urgent"}))
        .await
        .expect("update succeeds");

    let read = engine
        .vocabulary()
        .get_row::<PriorityLevel>(&t1, "high")
        .await
        .expect("priority found");

    assert_eq!(read.display_name, "Urgent");
    assert_eq!(read.weight, 30);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivated_rows_are_listed_only_on_request(engine: TestEngine, t1: TenantContext) {
    engine
        .vocabulary()
        .deactivate(&t1, VocabularyKind::PriorityLevel, "low")
        .await
        .expect("deactivation succeeds");

    let active = engine
        .vocabulary()
        .list(&t1, VocabularyKind::PriorityLevel, ListFilter::active())
        .await
        .expect("list succeeds");
    let all = engine
        .vocabulary()
        .list(&t1, VocabularyKind::PriorityLevel, ListFilter::all())
        .await
        .expect("list succeeds");

    let has_low = |records: &[tenant_workflow::vocabulary::domain::VocabularyRecord]| {
        records.iter().any(|record| record.key().code() == "low")
    };
    assert!(!has_low(&active));
    assert!(has_low(&all));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rule_source_statuses_cannot_be_deactivated(engine: TestEngine, t1: TenantContext) {
    let rule = AutomationRule::new(code("left_pending"), "Left pending", TriggerKind::OnStatusChange)
        .with_params(TriggerParams {
            from: Some(code("pending")),
            ..TriggerParams::default()
        })
        .with_action(ActionSpec::new(ActionKind::Notify, [("channel", "email")]));
    engine
        .automation()
        .create_rule(&t1, rule)
        .await
        .expect("rule created");

    let result = engine
        .vocabulary()
        .deactivate(&t1, VocabularyKind::TaskStatus, "pending")
        .await;

    assert_eq!(result.map_err(|err| err.kind()).err(), Some(ErrorKind::InUse));
}

#[rstest]
#[case("ghost", "pending", ErrorKind::UnknownStatus)]
#[case("pending", "in_progress", ErrorKind::DuplicateEdge)]
#[tokio::test(flavor = "multi_thread")]
async fn edge_boundaries(
    engine: TestEngine,
    t1: TenantContext,
    #[case] from: &str,
    #[case] to: &str,
    #[case] expected: ErrorKind,
) {
    let result = engine
        .transitions()
        .add_edge(&t1, StatusTransition::new(code(from), code(to)))
        .await;

    assert_eq!(result.map_err(|err| err.kind()).err(), Some(expected));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn integer_fields_reject_strings(engine: TestEngine, t1: TenantContext) {
    engine
        .custom_fields()
        .declare(
            &t1,
            CustomFieldDefinition::new(code("story_points"), "Story points", FieldKind::Integer),
        )
        .await
        .expect("field declared");

    let result = engine
        .custom_fields()
        .validate(
            &t1,
            "task",
            &serde_json::Map::from_iter([("story_points".to_owned(), json!("three"))]),
        )
        .await;

    assert_eq!(result.map_err(|err| err.kind()).err(), Some(ErrorKind::TypeMismatch));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tenants_are_isolated(engine: TestEngine, t1: TenantContext) {
    let t2 = TenantContext::for_tenant("t2").expect("valid tenant");
    engine
        .vocabulary()
        .create(&t1, PriorityLevel::new(code("blocker"), "Blocker", 50))
        .await
        .expect("priority created");

    let elsewhere = engine
        .vocabulary()
        .get(&t2, VocabularyKind::PriorityLevel, "blocker")
        .await;

    assert_eq!(elsewhere.map_err(|err| err.kind()).err(), Some(ErrorKind::NotFound));
}
