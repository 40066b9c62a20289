//! End-to-end walkthroughs of a freshly seeded tenant.

use super::helpers::{TestEngine, code, engine, t1};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Map, Value, json};
use tenant_workflow::{
    automation::domain::{
        ActionSpec, AutomationEvent, AutomationRule, EventKind, TriggerKind, TriggerParams,
    },
    custom_field::domain::{CustomFieldDefinition, FieldKind},
    error::ErrorKind,
    vocabulary::{
        domain::{LeadSource, LeadSubSource, TaskStatus, VocabularyKind},
        services::{ListFilter, TenantContext},
    },
    workflow::domain::{StatusTransition, TransitionContext},
};

fn submitted(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

async fn add_blocked(engine: &TestEngine, context: &TenantContext) {
    engine
        .vocabulary()
        .create(context, TaskStatus::new(code("blocked"), "Blocked").with_order(25))
        .await
        .expect("status created");
    engine
        .transitions()
        .add_edge(context, StatusTransition::new(code("in_progress"), code("blocked")))
        .await
        .expect("edge added");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seeded_tenant_exposes_the_default_workflow(engine: TestEngine, t1: TenantContext) {
    let statuses = engine
        .vocabulary()
        .list(&t1, VocabularyKind::TaskStatus, ListFilter::active())
        .await
        .expect("statuses listed");
    let codes: Vec<String> = statuses
        .iter()
        .map(|record| record.key().code().to_owned())
        .collect();

    let forward = engine
        .transitions()
        .check(&t1, "pending", "in_progress", &TransitionContext::default())
        .await
        .expect("check resolves");
    let backward = engine
        .transitions()
        .check(&t1, "completed", "in_progress", &TransitionContext::default())
        .await;

    assert_eq!(codes, vec!["pending", "in_progress", "completed", "cancelled"]);
    assert!(forward);
    assert_eq!(
        backward.map_err(|err| err.kind()).err(),
        Some(ErrorKind::TerminalViolation)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_statuses_join_the_graph(engine: TestEngine, t1: TenantContext) {
    add_blocked(&engine, &t1).await;

    let allowed = engine
        .transitions()
        .allowed(&t1, "in_progress")
        .await
        .expect("allowed resolves");

    assert!(allowed.iter().any(|status| status.code == code("blocked")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn custom_field_ranges_are_enforced(engine: TestEngine, t1: TenantContext) {
    engine
        .custom_fields()
        .declare(
            &t1,
            CustomFieldDefinition::new(code("risk_score"), "Risk score", FieldKind::Integer)
                .required()
                .with_range(Some(0.0), Some(10.0)),
        )
        .await
        .expect("field declared");

    let too_high = engine
        .custom_fields()
        .validate(&t1, "task", &submitted(json!({"risk_score": 11})))
        .await;
    let fine = engine
        .custom_fields()
        .validate(&t1, "task", &submitted(json!({"risk_score": 3})))
        .await;

    assert_eq!(
        too_high.map_err(|err| err.kind()).err(),
        Some(ErrorKind::ConstraintViolation)
    );
    assert!(fine.is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn escalation_fires_only_for_high_priority(engine: TestEngine, t1: TenantContext) {
    add_blocked(&engine, &t1).await;
    engine
        .automation()
        .create_rule(
            &t1,
            AutomationRule::new(code("escalate_on_block"), "Escalate", TriggerKind::OnStatusChange)
                .with_params(TriggerParams::to_status(code("blocked")))
                .with_condition(r#"entity.priority == "high""#)
                .with_action(
                    ActionSpec::parse("notify(channel=email, template=escalation)")
                        .expect("action parses"),
                ),
        )
        .await
        .expect("rule created");
    let blocked = |priority: &str| {
        AutomationEvent::new(
            EventKind::StatusChanged {
                from: code("pending"),
                to: code("blocked"),
            },
            json!({"title": "Migrate", "priority": priority, "status": "blocked"}),
            Utc::now(),
        )
    };

    let high = engine
        .automation()
        .evaluate(&t1, &blocked("high"))
        .await
        .expect("evaluation succeeds");
    let low = engine
        .automation()
        .evaluate(&t1, &blocked("low"))
        .await
        .expect("evaluation succeeds");

    assert_eq!(high.intents.len(), 1);
    assert!(low.intents.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivated_sources_refuse_new_subsources(engine: TestEngine, t1: TenantContext) {
    engine
        .vocabulary()
        .create(&t1, LeadSource::new(code("google"), "Google"))
        .await
        .expect("source created");
    engine
        .vocabulary()
        .create(&t1, LeadSubSource::new(code("google"), code("cpc"), "Cost per click"))
        .await
        .expect("subsource created");

    engine
        .vocabulary()
        .deactivate(&t1, VocabularyKind::LeadSource, "google")
        .await
        .expect("source deactivated");
    let another = engine
        .vocabulary()
        .create(&t1, LeadSubSource::new(code("google"), code("display"), "Display"))
        .await;
    let existing = engine
        .vocabulary()
        .get_row::<LeadSubSource>(&t1, "google/cpc")
        .await;

    assert_eq!(another.map_err(|err| err.kind()).err(), Some(ErrorKind::NotFound));
    assert!(existing.is_ok());
}
