//! Pure transition-graph checks over a seeded snapshot.

use crate::vocabulary::domain::{
    ApplyContext, Code, Mutation, SeedDocument, TaskStatus, TenantConfiguration, TenantId,
    apply_mutations,
};
use crate::workflow::domain::{
    StatusTransition, TransitionContext, TransitionError, TransitionGraph,
};
use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;
use std::collections::BTreeSet;

fn code(raw: &str) -> Code {
    Code::new(raw).expect("valid code")
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

/// Canonical seed plus a `review` status reached from `in_progress`
/// through the given edge.
fn config_with(edge: StatusTransition) -> TenantConfiguration {
    let cited = BTreeSet::new();
    let context = ApplyContext {
        now: now(),
        max_actions_per_rule: 10,
        cited: &cited,
    };
    let mut mutations = SeedDocument::canonical()
        .expect("canonical seed parses")
        .to_mutations();
    mutations.push(Mutation::create(TaskStatus::new(code("review"), "Review").with_order(25)));
    mutations.push(Mutation::create(edge));
    let empty = TenantConfiguration::empty(TenantId::new("t1").expect("valid tenant"));
    apply_mutations(&empty, &mutations, &context).expect("configuration applies")
}

#[fixture]
fn plain() -> TenantConfiguration {
    config_with(StatusTransition::new(code("in_progress"), code("review")))
}

#[rstest]
fn entry_status_is_the_default(plain: TenantConfiguration) {
    let graph = TransitionGraph::from_configuration(&plain);

    assert_eq!(
        graph.entry_status().map(|status| status.code.as_str()),
        Some("pending")
    );
}

#[rstest]
fn allowed_targets_follow_status_order(plain: TenantConfiguration) {
    let graph = TransitionGraph::from_configuration(&plain);

    let targets: Vec<&str> = graph
        .allowed("in_progress")
        .expect("known status")
        .into_iter()
        .map(|status| status.code.as_str())
        .collect();

    assert_eq!(targets, vec!["review", "completed", "cancelled"]);
}

#[rstest]
fn allowed_from_unknown_status_fails(plain: TenantConfiguration) {
    let graph = TransitionGraph::from_configuration(&plain);

    assert_eq!(
        graph.allowed("ghost"),
        Err(TransitionError::UnknownStatus("ghost".to_owned()))
    );
}

#[rstest]
#[case("pending", "in_progress", Ok(true))]
#[case("pending", "completed", Ok(false))]
#[case("completed", "in_progress", Err(TransitionError::TerminalViolation("completed".to_owned())))]
#[case("pending", "ghost", Err(TransitionError::UnknownStatus("ghost".to_owned())))]
#[case("ghost", "pending", Err(TransitionError::UnknownStatus("ghost".to_owned())))]
fn check_decides_by_edges_and_terminals(
    plain: TenantConfiguration,
    #[case] from: &str,
    #[case] to: &str,
    #[case] expected: Result<bool, TransitionError>,
) {
    let graph = TransitionGraph::from_configuration(&plain);

    assert_eq!(graph.check(from, to, &TransitionContext::default(), now()), expected);
}

#[rstest]
fn reason_is_required_when_flagged() {
    let config = config_with(StatusTransition::new(code("in_progress"), code("review")).requiring_reason());
    let graph = TransitionGraph::from_configuration(&config);

    let without = graph.check("in_progress", "review", &TransitionContext::default(), now());
    let blank = graph.check(
        "in_progress",
        "review",
        &TransitionContext::new(json!({}), json!({"reason": "  "})),
        now(),
    );
    let with = graph.check(
        "in_progress",
        "review",
        &TransitionContext::new(json!({}), json!({"reason": "ready for review"})),
        now(),
    );

    assert!(matches!(without, Err(TransitionError::GuardFailed(ref failure)) if failure.predicate == "requires_reason"));
    assert!(blank.is_err());
    assert_eq!(with, Ok(true));
}

#[rstest]
#[case(json!({"assignee": "ana"}), true)]
#[case(json!({"custom_fields": {"assignee": "ana"}}), true)]
#[case(json!({"assignee": null}), false)]
#[case(json!({}), false)]
fn required_fields_must_be_present(#[case] entity: serde_json::Value, #[case] passes: bool) {
    let config = config_with(
        StatusTransition::new(code("in_progress"), code("review")).requiring_fields(["assignee"]),
    );
    let graph = TransitionGraph::from_configuration(&config);

    let verdict = graph.check(
        "in_progress",
        "review",
        &TransitionContext::new(entity, json!({})),
        now(),
    );

    assert_eq!(verdict.is_ok(), passes);
}

#[rstest]
fn role_must_match_when_required() {
    let mut edge = StatusTransition::new(code("in_progress"), code("review"));
    edge.requires_role = Some("lead".to_owned());
    let config = config_with(edge);
    let graph = TransitionGraph::from_configuration(&config);

    let wrong = graph.check(
        "in_progress",
        "review",
        &TransitionContext::new(json!({}), json!({"role": "member"})),
        now(),
    );
    let right = graph.check(
        "in_progress",
        "review",
        &TransitionContext::new(json!({}), json!({"role": "lead"})),
        now(),
    );

    assert!(matches!(wrong, Err(TransitionError::GuardFailed(ref failure)) if failure.predicate == "requires_role:lead"));
    assert_eq!(right, Ok(true));
}

const ESTIMATE_GUARD: &str = "entity.estimate > 0 && age_days(entity.created_at) >= 1";

#[rstest]
#[case(3, true)]
#[case(0, false)]
fn guards_see_entity_payload_and_clock(#[case] estimate: i64, #[case] passes: bool) {
    let config = config_with(
        StatusTransition::new(code("in_progress"), code("review")).with_guard(ESTIMATE_GUARD),
    );
    let graph = TransitionGraph::from_configuration(&config);
    let entity = json!({"estimate": estimate, "created_at": "2026-02-27"});

    let verdict = graph.check(
        "in_progress",
        "review",
        &TransitionContext::new(entity, json!({})),
        now(),
    );

    if passes {
        assert_eq!(verdict, Ok(true));
    } else {
        assert!(
            matches!(verdict, Err(TransitionError::GuardFailed(ref failure)) if failure.predicate == ESTIMATE_GUARD)
        );
    }
}

#[rstest]
fn guards_with_unknown_paths_fail_closed() {
    let config = config_with(
        StatusTransition::new(code("in_progress"), code("review")).with_guard("payload.approved == true"),
    );
    let graph = TransitionGraph::from_configuration(&config);

    let verdict = graph.check("in_progress", "review", &TransitionContext::default(), now());

    assert!(matches!(verdict, Err(TransitionError::GuardFailed(_))));
}
