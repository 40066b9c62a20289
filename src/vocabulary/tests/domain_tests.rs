//! Identifier, key and mutation-pipeline tests.

use crate::vocabulary::domain::{
    ApplyContext, Code, ConfigError, ConfigRow, ConfigVersion, LeadSource, LeadSubSource,
    Mutation, RowKey, TaskStage, TaskStatus, TenantConfiguration, TenantId,
    VocabularyDomainError, VocabularyKind, apply_mutations,
};
use crate::workflow::domain::StatusTransition;
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;
use std::collections::BTreeSet;

fn code(raw: &str) -> Code {
    Code::new(raw).expect("valid code")
}

#[fixture]
fn empty() -> TenantConfiguration {
    TenantConfiguration::empty(TenantId::new("t1").expect("valid tenant"))
}

fn apply(
    base: &TenantConfiguration,
    mutations: &[Mutation],
) -> Result<TenantConfiguration, ConfigError> {
    let cited = BTreeSet::new();
    let context = ApplyContext {
        now: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid instant"),
        max_actions_per_rule: 10,
        cited: &cited,
    };
    apply_mutations(base, mutations, &context)
}

fn statuses() -> Vec<Mutation> {
    vec![
        Mutation::create(TaskStatus::new(code("pending"), "Pending").with_order(10).default_status()),
        Mutation::create(TaskStatus::new(code("doing"), "Doing").with_order(20)),
        Mutation::create(TaskStatus::new(code("done"), "Done").with_order(30).terminal()),
    ]
}

#[rstest]
#[case("  In_Progress ", "in_progress")]
#[case("google-cpc", "google-cpc")]
#[case("P1", "p1")]
fn code_is_trimmed_and_lowercased(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(code(raw).as_str(), expected);
}

#[rstest]
#[case("", VocabularyDomainError::EmptyCode)]
#[case("has space", VocabularyDomainError::InvalidCode("has space".to_owned()))]
#[case("_leading", VocabularyDomainError::InvalidCode("_leading".to_owned()))]
fn malformed_codes_are_rejected(#[case] raw: &str, #[case] expected: VocabularyDomainError) {
    assert_eq!(Code::new(raw), Err(expected));
}

#[rstest]
fn blank_tenant_is_rejected() {
    assert_eq!(TenantId::new("   "), Err(VocabularyDomainError::EmptyTenantId));
}

#[rstest]
fn edge_keys_normalise_each_endpoint() {
    let key = RowKey::normalized(VocabularyKind::StatusTransition, " Pending -> Doing ");
    assert_eq!(key.code(), "pending->doing");
}

#[rstest]
fn mutations_bump_the_version_once(empty: TenantConfiguration) {
    let config = apply(&empty, &statuses()).expect("statuses apply");

    assert_eq!(config.version(), ConfigVersion::INITIAL);
    assert_eq!(
        config
            .task_statuses()
            .iter()
            .map(|status| status.code.as_str())
            .collect::<Vec<_>>(),
        vec!["pending", "doing", "done"]
    );
}

#[rstest]
fn duplicate_codes_are_rejected(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let result = apply(
        &base,
        &[Mutation::create(TaskStatus::new(code("PENDING"), "Again"))],
    );

    assert_eq!(
        result,
        Err(ConfigError::DuplicateCode {
            kind: VocabularyKind::TaskStatus,
            code: "pending".to_owned(),
        })
    );
}

#[rstest]
fn second_default_status_is_invalid(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let result = apply(
        &base,
        &[Mutation::create(TaskStatus::new(code("triage"), "Triage").default_status())],
    );

    assert!(matches!(result, Err(ConfigError::InvalidConfig { kind: VocabularyKind::TaskStatus, .. })));
}

#[rstest]
fn edges_out_of_terminal_statuses_are_refused(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let result = apply(
        &base,
        &[Mutation::create(StatusTransition::new(code("done"), code("doing")))],
    );

    assert_eq!(result, Err(ConfigError::TerminalViolation("done".to_owned())));
}

#[rstest]
fn marking_a_source_with_outgoing_edges_terminal_is_invalid(empty: TenantConfiguration) {
    let mut mutations = statuses();
    mutations.push(Mutation::create(StatusTransition::new(code("pending"), code("doing"))));
    let base = apply(&empty, &mutations).expect("graph applies");

    let result = apply(
        &base,
        &[Mutation::update(VocabularyKind::TaskStatus, "pending", json!({"is_terminal": true}))],
    );

    assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
}

#[rstest]
fn edges_to_unknown_statuses_report_unknown_status(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let result = apply(
        &base,
        &[Mutation::create(StatusTransition::new(code("pending"), code("ghost")))],
    );

    assert_eq!(result, Err(ConfigError::UnknownStatus("ghost".to_owned())));
}

#[rstest]
fn stages_must_cover_every_active_status(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");
    let partial = TaskStage::new(code("open"), "Open", 10, vec![code("pending"), code("doing")]);

    let result = apply(&base, &[Mutation::create(partial)]);

    assert!(matches!(result, Err(ConfigError::InvalidConfig { kind: VocabularyKind::TaskStage, .. })));
}

#[rstest]
fn a_batch_may_introduce_a_complete_stage_grouping(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let config = apply(
        &base,
        &[
            Mutation::create(TaskStage::new(code("open"), "Open", 10, vec![code("pending"), code("doing")])),
            Mutation::create(TaskStage::new(code("closed"), "Closed", 20, vec![code("done")])),
        ],
    )
    .expect("complete grouping applies");

    assert_eq!(
        config.stage_of("doing").map(|stage| stage.code.as_str()),
        Some("open")
    );
    assert_eq!(config.version(), ConfigVersion::new(2));
}

#[rstest]
fn failed_batches_leave_the_base_untouched(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let result = apply(
        &base,
        &[
            Mutation::create(TaskStatus::new(code("review"), "Review")),
            Mutation::create(TaskStatus::new(code("review"), "Review again")),
        ],
    );

    assert!(result.is_err());
    assert!(base.row::<TaskStatus>("review").is_none());
    assert_eq!(base.version(), ConfigVersion::INITIAL);
}

#[rstest]
fn updates_merge_and_refuse_renames(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let merged = apply(
        &base,
        &[Mutation::update(VocabularyKind::TaskStatus, "doing", json!({"display_name": "Working"}))],
    )
    .expect("merge applies");
    let renamed = apply(
        &base,
        &[Mutation::update(VocabularyKind::TaskStatus, "doing", json!({"code": "working"}))],
    );

    let status = merged.row::<TaskStatus>("doing").expect("status kept");
    assert_eq!(status.display_name, "Working");
    assert_eq!(status.order, 20);
    assert!(matches!(renamed, Err(ConfigError::InvalidConfig { .. })));
}

#[rstest]
fn updates_reject_unknown_attributes(empty: TenantConfiguration) {
    let base = apply(&empty, &statuses()).expect("statuses apply");

    let result = apply(
        &base,
        &[Mutation::update(VocabularyKind::TaskStatus, "doing", json!({"colour": "#fff"}))],
    );

    assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
}

#[rstest]
fn subsources_need_an_active_parent(empty: TenantConfiguration) {
    let base = apply(
        &empty,
        &[
            Mutation::create(LeadSource::new(code("google"), "Google")),
            Mutation::create(LeadSubSource::new(code("google"), code("cpc"), "CPC")),
        ],
    )
    .expect("source tree applies");
    let deactivated = apply(&base, &[Mutation::deactivate(VocabularyKind::LeadSource, "google")])
        .expect("deactivation applies");

    let result = apply(
        &deactivated,
        &[Mutation::create(LeadSubSource::new(code("google"), code("display"), "Display"))],
    );

    assert_eq!(
        result,
        Err(ConfigError::not_found(VocabularyKind::LeadSource, "google"))
    );
    assert!(deactivated.row::<LeadSubSource>("google/cpc").is_some());
}

#[rstest]
fn deleting_a_referenced_row_is_in_use(empty: TenantConfiguration) {
    let base = apply(
        &empty,
        &[
            Mutation::create(LeadSource::new(code("google"), "Google")),
            Mutation::create(LeadSubSource::new(code("google"), code("cpc"), "CPC")),
        ],
    )
    .expect("source tree applies");

    let result = apply(&base, &[Mutation::delete(VocabularyKind::LeadSource, "google")]);

    assert!(matches!(result, Err(ConfigError::InUse { .. })));
}

#[rstest]
fn identical_configurations_share_a_digest(empty: TenantConfiguration) {
    let first = apply(&empty, &statuses()).expect("statuses apply");
    let second = apply(&empty, &statuses()).expect("statuses apply");
    let changed = apply(
        &first,
        &[Mutation::update(VocabularyKind::TaskStatus, "doing", json!({"order": 25}))],
    )
    .expect("update applies");

    assert_eq!(first.digest(), second.digest());
    assert_ne!(first.digest(), changed.digest());
}

#[rstest]
fn rows_round_trip_through_their_payload() {
    let row = ConfigRow::from(TaskStatus::new(code("blocked"), "Blocked").with_order(25));

    let payload = row.to_payload().expect("row serialises");
    let restored = ConfigRow::from_payload(VocabularyKind::TaskStatus, payload).expect("row parses");

    assert_eq!(restored, row);
}
