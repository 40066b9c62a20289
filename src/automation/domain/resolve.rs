//! Pure resolution of an event against a configuration snapshot.

use super::{
    ActionIntent, ActionKind, AutomationEvent, AutomationRule, IntentKind, Resolution,
    RuleFailure,
};
use crate::automation::expression::Scope;
use crate::vocabulary::domain::{TenantConfiguration, sha256_hex};
use minijinja::{Environment, UndefinedBehavior};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Resolves `event` against the active rules of `config`.
///
/// Matching rules are evaluated in `(priority, code)` order. A rule whose
/// condition or templates fail is recorded in
/// [`Resolution::failures`] and contributes nothing; its siblings still
/// fire. Conflicting intents are settled first-wins: one
/// `transition_status` per event and one `set_field` per field.
///
/// The result depends only on the snapshot and the event, so identical
/// inputs yield identical intents.
#[must_use]
pub fn resolve_rules(config: &TenantConfiguration, event: &AutomationEvent) -> Resolution {
    let mut rules: Vec<&AutomationRule> = config
        .rows::<AutomationRule>(false)
        .into_iter()
        .filter(|rule| rule.matches(event))
        .collect();
    rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));

    let event_document = event.document();
    let scope = Scope::new(event.occurred_at())
        .with_root("entity", event.entity())
        .with_root("event", &event_document)
        .with_root("actor", event.actor())
        .with_root("before", event.before())
        .with_root("after", event.after());
    let context = build_template_context(event, &event_document);
    let mut environment = Environment::new();
    environment.set_undefined_behavior(UndefinedBehavior::Strict);

    let mut resolution = Resolution::default();
    let mut claims = Claims::default();
    for rule in rules {
        match evaluate_rule(rule, &scope, &environment, &context, &event_document) {
            Ok(None) => resolution.succeeded.push(rule.code.clone()),
            Ok(Some(intents)) => {
                resolution.succeeded.push(rule.code.clone());
                resolution.fired.push(rule.code.clone());
                for intent in intents {
                    if claims.admit(&intent) {
                        resolution.intents.push(intent);
                    } else {
                        resolution.suppressed.push(intent);
                    }
                }
            }
            Err(reason) => resolution.failures.push(RuleFailure {
                rule: rule.code.clone(),
                reason,
            }),
        }
    }
    resolution
}

fn evaluate_rule(
    rule: &AutomationRule,
    scope: &Scope<'_>,
    environment: &Environment<'_>,
    context: &Map<String, Value>,
    event_document: &Value,
) -> Result<Option<Vec<ActionIntent>>, String> {
    let condition = rule.parsed_condition().map_err(|err| err.to_string())?;
    if let Some(expression) = condition {
        let holds = expression
            .evaluate(scope)
            .map_err(|err| format!("condition '{}': {err}", expression.source()))?;
        if !holds {
            return Ok(None);
        }
    }

    let intents = rule
        .actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let params = action
                .params
                .iter()
                .map(|(name, template)| {
                    environment
                        .render_str(template, context)
                        .map(|rendered| (name.clone(), rendered))
                        .map_err(|err| format!("action {index} parameter '{name}': {err}"))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            let intent_id = intent_id(rule, index, action.kind, &params, event_document);
            Ok(ActionIntent {
                intent_id,
                rule: rule.code.clone(),
                action_index: index,
                kind: IntentKind::from(action.kind),
                params,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(Some(intents))
}

fn build_template_context(event: &AutomationEvent, event_document: &Value) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("entity".to_owned(), event.entity().clone());
    context.insert("event".to_owned(), event_document.clone());
    context.insert("actor".to_owned(), event.actor().clone());
    context.insert("before".to_owned(), event.before().clone());
    context.insert("after".to_owned(), event.after().clone());
    context
}

fn intent_id(
    rule: &AutomationRule,
    index: usize,
    kind: ActionKind,
    params: &BTreeMap<String, String>,
    event_document: &Value,
) -> String {
    let canonical = json!({
        "rule": rule.code.as_str(),
        "index": index,
        "kind": kind.as_str(),
        "params": params,
        "event": event_document,
    })
    .to_string();
    let digest = sha256_hex(canonical.as_bytes());
    let short: String = digest.chars().take(16).collect();
    format!("ai-{index}-{short}")
}

/// Tracks which conflicting intents have already been emitted.
#[derive(Default)]
struct Claims {
    transition_claimed: bool,
    fields: BTreeSet<String>,
}

impl Claims {
    fn admit(&mut self, intent: &ActionIntent) -> bool {
        match intent.kind {
            IntentKind::TransitionStatus => !std::mem::replace(&mut self.transition_claimed, true),
            IntentKind::SetField => {
                let field = intent.param("field").unwrap_or_default().to_owned();
                self.fields.insert(field)
            }
            IntentKind::Notify
            | IntentKind::CreateTask
            | IntentKind::Webhook
            | IntentKind::RuleQuarantined => true,
        }
    }
}
