//! Then steps for status transition BDD scenarios.

use super::world::StatusTransitionWorld;
use rstest_bdd_macros::then;

fn check_outcome(world: &StatusTransitionWorld) -> Result<bool, eyre::Report> {
    match world.last_check.as_ref() {
        Some(Ok(allowed)) => Ok(*allowed),
        Some(Err(err)) => Err(eyre::eyre!("expected a check verdict, got error: {err}")),
        None => Err(eyre::eyre!("missing transition check result")),
    }
}

#[then("the transition is allowed")]
fn transition_is_allowed(world: &StatusTransitionWorld) -> Result<(), eyre::Report> {
    if !check_outcome(world)? {
        return Err(eyre::eyre!("expected the transition to be allowed"));
    }
    Ok(())
}

#[then("the transition is refused")]
fn transition_is_refused(world: &StatusTransitionWorld) -> Result<(), eyre::Report> {
    if check_outcome(world)? {
        return Err(eyre::eyre!("expected the transition to be refused"));
    }
    Ok(())
}

#[then(r#"the check fails with "{kind}""#)]
fn check_fails_with(world: &StatusTransitionWorld, kind: String) -> Result<(), eyre::Report> {
    let result = world
        .last_check
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition check result"))?;

    match result {
        Err(err) if err.kind().as_str() == kind => Ok(()),
        other => Err(eyre::eyre!("expected {kind} error, got {other:?}")),
    }
}

#[then(r#"the allowed targets are "{expected}""#)]
fn allowed_targets_are(world: &StatusTransitionWorld, expected: String) -> Result<(), eyre::Report> {
    let allowed = world
        .last_allowed
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing allowed targets"))?;
    let actual: Vec<&str> = allowed.iter().map(|status| status.code.as_str()).collect();
    let wanted: Vec<&str> = expected.split(',').map(str::trim).collect();

    if actual != wanted {
        return Err(eyre::eyre!("expected targets {wanted:?}, found {actual:?}"));
    }
    Ok(())
}
