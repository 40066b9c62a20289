//! When steps for status transition BDD scenarios.

use super::world::{StatusTransitionWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use tenant_workflow::workflow::domain::TransitionContext;

#[when(r#"the transition from "{from}" to "{to}" is checked"#)]
fn transition_is_checked(
    world: &mut StatusTransitionWorld,
    from: String,
    to: String,
) -> Result<(), eyre::Report> {
    let context = world.context()?.clone();
    let result = run_async(world.transitions.check(
        &context,
        &from,
        &to,
        &TransitionContext::default(),
    ));
    world.last_check = Some(result);
    Ok(())
}

#[when(r#"the targets allowed from "{from}" are listed"#)]
fn allowed_targets_are_listed(
    world: &mut StatusTransitionWorld,
    from: String,
) -> Result<(), eyre::Report> {
    let context = world.context()?.clone();
    let allowed = run_async(world.transitions.allowed(&context, &from))
        .wrap_err("list allowed targets")?;
    world.last_allowed = Some(allowed);
    Ok(())
}
