//! Given steps for status transition BDD scenarios.

use super::world::{StatusTransitionWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tenant_workflow::{
    vocabulary::{
        domain::{Code, TaskStatus},
        services::TenantContext,
    },
    workflow::domain::StatusTransition,
};

fn code(raw: &str) -> Result<Code, eyre::Report> {
    Code::new(raw).map_err(|err| eyre::eyre!("invalid code '{raw}' in scenario: {err}"))
}

#[given(r#"a freshly seeded tenant "{tenant}""#)]
fn freshly_seeded_tenant(
    world: &mut StatusTransitionWorld,
    tenant: String,
) -> Result<(), eyre::Report> {
    let context = TenantContext::for_tenant(&tenant).wrap_err("build tenant context")?;
    run_async(world.vocabulary.snapshot(&context)).wrap_err("seed tenant on first access")?;
    world.context = Some(context);
    Ok(())
}

#[given(r#"the tenant adds the status "{status}" at order {order:u32}"#)]
fn tenant_adds_status(
    world: &mut StatusTransitionWorld,
    status: String,
    order: u32,
) -> Result<(), eyre::Report> {
    let context = world.context()?.clone();
    let row = TaskStatus::new(code(&status)?, status.replace('_', " ")).with_order(order);
    run_async(world.vocabulary.create(&context, row)).wrap_err("create status in scenario setup")?;
    Ok(())
}

#[given(r#"the tenant adds an edge from "{from}" to "{to}""#)]
fn tenant_adds_edge(
    world: &mut StatusTransitionWorld,
    from: String,
    to: String,
) -> Result<(), eyre::Report> {
    let context = world.context()?.clone();
    let edge = StatusTransition::new(code(&from)?, code(&to)?);
    run_async(world.transitions.add_edge(&context, edge)).wrap_err("add edge in scenario setup")?;
    Ok(())
}

#[given(r#"the tenant adds an edge from "{from}" to "{to}" requiring a reason"#)]
fn tenant_adds_guarded_edge(
    world: &mut StatusTransitionWorld,
    from: String,
    to: String,
) -> Result<(), eyre::Report> {
    let context = world.context()?.clone();
    let edge = StatusTransition::new(code(&from)?, code(&to)?).requiring_reason();
    run_async(world.transitions.add_edge(&context, edge))
        .wrap_err("add guarded edge in scenario setup")?;
    Ok(())
}
