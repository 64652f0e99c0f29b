//! Then steps for capability bridge scenarios.

use super::world::{BridgeWorld, run_async};
use capability_bridge::capability::domain::PageInstanceId;
use rstest_bdd_macros::then;

#[then("the agent UI lists {count:usize} tools")]
fn agent_lists_tools(world: &BridgeWorld, count: usize) -> Result<(), eyre::Report> {
    let agent = world
        .agent
        .as_ref()
        .ok_or_else(|| eyre::eyre!("agent UI is not open"))?;
    let listed = agent
        .snapshot()
        .map_err(|err| eyre::eyre!("snapshot failed: {err}"))?
        .tools
        .len();
    if listed != count {
        return Err(eyre::eyre!("expected {count} tools, agent UI lists {listed}"));
    }
    Ok(())
}

#[then(r#"the call fails with "{message}""#)]
fn call_fails_with(world: &BridgeWorld, message: String) -> Result<(), eyre::Report> {
    let outcome = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no call was made"))?;
    if outcome.error_message() != Some(message.as_str()) {
        return Err(eyre::eyre!("expected error '{message}', got {outcome:?}"));
    }
    Ok(())
}

#[then("the call succeeds")]
fn call_succeeds(world: &BridgeWorld) -> Result<(), eyre::Report> {
    let outcome = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no call was made"))?;
    if !outcome.is_success() {
        return Err(eyre::eyre!("expected success, got {outcome:?}"));
    }
    Ok(())
}

#[then("the router lists {count:usize} tools for page instance {page:u64}")]
fn router_lists_tools(world: &BridgeWorld, count: usize, page: u64) -> Result<(), eyre::Report> {
    let tools = run_async(world.bridge.router.tools_for(&PageInstanceId::from(page)))?;
    if tools.len() != count {
        return Err(eyre::eyre!(
            "expected {count} tools, router lists {}",
            tools.len()
        ));
    }
    Ok(())
}
