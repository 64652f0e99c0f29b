//! When steps for capability bridge scenarios.

use super::world::{BridgeWorld, run_async};
use crate::test_helpers::keyed_settings;
use capability_bridge::capability::domain::PageInstanceId;
use capability_bridge::controller::adapters::ScriptedModelClient;
use rstest_bdd_macros::when;
use serde_json::Map;

#[when("the agent UI activates page instance {page:u64}")]
fn agent_activates(world: &mut BridgeWorld, page: u64) -> Result<(), eyre::Report> {
    let agent = world
        .bridge
        .open_agent(ScriptedModelClient::new(), keyed_settings())?;
    run_async(agent.activate(PageInstanceId::from(page)))
        .map_err(|err| eyre::eyre!("activation failed: {err}"))?;
    world.agent = Some(agent);
    Ok(())
}

#[when(r#"the agent UI executes the tool "{name}""#)]
fn agent_executes(world: &mut BridgeWorld, name: String) -> Result<(), eyre::Report> {
    let agent = world
        .agent
        .as_ref()
        .ok_or_else(|| eyre::eyre!("agent UI is not open"))?;
    let outcome = run_async(agent.execute_tool(&name, Map::new()))
        .map_err(|err| eyre::eyre!("execution failed: {err}"))?;
    world.last_outcome = Some(outcome);
    Ok(())
}

#[when("the page instance is closed")]
fn page_closed(world: &mut BridgeWorld) -> Result<(), eyre::Report> {
    let page = world
        .page
        .take()
        .ok_or_else(|| eyre::eyre!("no page instance is open"))?;
    run_async(page.close());
    Ok(())
}

#[when("the router is restarted")]
fn router_restarted(world: &mut BridgeWorld) {
    world.restart_router();
}
