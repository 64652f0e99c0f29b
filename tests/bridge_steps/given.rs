//! Given steps for capability bridge scenarios.

use super::world::{BridgeWorld, run_async};
use crate::test_helpers::delayed_tool;
use capability_bridge::capability::domain::PageInstanceId;
use capability_bridge::registry::ports::ModelContext;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use std::time::Duration;

#[given(r#"page instance {page:u64} offers a tool named "{name}""#)]
fn page_offers_tool(world: &mut BridgeWorld, page: u64, name: String) -> Result<(), eyre::Report> {
    let page_id = PageInstanceId::from(page);
    if world.page.is_none() {
        world.page = Some(world.bridge.open_page(page_id.clone())?);
    }
    let context = world
        .page
        .as_ref()
        .ok_or_else(|| eyre::eyre!("page instance was not opened"))?;
    let expected = context.registry.directory()?.tools().len() + 1;
    context
        .registry
        .register_tool(delayed_tool(&name, Duration::ZERO)?)
        .wrap_err("register tool on page")?;
    run_async(world.bridge.wait_for_tools(&page_id, expected))
}
