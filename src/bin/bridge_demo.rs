//! Runs one page, the router, and the agent UI in a single process.
//!
//! Usage:
//!
//! ```text
//! RUST_LOG=debug bridge_demo
//! ```
//!
//! The page registers a `count_widgets` tool and a `page_title` resource.
//! The agent UI, driven by a scripted model, asks how many widgets the page
//! lists; the model calls the tool and answers. Closing the page then
//! removes its directory from the file-backed store.

use camino::Utf8PathBuf;
use capability_bridge::capability::domain::{PageInstanceId, ResourceDescriptor, ToolDescriptor};
use capability_bridge::config::BridgeConfig;
use capability_bridge::controller::{
    adapters::ScriptedModelClient,
    domain::{AgentSettings, FunctionCall, ModelTurn},
    services::AgentController,
};
use capability_bridge::protocol::PageEventBus;
use capability_bridge::registry::{
    adapters::{resource_fn, tool_fn},
    domain::{ResourceDefinition, ToolDefinition},
    ports::ModelContext,
    services::CapabilityRegistry,
};
use capability_bridge::relay::Relay;
use capability_bridge::router::{
    adapters::{ControllerSlot, JsonFileDirectoryStore, RelayHub},
    ports::{ControllerLink, RelayLink, RouterLink},
    services::Router,
};
use mockable::DefaultClock;
use serde_json::{Map, json};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn scratch_dir() -> Result<Utf8PathBuf, BoxError> {
    let path = std::env::temp_dir().join(format!(
        "capability-bridge-demo-{}",
        uuid::Uuid::new_v4()
    ));
    std::fs::create_dir_all(&path)?;
    Utf8PathBuf::from_path_buf(path)
        .map_err(|raw| format!("temporary directory is not UTF-8: {}", raw.display()).into())
}

fn register_page_capabilities(registry: &CapabilityRegistry<DefaultClock>) -> Result<(), BoxError> {
    let counter = ToolDescriptor::new("count_widgets", "Counts the widgets listed on the page")?
        .with_input_schema(json!({ "type": "object", "properties": {} }));
    registry.register_tool(ToolDefinition::new(
        counter,
        tool_fn(|_args| async { Ok(json!({ "widgets": 3 })) }),
    ))?;

    let title = ResourceDescriptor::new("page_title", "Title of the current page")?;
    registry.register_resource(ResourceDefinition::new(
        title,
        resource_fn(|| async { Ok(json!("Widget catalogue")) }),
    ))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,capability_bridge=debug")),
        )
        .init();

    let config = BridgeConfig::default();
    let clock = Arc::new(DefaultClock);
    let store_dir = scratch_dir()?;
    let store = Arc::new(JsonFileDirectoryStore::from_config(&store_dir, &config)?);
    tracing::info!(path = %store_dir.join(store.record()), "directory record");

    let relays = RelayHub::new();
    let agent_ui = ControllerSlot::new();
    let router = Arc::new(Router::new(
        store,
        Arc::new(relays.clone()) as Arc<dyn RelayLink>,
        Arc::new(agent_ui.clone()) as Arc<dyn ControllerLink>,
        &config,
        Arc::clone(&clock),
    ));

    let page = PageInstanceId::from(42);
    let bus = PageEventBus::new(config.page_bus_capacity);
    let registry = CapabilityRegistry::new(bus.clone(), &config, Arc::clone(&clock));
    let relay = Relay::new(
        page.clone(),
        bus,
        Arc::clone(&router) as Arc<dyn RouterLink>,
        &config,
        Arc::clone(&clock),
    );
    relay.start();
    let page_listener = registry.attach();
    relays.connect(page.clone(), Arc::new(relay.clone()))?;
    register_page_capabilities(&registry)?;

    let model = ScriptedModelClient::new()
        .then(ModelTurn::FunctionCalls(vec![FunctionCall::new(
            "count_widgets",
            Map::new(),
        )]))
        .then(ModelTurn::Text("The page lists 3 widgets.".to_owned()));
    let controller = AgentController::new(
        Arc::clone(&router) as Arc<dyn RouterLink>,
        Arc::new(model),
        AgentSettings::default().with_api_key("demo-key"),
        &config,
        Arc::clone(&clock),
    );
    agent_ui.attach(Arc::new(controller.clone()))?;

    // Discovery travels page -> relay -> router asynchronously.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = controller.activate(page.clone()).await?;
    tracing::info!(
        tools = snapshot.tools.len(),
        resources = snapshot.resources.len(),
        "agent UI ready"
    );
    let answer = controller
        .send_user_message("How many widgets are listed?")
        .await?;
    tracing::info!(%answer, "assistant answered");
    let title = controller.read_resource("page_title").await?;
    tracing::info!(title = %title.result(), "resource read");

    relay.shutdown().await;
    page_listener.abort();
    relays.disconnect(&page)?;
    agent_ui.detach()?;
    let remaining = router.tools_for(&page).await?;
    tracing::info!(remaining = remaining.len(), "page closed");
    Ok(())
}
