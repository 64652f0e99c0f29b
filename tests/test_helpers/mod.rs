//! In-process wiring of pages, router, and agent UI for integration tests.

use capability_bridge::capability::domain::{PageInstanceId, ToolDescriptor};
use capability_bridge::config::BridgeConfig;
use capability_bridge::controller::{
    domain::AgentSettings, ports::ModelClient, services::AgentController,
};
use capability_bridge::protocol::PageEventBus;
use capability_bridge::registry::{
    adapters::tool_fn, domain::ToolDefinition, services::CapabilityRegistry,
};
use capability_bridge::relay::Relay;
use capability_bridge::router::{
    adapters::{ControllerSlot, RelayHub},
    ports::{ControllerLink, DirectoryStore, RelayLink, RouterLink},
    services::Router,
};
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Router type assembled by [`Bridge`].
pub type TestRouter<S> = Router<S, DefaultClock>;

/// One router with its relay hub and agent UI slot.
pub struct Bridge<S: DirectoryStore + 'static> {
    /// Shared configuration.
    pub config: BridgeConfig,
    /// Durable store behind the router.
    pub store: Arc<S>,
    /// Relays connected to the router.
    pub relays: RelayHub,
    /// Agent UI slot notified by the router.
    pub agent_ui: ControllerSlot,
    /// Router under test.
    pub router: Arc<TestRouter<S>>,
}

impl<S: DirectoryStore + 'static> Bridge<S> {
    /// Starts a router over `store`.
    pub fn new(store: Arc<S>, config: BridgeConfig) -> Self {
        let relays = RelayHub::new();
        let agent_ui = ControllerSlot::new();
        let router = Arc::new(Router::new(
            Arc::clone(&store),
            Arc::new(relays.clone()) as Arc<dyn RelayLink>,
            Arc::new(agent_ui.clone()) as Arc<dyn ControllerLink>,
            &config,
            Arc::new(DefaultClock),
        ));
        Self {
            config,
            store,
            relays,
            agent_ui,
            router,
        }
    }

    /// Opens a page instance: registry, relay, and their listeners.
    pub fn open_page(&self, page: PageInstanceId) -> eyre::Result<PageContext> {
        let bus = PageEventBus::new(self.config.page_bus_capacity);
        let registry = CapabilityRegistry::new(bus.clone(), &self.config, Arc::new(DefaultClock));
        let relay = Relay::new(
            page.clone(),
            bus,
            Arc::clone(&self.router) as Arc<dyn RouterLink>,
            &self.config,
            Arc::new(DefaultClock),
        );
        relay.start();
        let listener = registry.attach();
        self.relays.connect(page, Arc::new(relay.clone()))?;
        Ok(PageContext {
            registry,
            relay,
            listener,
        })
    }

    /// Opens the agent UI and plugs it into the router.
    pub fn open_agent<M: ModelClient + 'static>(
        &self,
        model: M,
        settings: AgentSettings,
    ) -> eyre::Result<AgentController<M, DefaultClock>> {
        let controller = AgentController::new(
            Arc::clone(&self.router) as Arc<dyn RouterLink>,
            Arc::new(model),
            settings,
            &self.config,
            Arc::new(DefaultClock),
        );
        self.agent_ui.attach(Arc::new(controller.clone()))?;
        Ok(controller)
    }

    /// Waits until the router lists `count` tools for `page`.
    pub async fn wait_for_tools(&self, page: &PageInstanceId, count: usize) -> eyre::Result<()> {
        for _ in 0..200 {
            if self.router.tools_for(page).await?.len() >= count {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Err(eyre::eyre!("router never listed {count} tools for {page}"))
    }
}

/// Page-side components of one page instance.
pub struct PageContext {
    /// Capability registry of the page.
    pub registry: CapabilityRegistry<DefaultClock>,
    /// Relay serving the page.
    pub relay: Relay<DefaultClock>,
    listener: JoinHandle<()>,
}

impl PageContext {
    /// Closes the page: the relay tells the router and stops listening.
    pub async fn close(self) {
        self.relay.shutdown().await;
        self.listener.abort();
    }
}

/// A tool answering `{ "tool": name }` after `delay`.
pub fn delayed_tool(name: &str, delay: Duration) -> eyre::Result<ToolDefinition> {
    let descriptor = ToolDescriptor::new(name, format!("Answers after {}ms", delay.as_millis()))?;
    let label = name.to_owned();
    Ok(ToolDefinition::new(
        descriptor,
        tool_fn(move |_args| {
            let answer = json!({ "tool": label.clone() });
            async move {
                tokio::time::sleep(delay).await;
                Ok(answer)
            }
        }),
    ))
}

/// Settings with a usable API key.
pub fn keyed_settings() -> AgentSettings {
    AgentSettings::default().with_api_key("integration-key")
}
