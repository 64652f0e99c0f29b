//! Shared world state for capability bridge scenarios.

use crate::test_helpers::{Bridge, PageContext};
use capability_bridge::capability::domain::CallOutcome;
use capability_bridge::config::BridgeConfig;
use capability_bridge::controller::{adapters::ScriptedModelClient, services::AgentController};
use capability_bridge::router::adapters::InMemoryDirectoryStore;
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;

/// Agent UI type used by the scenarios.
pub type TestAgent = AgentController<ScriptedModelClient, DefaultClock>;

/// Scenario world for capability bridge behaviour tests.
pub struct BridgeWorld {
    /// Router, relays, and agent UI slot.
    pub bridge: Bridge<InMemoryDirectoryStore>,
    /// Open page instance, if any.
    pub page: Option<PageContext>,
    /// Open agent UI, if any.
    pub agent: Option<TestAgent>,
    /// Outcome of the last call made by the agent UI.
    pub last_outcome: Option<CallOutcome>,
}

impl BridgeWorld {
    /// Creates a world with an empty store and nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bridge: Bridge::new(
                Arc::new(InMemoryDirectoryStore::new()),
                BridgeConfig::default(),
            ),
            page: None,
            agent: None,
            last_outcome: None,
        }
    }

    /// Replaces the router with a fresh one over the same store.
    pub fn restart_router(&mut self) {
        self.bridge = Bridge::new(Arc::clone(&self.bridge.store), self.bridge.config.clone());
    }
}

impl Default for BridgeWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BridgeWorld {
    BridgeWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
