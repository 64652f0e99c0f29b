//! In-process link adapters.
//!
//! [`RelayHub`] routes directives to the relay connected for each page
//! instance. [`ControllerSlot`] holds the agent UI while it is open. Both
//! report [`LinkError::Unreachable`] when nothing is connected.

use crate::capability::domain::{CallOutcome, PageInstanceId};
use crate::protocol::{BridgeMessage, Envelope, PageDirective, SamplingRequest};
use crate::router::ports::{ControllerLink, LinkError, LinkResult, RelayLink};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of connected relays, keyed by page instance.
#[derive(Clone, Default)]
pub struct RelayHub {
    relays: Arc<RwLock<HashMap<PageInstanceId, Arc<dyn RelayLink>>>>,
}

impl RelayHub {
    /// Creates a hub with no connected relays.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects the relay serving `page`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Unreachable`] when the hub lock is poisoned.
    pub fn connect(&self, page: PageInstanceId, relay: Arc<dyn RelayLink>) -> LinkResult<()> {
        let mut relays = self
            .relays
            .write()
            .map_err(|err| LinkError::Unreachable(err.to_string()))?;
        relays.insert(page, relay);
        Ok(())
    }

    /// Disconnects the relay serving `page`.
    ///
    /// Returns `false` when no relay was connected.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Unreachable`] when the hub lock is poisoned.
    pub fn disconnect(&self, page: &PageInstanceId) -> LinkResult<bool> {
        let mut relays = self
            .relays
            .write()
            .map_err(|err| LinkError::Unreachable(err.to_string()))?;
        Ok(relays.remove(page).is_some())
    }

    fn relay_for(&self, page: &PageInstanceId) -> LinkResult<Arc<dyn RelayLink>> {
        let relays = self
            .relays
            .read()
            .map_err(|err| LinkError::Unreachable(err.to_string()))?;
        relays
            .get(page)
            .cloned()
            .ok_or_else(|| LinkError::Unreachable(format!("relay for page instance {page}")))
    }
}

#[async_trait]
impl RelayLink for RelayHub {
    async fn dispatch(
        &self,
        page: &PageInstanceId,
        directive: Envelope<PageDirective>,
    ) -> LinkResult<CallOutcome> {
        let relay = self.relay_for(page)?;
        relay.dispatch(page, directive).await
    }
}

/// Slot holding the agent UI link while the UI is open.
#[derive(Clone, Default)]
pub struct ControllerSlot {
    controller: Arc<RwLock<Option<Arc<dyn ControllerLink>>>>,
}

impl ControllerSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugs the agent UI in.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Unreachable`] when the slot lock is poisoned.
    pub fn attach(&self, controller: Arc<dyn ControllerLink>) -> LinkResult<()> {
        let mut slot = self
            .controller
            .write()
            .map_err(|err| LinkError::Unreachable(err.to_string()))?;
        *slot = Some(controller);
        Ok(())
    }

    /// Unplugs the agent UI, as when its panel closes.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Unreachable`] when the slot lock is poisoned.
    pub fn detach(&self) -> LinkResult<()> {
        let mut slot = self
            .controller
            .write()
            .map_err(|err| LinkError::Unreachable(err.to_string()))?;
        *slot = None;
        Ok(())
    }

    fn current(&self) -> LinkResult<Arc<dyn ControllerLink>> {
        let slot = self
            .controller
            .read()
            .map_err(|err| LinkError::Unreachable(err.to_string()))?;
        slot.clone()
            .ok_or_else(|| LinkError::Unreachable("agent UI".to_owned()))
    }
}

#[async_trait]
impl ControllerLink for ControllerSlot {
    async fn notify(&self, update: Envelope<BridgeMessage>) -> LinkResult<()> {
        self.current()?.notify(update).await
    }

    async fn sample(&self, request: Envelope<SamplingRequest>) -> LinkResult<CallOutcome> {
        self.current()?.sample(request).await
    }
}
