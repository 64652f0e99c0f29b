//! Recording model context used as a pre-existing registration surface.

use crate::capability::domain::CapabilityDescriptor;
use crate::protocol::{SamplingRequest, SamplingResponse};
use crate::registry::{
    domain::{PromptDefinition, RegistryError, ResourceDefinition, ToolDefinition},
    ports::ModelContext,
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// In-memory [`ModelContext`] that records every registration it receives.
///
/// It stands in for a registration surface that existed on the page before
/// the bridge wrapped it. It can be told to reject registrations.
#[derive(Debug, Clone, Default)]
pub struct RecordingModelContext {
    state: Arc<RwLock<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    received: Vec<CapabilityDescriptor>,
    rejection: Option<String>,
}

impl RecordingModelContext {
    /// Creates an accepting recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that rejects every registration with `message`.
    #[must_use]
    pub fn rejecting(message: impl Into<String>) -> Self {
        let recorder = Self::default();
        if let Ok(mut state) = recorder.state.write() {
            state.rejection = Some(message.into());
        }
        recorder
    }

    /// Returns every descriptor received so far, in order.
    #[must_use]
    pub fn received(&self) -> Vec<CapabilityDescriptor> {
        self.state
            .read()
            .map(|state| state.received.clone())
            .unwrap_or_default()
    }

    fn record(&self, descriptor: CapabilityDescriptor) -> Result<(), RegistryError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))?;
        state.received.push(descriptor);
        match &state.rejection {
            Some(message) => Err(RegistryError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ModelContext for RecordingModelContext {
    fn register_tool(&self, definition: ToolDefinition) -> Result<(), RegistryError> {
        self.record(definition.descriptor().clone().into())
    }

    fn register_resource(&self, definition: ResourceDefinition) -> Result<(), RegistryError> {
        self.record(definition.descriptor().clone().into())
    }

    fn register_prompt(&self, definition: PromptDefinition) -> Result<(), RegistryError> {
        self.record(definition.descriptor().clone().into())
    }

    async fn request_sampling(
        &self,
        _request: SamplingRequest,
    ) -> Result<SamplingResponse, RegistryError> {
        Err(RegistryError::Sampling(
            "recording context cannot sample".to_owned(),
        ))
    }
}
