//! Registration surface exposed to page code.

use crate::protocol::{SamplingRequest, SamplingResponse};
use crate::registry::domain::{
    PromptDefinition, RegistryError, ResourceDefinition, ToolDefinition,
};
use async_trait::async_trait;

/// The page-visible registration surface.
///
/// [`crate::registry::services::CapabilityRegistry`] implements it and can
/// wrap a pre-existing implementation, forwarding every registration to it.
#[async_trait]
pub trait ModelContext: Send + Sync {
    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the definition is rejected.
    fn register_tool(&self, definition: ToolDefinition) -> Result<(), RegistryError>;

    /// Registers a resource.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the definition is rejected.
    fn register_resource(&self, definition: ResourceDefinition) -> Result<(), RegistryError>;

    /// Registers a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the definition is rejected.
    fn register_prompt(&self, definition: PromptDefinition) -> Result<(), RegistryError>;

    /// Asks the agent's model to answer on the page's initiative.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Sampling`] when the model call fails or
    /// times out.
    async fn request_sampling(
        &self,
        request: SamplingRequest,
    ) -> Result<SamplingResponse, RegistryError>;
}
