//! Capability definitions: public metadata paired with a handler.

use crate::capability::domain::{
    CapabilityDescriptor, CapabilityKind, PromptDescriptor, ResourceDescriptor, ToolDescriptor,
};
use crate::registry::ports::{PromptHandler, ResourceHandler, ToolHandler};
use std::fmt;
use std::sync::Arc;

/// A tool as registered by page code.
#[derive(Clone)]
pub struct ToolDefinition {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    /// Pairs tool metadata with its invocation handler.
    #[must_use]
    pub fn new(descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    /// Returns the public metadata.
    #[must_use]
    pub const fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Returns the invocation handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ToolDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A resource as registered by page code.
#[derive(Clone)]
pub struct ResourceDefinition {
    descriptor: ResourceDescriptor,
    handler: Arc<dyn ResourceHandler>,
}

impl ResourceDefinition {
    /// Pairs resource metadata with its read handler.
    #[must_use]
    pub fn new(descriptor: ResourceDescriptor, handler: Arc<dyn ResourceHandler>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    /// Returns the public metadata.
    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Returns the read handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn ResourceHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResourceDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A prompt template as registered by page code.
#[derive(Clone)]
pub struct PromptDefinition {
    descriptor: PromptDescriptor,
    handler: Arc<dyn PromptHandler>,
}

impl PromptDefinition {
    /// Pairs prompt metadata with its get handler.
    #[must_use]
    pub fn new(descriptor: PromptDescriptor, handler: Arc<dyn PromptHandler>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    /// Returns the public metadata.
    #[must_use]
    pub const fn descriptor(&self) -> &PromptDescriptor {
        &self.descriptor
    }

    /// Returns the get handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn PromptHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for PromptDefinition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PromptDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Any registrable capability.
#[derive(Debug, Clone)]
pub enum Capability {
    /// A tool.
    Tool(ToolDefinition),
    /// A resource.
    Resource(ResourceDefinition),
    /// A prompt.
    Prompt(PromptDefinition),
}

impl Capability {
    /// Returns the capability kind.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Tool(_) => CapabilityKind::Tool,
            Self::Resource(_) => CapabilityKind::Resource,
            Self::Prompt(_) => CapabilityKind::Prompt,
        }
    }

    /// Returns the public metadata, without the handler.
    #[must_use]
    pub fn descriptor(&self) -> CapabilityDescriptor {
        match self {
            Self::Tool(definition) => definition.descriptor().clone().into(),
            Self::Resource(definition) => definition.descriptor().clone().into(),
            Self::Prompt(definition) => definition.descriptor().clone().into(),
        }
    }
}

impl From<ToolDefinition> for Capability {
    fn from(definition: ToolDefinition) -> Self {
        Self::Tool(definition)
    }
}

impl From<ResourceDefinition> for Capability {
    fn from(definition: ResourceDefinition) -> Self {
        Self::Resource(definition)
    }
}

impl From<PromptDefinition> for Capability {
    fn from(definition: PromptDefinition) -> Self {
        Self::Prompt(definition)
    }
}
