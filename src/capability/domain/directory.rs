//! Per-page-instance directory of advertised capabilities.

use super::{
    CapabilityDescriptor, CapabilityKind, PromptDescriptor, ResourceDescriptor, ToolDescriptor,
};
use serde::{Deserialize, Serialize};

/// Result of inserting a descriptor into a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryInsertion {
    /// The descriptor was appended.
    Added,
    /// A capability of the same kind and name already existed; the directory
    /// is unchanged.
    Duplicate,
}

impl DirectoryInsertion {
    /// Returns whether the directory changed.
    #[must_use]
    pub const fn is_added(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Ordered tools, resources, and prompts advertised by one page instance.
///
/// Names are unique per kind. The first registration under a name wins and
/// later ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDirectory {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
    #[serde(default)]
    resources: Vec<ResourceDescriptor>,
    #[serde(default)]
    prompts: Vec<PromptDescriptor>,
}

impl CapabilityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a descriptor unless its name is already taken for its kind.
    pub fn insert(&mut self, descriptor: CapabilityDescriptor) -> DirectoryInsertion {
        if self.contains(descriptor.kind(), descriptor.name()) {
            return DirectoryInsertion::Duplicate;
        }
        match descriptor {
            CapabilityDescriptor::Tool(tool) => self.tools.push(tool),
            CapabilityDescriptor::Resource(resource) => self.resources.push(resource),
            CapabilityDescriptor::Prompt(prompt) => self.prompts.push(prompt),
        }
        DirectoryInsertion::Added
    }

    /// Returns whether a capability of `kind` named `name` exists.
    #[must_use]
    pub fn contains(&self, kind: CapabilityKind, name: &str) -> bool {
        match kind {
            CapabilityKind::Tool => self.tools.iter().any(|tool| tool.name() == name),
            CapabilityKind::Resource => self
                .resources
                .iter()
                .any(|resource| resource.name() == name),
            CapabilityKind::Prompt => self.prompts.iter().any(|prompt| prompt.name() == name),
        }
    }

    /// Returns the advertised tools in registration order.
    #[must_use]
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Returns the advertised resources in registration order.
    #[must_use]
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    /// Returns the advertised prompts in registration order.
    #[must_use]
    pub fn prompts(&self) -> &[PromptDescriptor] {
        &self.prompts
    }

    /// Returns the number of capabilities of `kind`.
    #[must_use]
    pub fn len_of(&self, kind: CapabilityKind) -> usize {
        match kind {
            CapabilityKind::Tool => self.tools.len(),
            CapabilityKind::Resource => self.resources.len(),
            CapabilityKind::Prompt => self.prompts.len(),
        }
    }

    /// Returns whether no capability of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.resources.is_empty() && self.prompts.is_empty()
    }
}
