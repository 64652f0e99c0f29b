//! Per-page directory arena.

use crate::capability::domain::{CapabilityDirectory, CapabilityKind, PageInstanceId};
use crate::protocol::BridgeMessage;
use std::collections::BTreeMap;

/// Capability directories keyed by page instance.
///
/// Removing a page drops everything the router knows about it in one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDirectories {
    pages: BTreeMap<PageInstanceId, CapabilityDirectory>,
}

impl PageDirectories {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the directory of `page`, if cached.
    #[must_use]
    pub fn get(&self, page: &PageInstanceId) -> Option<&CapabilityDirectory> {
        self.pages.get(page)
    }

    /// Replaces the cached directory of `page` with one already persisted.
    pub fn commit(&mut self, page: PageInstanceId, directory: CapabilityDirectory) {
        self.pages.insert(page, directory);
    }

    /// Caches a directory loaded from storage, keeping a cached one if present.
    pub fn hydrate(&mut self, page: PageInstanceId, directory: CapabilityDirectory) {
        self.pages.entry(page).or_insert(directory);
    }

    /// Drops the directory of `page`.
    pub fn remove(&mut self, page: &PageInstanceId) -> Option<CapabilityDirectory> {
        self.pages.remove(page)
    }

    /// Returns the cached page instances.
    pub fn pages(&self) -> impl Iterator<Item = &PageInstanceId> {
        self.pages.keys()
    }

    /// Returns the number of cached page instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns whether no page instance is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Builds the update pushed to the agent UI after `kind` changed for `page`.
#[must_use]
pub fn context_update(
    page: &PageInstanceId,
    directory: &CapabilityDirectory,
    kind: CapabilityKind,
) -> BridgeMessage {
    let tab_id = page.clone();
    match kind {
        CapabilityKind::Tool => BridgeMessage::ContextUpdated {
            tab_id,
            tools: directory.tools().to_vec(),
        },
        CapabilityKind::Resource => BridgeMessage::ResourceContextUpdated {
            tab_id,
            resources: directory.resources().to_vec(),
        },
        CapabilityKind::Prompt => BridgeMessage::PromptContextUpdated {
            tab_id,
            prompts: directory.prompts().to_vec(),
        },
    }
}
