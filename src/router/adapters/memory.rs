//! In-memory directory store.

use crate::capability::domain::{CapabilityDirectory, PageInstanceId};
use crate::router::ports::{DirectoryStore, DirectoryStoreError, DirectoryStoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory directory store.
///
/// Clones share state, so a clone kept by a test outlives any router built
/// on it and plays the part of durable storage across router restarts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectoryStore {
    state: Arc<RwLock<BTreeMap<PageInstanceId, CapabilityDirectory>>>,
}

impl InMemoryDirectoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> DirectoryStoreError {
    DirectoryStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn load_all(&self) -> DirectoryStoreResult<BTreeMap<PageInstanceId, CapabilityDirectory>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.clone())
    }

    async fn load(
        &self,
        page: &PageInstanceId,
    ) -> DirectoryStoreResult<Option<CapabilityDirectory>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(page).cloned())
    }

    async fn save(
        &self,
        page: &PageInstanceId,
        directory: &CapabilityDirectory,
    ) -> DirectoryStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.insert(page.clone(), directory.clone());
        Ok(())
    }

    async fn remove(&self, page: &PageInstanceId) -> DirectoryStoreResult<bool> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.remove(page).is_some())
    }
}
