//! Durable key-value port for capability directories.

use crate::capability::domain::{CapabilityDirectory, PageInstanceId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory store operations.
pub type DirectoryStoreResult<T> = Result<T, DirectoryStoreError>;

/// Persistence contract for per-page capability directories.
///
/// Implementations must survive the router that uses them.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Loads every persisted directory.
    async fn load_all(&self) -> DirectoryStoreResult<BTreeMap<PageInstanceId, CapabilityDirectory>>;

    /// Loads the directory of one page instance.
    async fn load(&self, page: &PageInstanceId)
    -> DirectoryStoreResult<Option<CapabilityDirectory>>;

    /// Replaces the persisted directory of one page instance.
    async fn save(
        &self,
        page: &PageInstanceId,
        directory: &CapabilityDirectory,
    ) -> DirectoryStoreResult<()>;

    /// Deletes the directory of one page instance.
    ///
    /// Returns `false` when nothing was stored for it.
    async fn remove(&self, page: &PageInstanceId) -> DirectoryStoreResult<bool>;
}

/// Errors returned by directory store implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryStoreError {
    /// Persisted data could not be decoded into directories.
    #[error("invalid persisted directory data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryStoreError {
    /// Wraps persisted-data decoding failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
