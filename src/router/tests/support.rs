//! Link doubles shared by router tests.

use crate::capability::domain::{CallOutcome, CapabilityDirectory, PageInstanceId};
use crate::protocol::{BridgeMessage, Envelope, PageDirective, SamplingRequest};
use crate::router::adapters::InMemoryDirectoryStore;
use crate::router::ports::{
    ControllerLink, DirectoryStore, DirectoryStoreError, DirectoryStoreResult, LinkResult,
    RelayLink,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Relay double echoing the directive name as a successful result.
#[derive(Default)]
pub(super) struct EchoRelay {
    pub(super) seen: Mutex<Vec<(PageInstanceId, PageDirective)>>,
}

#[async_trait]
impl RelayLink for EchoRelay {
    async fn dispatch(
        &self,
        page: &PageInstanceId,
        directive: Envelope<PageDirective>,
    ) -> LinkResult<CallOutcome> {
        let opened = directive.open(1)?;
        let name = opened.name().to_owned();
        self.seen.lock().expect("lock").push((page.clone(), opened));
        Ok(CallOutcome::success(json!({ "echo": name })))
    }
}

/// Agent UI double recording updates and answering sampling after a delay.
pub(super) struct RecordingController {
    pub(super) updates: Mutex<Vec<BridgeMessage>>,
    pub(super) sampling_delay: Duration,
}

impl RecordingController {
    pub(super) fn answering_after(sampling_delay: Duration) -> Self {
        Self {
            updates: Mutex::default(),
            sampling_delay,
        }
    }

    pub(super) fn updates(&self) -> Vec<BridgeMessage> {
        self.updates.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ControllerLink for RecordingController {
    async fn notify(&self, update: Envelope<BridgeMessage>) -> LinkResult<()> {
        self.updates.lock().expect("lock").push(update.open(1)?);
        Ok(())
    }

    async fn sample(&self, request: Envelope<SamplingRequest>) -> LinkResult<CallOutcome> {
        let opened = request.open(1)?;
        tokio::time::sleep(self.sampling_delay).await;
        Ok(CallOutcome::success(json!({
            "role": "assistant",
            "content": { "type": "text", "text": format!("{} messages read", opened.messages.len()) }
        })))
    }
}

/// Store double whose writes and deletes can be switched to fail.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryDirectoryStore,
    failing_saves: AtomicBool,
    failing_removes: AtomicBool,
}

impl FlakyStore {
    pub(super) fn fail_saves(&self, failing: bool) {
        self.failing_saves.store(failing, Ordering::SeqCst);
    }

    pub(super) fn fail_removes(&self, failing: bool) {
        self.failing_removes.store(failing, Ordering::SeqCst);
    }
}

fn disk_full() -> DirectoryStoreError {
    DirectoryStoreError::persistence(std::io::Error::other("disk full"))
}

#[async_trait]
impl DirectoryStore for FlakyStore {
    async fn load_all(&self) -> DirectoryStoreResult<BTreeMap<PageInstanceId, CapabilityDirectory>> {
        self.inner.load_all().await
    }

    async fn load(
        &self,
        page: &PageInstanceId,
    ) -> DirectoryStoreResult<Option<CapabilityDirectory>> {
        self.inner.load(page).await
    }

    async fn save(
        &self,
        page: &PageInstanceId,
        directory: &CapabilityDirectory,
    ) -> DirectoryStoreResult<()> {
        if self.failing_saves.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.save(page, directory).await
    }

    async fn remove(&self, page: &PageInstanceId) -> DirectoryStoreResult<bool> {
        if self.failing_removes.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.remove(page).await
    }
}
