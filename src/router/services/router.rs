//! Router orchestration service.

use crate::capability::domain::{
    BridgeFailure, CallOutcome, CapabilityDescriptor, CapabilityDirectory, DirectoryInsertion,
    PageInstanceId, PromptDescriptor, ResourceDescriptor, ToolDescriptor,
};
use crate::config::BridgeConfig;
use crate::correlation::{CallKind, CorrelationError, PendingCalls};
use crate::protocol::{BridgeMessage, Envelope, PageDirective, ProtocolError, SamplingRequest};
use crate::router::{
    domain::{PageDirectories, context_update},
    ports::{
        ControllerLink, DirectoryStore, DirectoryStoreError, LinkError, LinkResult, RelayLink,
        RouterLink,
    },
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

/// Service-level errors for router operations.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// A message failed boundary validation or is not accepted here.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The directory store failed.
    #[error(transparent)]
    Store(#[from] DirectoryStoreError),
    /// The sampling correlation table rejected the request.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    /// A page-scoped message arrived without a page origin.
    #[error("{0} requires a page origin")]
    MissingOrigin(&'static str),
    /// The directory cache lock was poisoned.
    #[error("router state is unavailable: {0}")]
    Poisoned(String),
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Central arbiter of capability directories and cross-context calls.
///
/// The in-memory directories are a cache over the store. Dropping a router
/// loses nothing: a new router over the same store answers identically.
pub struct Router<S, C>
where
    S: DirectoryStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    directories: Arc<RwLock<PageDirectories>>,
    mutations: Arc<AsyncMutex<()>>,
    relays: Arc<dyn RelayLink>,
    controller: Arc<dyn ControllerLink>,
    sampling: PendingCalls<C>,
    clock: Arc<C>,
    sampling_timeout: Duration,
    protocol_version: u32,
}

impl<S, C> Clone for Router<S, C>
where
    S: DirectoryStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directories: Arc::clone(&self.directories),
            mutations: Arc::clone(&self.mutations),
            relays: Arc::clone(&self.relays),
            controller: Arc::clone(&self.controller),
            sampling: self.sampling.clone(),
            clock: Arc::clone(&self.clock),
            sampling_timeout: self.sampling_timeout,
            protocol_version: self.protocol_version,
        }
    }
}

impl<S, C> Router<S, C>
where
    S: DirectoryStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a router with an empty cache.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        relays: Arc<dyn RelayLink>,
        controller: Arc<dyn ControllerLink>,
        config: &BridgeConfig,
        clock: Arc<C>,
    ) -> Self {
        Self {
            store,
            directories: Arc::default(),
            mutations: Arc::default(),
            relays,
            controller,
            sampling: PendingCalls::new(Arc::clone(&clock)),
            clock,
            sampling_timeout: config.sampling_timeout(),
            protocol_version: config.protocol_version,
        }
    }

    fn read_cache(&self) -> RouterResult<RwLockReadGuard<'_, PageDirectories>> {
        self.directories
            .read()
            .map_err(|err| RouterError::Poisoned(err.to_string()))
    }

    fn write_cache(&self) -> RouterResult<RwLockWriteGuard<'_, PageDirectories>> {
        self.directories
            .write()
            .map_err(|err| RouterError::Poisoned(err.to_string()))
    }

    /// Loads every persisted directory into the cache.
    ///
    /// Returns the number of page instances restored. Optional: every read
    /// path already falls back to the store on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Store`] when the store cannot be read.
    pub async fn restore(&self) -> RouterResult<usize> {
        let persisted = self.store.load_all().await?;
        let restored = persisted.len();
        let mut cache = self.write_cache()?;
        for (page, directory) in persisted {
            cache.hydrate(page, directory);
        }
        tracing::info!(restored, "router cache restored from store");
        Ok(restored)
    }

    /// Returns the page instances currently cached.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Poisoned`] when the cache lock is poisoned.
    pub fn cached_pages(&self) -> RouterResult<Vec<PageInstanceId>> {
        Ok(self.read_cache()?.pages().cloned().collect())
    }

    /// Returns the directory of `page`, reading through to the store on a
    /// cache miss. Unknown pages yield an empty directory.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Store`] when the fallback read fails.
    pub async fn directory_for(&self, page: &PageInstanceId) -> RouterResult<CapabilityDirectory> {
        let cached = self.read_cache()?.get(page).cloned();
        if let Some(directory) = cached {
            return Ok(directory);
        }
        let Some(persisted) = self.store.load(page).await? else {
            return Ok(CapabilityDirectory::new());
        };
        tracing::debug!(page = %page, "directory rehydrated from store");
        let mut cache = self.write_cache()?;
        cache.hydrate(page.clone(), persisted);
        Ok(cache.get(page).cloned().unwrap_or_default())
    }

    /// Returns the tools of `page`.
    ///
    /// # Errors
    ///
    /// See [`Router::directory_for`].
    pub async fn tools_for(&self, page: &PageInstanceId) -> RouterResult<Vec<ToolDescriptor>> {
        Ok(self.directory_for(page).await?.tools().to_vec())
    }

    /// Returns the resources of `page`.
    ///
    /// # Errors
    ///
    /// See [`Router::directory_for`].
    pub async fn resources_for(
        &self,
        page: &PageInstanceId,
    ) -> RouterResult<Vec<ResourceDescriptor>> {
        Ok(self.directory_for(page).await?.resources().to_vec())
    }

    /// Returns the prompts of `page`.
    ///
    /// # Errors
    ///
    /// See [`Router::directory_for`].
    pub async fn prompts_for(&self, page: &PageInstanceId) -> RouterResult<Vec<PromptDescriptor>> {
        Ok(self.directory_for(page).await?.prompts().to_vec())
    }

    /// Records a capability announced by the relay of `page`.
    ///
    /// A new entry is written through to the store and only then cached and
    /// pushed to the agent UI. A duplicate name changes nothing. When the
    /// store fails, the cache is left untouched so a later announcement of
    /// the same name is retried.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Store`] when the store fails.
    pub async fn announce(
        &self,
        page: &PageInstanceId,
        descriptor: CapabilityDescriptor,
    ) -> RouterResult<DirectoryInsertion> {
        let kind = descriptor.kind();
        let name = descriptor.name().to_owned();
        let mutation = self.mutations.lock().await;

        // Start from the persisted view so a cold cache never shadows it.
        let mut directory = self.directory_for(page).await?;
        let insertion = directory.insert(descriptor);
        if !insertion.is_added() {
            tracing::debug!(page = %page, kind = %kind, capability = %name, "duplicate announcement ignored");
            return Ok(insertion);
        }

        if let Err(err) = self.store.save(page, &directory).await {
            tracing::warn!(page = %page, capability = %name, error = %err, "directory not persisted; announcement dropped");
            return Err(err.into());
        }
        self.write_cache()?.commit(page.clone(), directory.clone());
        drop(mutation);
        tracing::info!(page = %page, kind = %kind, capability = %name, "capability available");
        self.notify(context_update(page, &directory, kind)).await;
        Ok(insertion)
    }

    async fn notify(&self, update: BridgeMessage) {
        let kind = update.type_name();
        if let Err(err) = self
            .controller
            .notify(Envelope::stamped(update, &*self.clock))
            .await
        {
            tracing::debug!(update = kind, error = %err, "agent UI not notified");
        }
    }

    /// Forwards a directive to the relay of `page` and returns its outcome
    /// unchanged. An unreachable relay yields a channel error; nothing is
    /// retried.
    pub async fn forward(&self, page: &PageInstanceId, directive: PageDirective) -> CallOutcome {
        tracing::debug!(
            page = %page,
            call_id = %directive.call_id(),
            capability = directive.name(),
            "forwarding directive"
        );
        match self
            .relays
            .dispatch(page, Envelope::stamped(directive, &*self.clock))
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(page = %page, error = %err, "relay unreachable");
                BridgeFailure::ChannelUnavailable(err.to_string()).into()
            }
        }
    }

    /// Forwards a sampling request raised by `page` to the agent UI.
    ///
    /// The wait is owned by `page`, so closing the page fails it.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Correlation`] when the request id is already
    /// pending.
    pub async fn forward_sampling(
        &self,
        page: &PageInstanceId,
        request: SamplingRequest,
    ) -> RouterResult<CallOutcome> {
        let handle = self.sampling.register(
            request.request_id.clone(),
            CallKind::Sampling,
            Some(page.clone()),
            self.sampling_timeout,
        )?;

        let controller = Arc::clone(&self.controller);
        let sampling = self.sampling.clone();
        let request_id = request.request_id.clone();
        let envelope = Envelope::stamped(request, &*self.clock);
        let owner = page.clone();
        tokio::spawn(async move {
            let outcome = match controller.sample(envelope).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(page = %owner, request_id = %request_id, error = %err, "agent UI unreachable for sampling");
                    BridgeFailure::ChannelUnavailable(err.to_string()).into()
                }
            };
            if let Err(err) = sampling.resolve(&request_id, outcome) {
                tracing::warn!(request_id = %request_id, error = %err, "failed to settle sampling request");
            }
        });

        Ok(handle.wait().await)
    }

    /// Tears down everything the router holds for `page`.
    ///
    /// Pending sampling calls owned by `page` are always retired. The
    /// directory leaves the store first and the cache second, so a failed
    /// delete keeps both in agreement. Returns `true` when a directory
    /// existed in the cache or the store.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Store`] when the store delete fails.
    pub async fn close_page(&self, page: &PageInstanceId) -> RouterResult<bool> {
        let retired = self.sampling.retire_owner(page)?;
        let _mutation = self.mutations.lock().await;
        let stored = match self.store.remove(page).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(page = %page, retired, error = %err, "directory delete failed; page kept");
                return Err(err.into());
            }
        };
        let cached = self.write_cache()?.remove(page).is_some();
        tracing::info!(page = %page, retired, "page instance torn down");
        Ok(cached || stored)
    }

    /// Single entry point: validates an envelope and routes its message.
    ///
    /// `origin` identifies the sending relay's page; the agent UI passes
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Protocol`] for invalid or misdirected
    /// messages, [`RouterError::MissingOrigin`] for page-scoped messages
    /// without an origin, and store or correlation errors.
    pub async fn handle(
        &self,
        envelope: Envelope<BridgeMessage>,
        origin: Option<&PageInstanceId>,
    ) -> RouterResult<Envelope<BridgeMessage>> {
        let message = envelope.open(self.protocol_version)?;
        message.validate()?;
        tracing::debug!(message = message.type_name(), origin = ?origin, "router received message");

        let reply = match message {
            BridgeMessage::NewToolAvailable { tool } => {
                self.announce_from(origin, "NEW_TOOL_AVAILABLE", tool.into())
                    .await?
            }
            BridgeMessage::NewResourceAvailable { resource } => {
                self.announce_from(origin, "NEW_RESOURCE_AVAILABLE", resource.into())
                    .await?
            }
            BridgeMessage::NewPromptAvailable { prompt } => {
                self.announce_from(origin, "NEW_PROMPT_AVAILABLE", prompt.into())
                    .await?
            }
            BridgeMessage::GetToolsForTab { tab_id } => BridgeMessage::ToolsForTab {
                tools: self.tools_for(&tab_id).await?,
            },
            BridgeMessage::GetResourcesForTab { tab_id } => BridgeMessage::ResourcesForTab {
                resources: self.resources_for(&tab_id).await?,
            },
            BridgeMessage::GetPromptsForTab { tab_id } => BridgeMessage::PromptsForTab {
                prompts: self.prompts_for(&tab_id).await?,
            },
            request @ (BridgeMessage::ExecuteToolRequest { .. }
            | BridgeMessage::ReadResourceRequest { .. }
            | BridgeMessage::GetPromptRequest { .. }) => {
                let (page, directive) = PageDirective::from_request(request)?;
                let call_id = directive.call_id().clone();
                let outcome = self.forward(&page, directive).await;
                BridgeMessage::CallResponse { call_id, outcome }
            }
            BridgeMessage::SamplingRequest { request } => {
                let page = origin.ok_or(RouterError::MissingOrigin("SAMPLING_REQUEST"))?;
                let request_id = request.request_id.clone();
                let outcome = self.forward_sampling(page, request).await?;
                BridgeMessage::SamplingResponse {
                    request_id,
                    outcome,
                }
            }
            BridgeMessage::PageClosed { tab_id } => {
                self.close_page(&tab_id).await?;
                BridgeMessage::Ack
            }
            other => {
                return Err(ProtocolError::UnexpectedMessage(other.type_name()).into());
            }
        };
        Ok(Envelope::stamped(reply, &*self.clock))
    }

    async fn announce_from(
        &self,
        origin: Option<&PageInstanceId>,
        message: &'static str,
        descriptor: CapabilityDescriptor,
    ) -> RouterResult<BridgeMessage> {
        let page = origin.ok_or(RouterError::MissingOrigin(message))?;
        self.announce(page, descriptor).await?;
        Ok(BridgeMessage::Ack)
    }
}

#[async_trait]
impl<S, C> RouterLink for Router<S, C>
where
    S: DirectoryStore,
    C: Clock + Send + Sync + 'static,
{
    async fn send(
        &self,
        envelope: Envelope<BridgeMessage>,
        origin: Option<&PageInstanceId>,
    ) -> LinkResult<Envelope<BridgeMessage>> {
        self.handle(envelope, origin).await.map_err(|err| match err {
            RouterError::Protocol(protocol) => LinkError::Protocol(protocol),
            other => LinkError::Rejected(other.to_string()),
        })
    }
}
