//! Per-page relay between the page event bus and the router.

use crate::capability::domain::{
    BridgeFailure, CallId, CallOutcome, CapabilityDescriptor, PageInstanceId,
};
use crate::config::BridgeConfig;
use crate::correlation::{CallKind, CorrelationError, PendingCalls, PendingHandle};
use crate::protocol::{
    BridgeMessage, Envelope, PageDirective, PageEvent, PageEventBus, SamplingRequest,
};
use crate::router::ports::{LinkError, LinkResult, RelayLink, RouterLink};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Relay of one page instance.
///
/// Discovery events travel outward as `NEW_*_AVAILABLE` messages; router
/// directives travel inward as page events and resolve with the first of the
/// matching result event or the execution deadline.
pub struct Relay<C>
where
    C: Clock + Send + Sync,
{
    page: PageInstanceId,
    bus: PageEventBus,
    router: Arc<dyn RouterLink>,
    pending: PendingCalls<C>,
    clock: Arc<C>,
    execution_timeout: Duration,
    protocol_version: u32,
    closed: Arc<AtomicBool>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<C> Clone for Relay<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            bus: self.bus.clone(),
            router: Arc::clone(&self.router),
            pending: self.pending.clone(),
            clock: Arc::clone(&self.clock),
            execution_timeout: self.execution_timeout,
            protocol_version: self.protocol_version,
            closed: Arc::clone(&self.closed),
            listener: Arc::clone(&self.listener),
        }
    }
}

impl<C> Relay<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a relay for `page`.
    #[must_use]
    pub fn new(
        page: PageInstanceId,
        bus: PageEventBus,
        router: Arc<dyn RouterLink>,
        config: &BridgeConfig,
        clock: Arc<C>,
    ) -> Self {
        Self {
            page,
            bus,
            router,
            pending: PendingCalls::new(Arc::clone(&clock)),
            clock,
            execution_timeout: config.execution_timeout(),
            protocol_version: config.protocol_version,
            closed: Arc::new(AtomicBool::new(false)),
            listener: Arc::default(),
        }
    }

    /// Returns the page instance this relay serves.
    #[must_use]
    pub const fn page(&self) -> &PageInstanceId {
        &self.page
    }

    /// Returns whether the relay has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the number of directives awaiting a page result.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Runs a directive against the page.
    ///
    /// The supplied call id is reused unless it is already outstanding, in
    /// which case a fresh one is generated. The outcome is the page result,
    /// a timeout error, or a channel error once the relay is shut down.
    pub async fn run_directive(&self, directive: PageDirective) -> CallOutcome {
        if self.is_closed() {
            return BridgeFailure::page_unreachable(&self.page).into();
        }

        let kind = CallKind::Capability(directive.kind());
        let registered = match self.register(directive.call_id().clone(), kind) {
            Err(CorrelationError::DuplicateCallId(taken)) => {
                let fresh = CallId::generate();
                tracing::debug!(page = %self.page, taken = %taken, call_id = %fresh, "call id already pending; regenerated");
                self.register(fresh, kind)
            }
            other => other,
        };
        let handle = match registered {
            Ok(handle) => handle,
            Err(err) => return BridgeFailure::ChannelUnavailable(err.to_string()).into(),
        };

        let call_id = handle.call_id().clone();
        tracing::debug!(
            page = %self.page,
            call_id = %call_id,
            kind = %kind,
            capability = directive.name(),
            "dispatching directive to page"
        );
        self.bus
            .publish(PageEvent::from(directive.with_call_id(call_id)));
        handle.wait().await
    }

    fn register(
        &self,
        call_id: CallId,
        kind: CallKind,
    ) -> Result<PendingHandle, CorrelationError> {
        self.pending
            .register(call_id, kind, Some(self.page.clone()), self.execution_timeout)
    }

    async fn send(&self, message: BridgeMessage) -> LinkResult<BridgeMessage> {
        let envelope = Envelope::stamped(message, &*self.clock);
        let reply = self.router.send(envelope, Some(&self.page)).await?;
        Ok(reply.open(self.protocol_version)?)
    }

    async fn announce(&self, descriptor: CapabilityDescriptor) {
        let name = descriptor.name().to_owned();
        let kind = descriptor.kind();
        if let Err(err) = self.send(BridgeMessage::announce(descriptor)).await {
            tracing::warn!(page = %self.page, kind = %kind, capability = %name, error = %err, "failed to announce capability");
        }
    }

    async fn forward_sampling(&self, request: SamplingRequest) {
        let request_id = request.request_id.clone();
        let outcome = match self.send(BridgeMessage::SamplingRequest { request }).await {
            Ok(BridgeMessage::SamplingResponse { outcome, .. }) => outcome,
            Ok(other) => BridgeFailure::ChannelUnavailable(format!(
                "router answered sampling with {}",
                other.type_name()
            ))
            .into(),
            Err(err) => BridgeFailure::ChannelUnavailable(err.to_string()).into(),
        };
        self.bus.publish(PageEvent::SamplingResult {
            request_id,
            outcome,
        });
    }

    fn settle(&self, call_id: &CallId, outcome: CallOutcome) {
        if let Err(err) = self.pending.resolve(call_id, outcome) {
            tracing::warn!(page = %self.page, call_id = %call_id, error = %err, "failed to settle page result");
        }
    }

    /// Shuts the relay down.
    ///
    /// Stops listening to the page, fails every outstanding directive with
    /// a channel error, and tells the router the page is gone.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Ok(mut listener) = self.listener.lock()
            && let Some(handle) = listener.take()
        {
            handle.abort();
        }
        match self.pending.retire_owner(&self.page) {
            Ok(retired) if retired > 0 => {
                tracing::debug!(page = %self.page, retired, "retired pending directives");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(page = %self.page, error = %err, "failed to retire pending directives"),
        }
        let closed = BridgeMessage::PageClosed {
            tab_id: self.page.clone(),
        };
        if let Err(err) = self.send(closed).await {
            tracing::warn!(page = %self.page, error = %err, "failed to report page teardown");
        }
        tracing::info!(page = %self.page, "relay shut down");
    }
}

impl<C> Relay<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Starts listening to the page bus.
    ///
    /// The subscription is taken before this returns. Calling it again
    /// replaces the previous listener.
    pub fn start(&self) {
        let receiver = self.bus.subscribe();
        let handle = tokio::spawn(self.clone().listen(receiver));
        match self.listener.lock() {
            Ok(mut listener) => {
                if let Some(previous) = listener.replace(handle) {
                    previous.abort();
                }
            }
            Err(err) => {
                tracing::warn!(page = %self.page, error = %err, "relay listener slot poisoned");
                handle.abort();
            }
        }
    }

    async fn listen(self, mut receiver: broadcast::Receiver<PageEvent>) {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(page = %self.page, skipped, "relay lagged behind the page bus");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match event {
                PageEvent::ToolDiscovered { tool } => self.announce(tool.into()).await,
                PageEvent::ResourceDiscovered { resource } => self.announce(resource.into()).await,
                PageEvent::PromptDiscovered { prompt } => self.announce(prompt.into()).await,
                PageEvent::SamplingRequested { request } => {
                    let relay = self.clone();
                    tokio::spawn(async move { relay.forward_sampling(request).await });
                }
                other => {
                    if let Some((call_id, outcome)) = other.into_result() {
                        self.settle(&call_id, outcome);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<C> RelayLink for Relay<C>
where
    C: Clock + Send + Sync,
{
    async fn dispatch(
        &self,
        page: &PageInstanceId,
        directive: Envelope<PageDirective>,
    ) -> LinkResult<CallOutcome> {
        if page != &self.page {
            return Err(LinkError::Unreachable(format!("page instance {page}")));
        }
        let opened = directive.open(self.protocol_version)?;
        Ok(self.run_directive(opened).await)
    }
}
