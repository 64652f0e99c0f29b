//! The page-side capability registry.

use crate::capability::domain::{
    BridgeFailure, CallId, CallOutcome, CapabilityDirectory, CapabilityKind, DirectoryInsertion,
};
use crate::config::BridgeConfig;
use crate::correlation::{CallKind, PendingCalls};
use crate::protocol::{PageEvent, PageEventBus, SamplingRequest, SamplingResponse};
use crate::registry::{
    domain::{
        Capability, PromptDefinition, RegistryError, RegistryResult, ResourceDefinition,
        ToolDefinition,
    },
    ports::{HandlerResult, ModelContext},
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

#[derive(Default)]
struct RegistryState {
    directory: CapabilityDirectory,
    tools: HashMap<String, ToolDefinition>,
    resources: HashMap<String, ResourceDefinition>,
    prompts: HashMap<String, PromptDefinition>,
    tool_usage: BTreeMap<String, u64>,
}

impl RegistryState {
    fn insert(&mut self, capability: Capability) -> DirectoryInsertion {
        let insertion = self.directory.insert(capability.descriptor());
        if insertion.is_added() {
            match capability {
                Capability::Tool(definition) => {
                    self.tools
                        .insert(definition.descriptor().name().to_owned(), definition);
                }
                Capability::Resource(definition) => {
                    self.resources
                        .insert(definition.descriptor().name().to_owned(), definition);
                }
                Capability::Prompt(definition) => {
                    self.prompts
                        .insert(definition.descriptor().name().to_owned(), definition);
                }
            }
        }
        insertion
    }
}

/// Registry of the capabilities one page instance exposes.
///
/// Registration publishes a discovery event on the page bus. Once attached,
/// the registry answers every execute, read, and get request seen on the
/// bus, running concurrent requests concurrently.
pub struct CapabilityRegistry<C>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<RegistryState>>,
    bus: PageEventBus,
    delegate: Option<Arc<dyn ModelContext>>,
    sampling: PendingCalls<C>,
    sampling_timeout: Duration,
    listeners: Arc<AtomicUsize>,
}

/// Counts one running bus listener of the registry while alive.
struct ListenerSlot(Arc<AtomicUsize>);

impl ListenerSlot {
    fn claim(listeners: &Arc<AtomicUsize>) -> Self {
        listeners.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(listeners))
    }
}

impl Drop for ListenerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<C> Clone for CapabilityRegistry<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            bus: self.bus.clone(),
            delegate: self.delegate.clone(),
            sampling: self.sampling.clone(),
            sampling_timeout: self.sampling_timeout,
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<C> CapabilityRegistry<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty registry publishing on `bus`.
    #[must_use]
    pub fn new(bus: PageEventBus, config: &BridgeConfig, clock: Arc<C>) -> Self {
        Self {
            state: Arc::default(),
            bus,
            delegate: None,
            sampling: PendingCalls::new(clock),
            sampling_timeout: config.sampling_timeout(),
            listeners: Arc::default(),
        }
    }

    /// Wraps a pre-existing registration surface.
    ///
    /// Every registration is forwarded to it after local bookkeeping.
    /// Failures it reports are logged and otherwise ignored.
    #[must_use]
    pub fn with_delegate(mut self, delegate: Arc<dyn ModelContext>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    fn read_state(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))
    }

    fn write_state(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|err| RegistryError::Poisoned(err.to_string()))
    }

    /// Registers a capability.
    ///
    /// The first registration of a `(kind, name)` pair wins; later ones are
    /// ignored locally and publish nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Domain`] when the name is blank, or
    /// [`RegistryError::Poisoned`].
    pub fn register(&self, capability: Capability) -> RegistryResult<DirectoryInsertion> {
        let descriptor = capability.descriptor();
        descriptor.validate()?;

        let insertion = self.write_state()?.insert(capability.clone());
        if insertion.is_added() {
            tracing::info!(kind = %descriptor.kind(), name = descriptor.name(), "capability registered");
            self.bus.publish(PageEvent::discovered(descriptor));
        } else {
            tracing::debug!(
                kind = %descriptor.kind(),
                name = descriptor.name(),
                "duplicate registration ignored"
            );
        }

        self.forward_to_delegate(capability);
        Ok(insertion)
    }

    fn forward_to_delegate(&self, capability: Capability) {
        let Some(delegate) = &self.delegate else {
            return;
        };
        let kind = capability.kind();
        let forwarded = match capability {
            Capability::Tool(definition) => delegate.register_tool(definition),
            Capability::Resource(definition) => delegate.register_resource(definition),
            Capability::Prompt(definition) => delegate.register_prompt(definition),
        };
        if let Err(err) = forwarded {
            tracing::warn!(kind = %kind, error = %err, "delegate registration failed");
        }
    }

    /// Returns the descriptors registered so far, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the state lock is poisoned.
    pub fn directory(&self) -> RegistryResult<CapabilityDirectory> {
        Ok(self.read_state()?.directory.clone())
    }

    /// Returns how many times each tool has been dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the state lock is poisoned.
    pub fn tool_usage(&self) -> RegistryResult<BTreeMap<String, u64>> {
        Ok(self.read_state()?.tool_usage.clone())
    }

    /// Runs a registered tool.
    ///
    /// Unknown names resolve immediately with an error outcome.
    pub async fn execute_tool(&self, tool_name: &str, args: Map<String, Value>) -> CallOutcome {
        let found = match self.write_state() {
            Ok(mut state) => {
                let known = state.tools.get(tool_name).map(ToolDefinition::handler);
                if known.is_some() {
                    *state.tool_usage.entry(tool_name.to_owned()).or_default() += 1;
                }
                known
            }
            Err(err) => return BridgeFailure::HandlerFailure(err.to_string()).into(),
        };
        let Some(handler) = found else {
            return BridgeFailure::unknown(CapabilityKind::Tool, tool_name).into();
        };
        run_handler(async move { handler.execute(args).await }).await
    }

    /// Reads a registered resource.
    ///
    /// Unknown names resolve immediately with an error outcome.
    pub async fn read_resource(&self, resource_name: &str) -> CallOutcome {
        let found = match self.read_state() {
            Ok(state) => state
                .resources
                .get(resource_name)
                .map(ResourceDefinition::handler),
            Err(err) => return BridgeFailure::HandlerFailure(err.to_string()).into(),
        };
        let Some(handler) = found else {
            return BridgeFailure::unknown(CapabilityKind::Resource, resource_name).into();
        };
        run_handler(async move { handler.read().await }).await
    }

    /// Renders a registered prompt.
    ///
    /// Unknown names resolve immediately with an error outcome. Missing
    /// required arguments are left for the handler to default.
    pub async fn get_prompt(&self, prompt_name: &str, args: Map<String, Value>) -> CallOutcome {
        let found = match self.read_state() {
            Ok(state) => state.prompts.get(prompt_name).cloned(),
            Err(err) => return BridgeFailure::HandlerFailure(err.to_string()).into(),
        };
        let Some(definition) = found else {
            return BridgeFailure::unknown(CapabilityKind::Prompt, prompt_name).into();
        };
        let missing = definition.descriptor().missing_required(&args);
        if !missing.is_empty() {
            tracing::debug!(prompt = prompt_name, ?missing, "prompt called without required arguments");
        }
        let handler = definition.handler();
        run_handler(async move { handler.get(args).await }).await
    }

    async fn answer(&self, event: PageEvent) -> Option<PageEvent> {
        match event {
            PageEvent::ExecuteRequested {
                call_id,
                tool_name,
                args,
            } => {
                let outcome = self.execute_tool(&tool_name, args).await;
                Some(PageEvent::ExecutionResult { call_id, outcome })
            }
            PageEvent::ReadResourceRequested {
                call_id,
                resource_name,
            } => {
                let outcome = self.read_resource(&resource_name).await;
                Some(PageEvent::ReadResourceResult { call_id, outcome })
            }
            PageEvent::GetPromptRequested {
                call_id,
                prompt_name,
                args,
            } => {
                let outcome = self.get_prompt(&prompt_name, args).await;
                Some(PageEvent::GetPromptResult { call_id, outcome })
            }
            _ => None,
        }
    }

    fn settle_sampling(&self, request_id: &CallId, outcome: CallOutcome) {
        if let Err(err) = self.sampling.resolve(request_id, outcome) {
            tracing::warn!(request_id = %request_id, error = %err, "failed to settle sampling request");
        }
    }
}

impl<C> CapabilityRegistry<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Starts answering requests from the page bus.
    ///
    /// The subscription is taken before this returns and `MCP_INJECT_READY`
    /// is published, so no request published afterwards is missed. The
    /// listener stops when the bus closes or the handle is aborted.
    #[must_use = "dropping the handle detaches nothing; abort it to stop listening"]
    pub fn attach(&self) -> JoinHandle<()> {
        let receiver = self.bus.subscribe();
        let slot = ListenerSlot::claim(&self.listeners);
        self.bus.publish(PageEvent::InjectReady);
        tokio::spawn(self.clone().listen(receiver, slot))
    }

    async fn listen(self, mut receiver: broadcast::Receiver<PageEvent>, _slot: ListenerSlot) {
        loop {
            match receiver.recv().await {
                Ok(PageEvent::SamplingResult {
                    request_id,
                    outcome,
                }) => self.settle_sampling(&request_id, outcome),
                Ok(
                    event @ (PageEvent::ExecuteRequested { .. }
                    | PageEvent::ReadResourceRequested { .. }
                    | PageEvent::GetPromptRequested { .. }),
                ) => {
                    let registry = self.clone();
                    tokio::spawn(async move {
                        if let Some(result) = registry.answer(event).await {
                            registry.bus.publish(result);
                        }
                    });
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "capability registry lagged behind the page bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

async fn run_handler<F>(call: F) -> CallOutcome
where
    F: Future<Output = HandlerResult> + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(Ok(value)) => CallOutcome::success(value),
        Ok(Err(err)) => BridgeFailure::HandlerFailure(err.message().to_owned()).into(),
        Err(err) => BridgeFailure::HandlerFailure(format!("handler panicked: {err}")).into(),
    }
}

#[async_trait]
impl<C> ModelContext for CapabilityRegistry<C>
where
    C: Clock + Send + Sync,
{
    fn register_tool(&self, definition: ToolDefinition) -> Result<(), RegistryError> {
        self.register(definition.into()).map(|_| ())
    }

    fn register_resource(&self, definition: ResourceDefinition) -> Result<(), RegistryError> {
        self.register(definition.into()).map(|_| ())
    }

    fn register_prompt(&self, definition: PromptDefinition) -> Result<(), RegistryError> {
        self.register(definition.into()).map(|_| ())
    }

    async fn request_sampling(
        &self,
        request: SamplingRequest,
    ) -> Result<SamplingResponse, RegistryError> {
        let handle = self.sampling.register(
            request.request_id.clone(),
            CallKind::Sampling,
            None,
            self.sampling_timeout,
        )?;
        // The registry's own listeners never answer sampling requests.
        if self.bus.subscriber_count() <= self.listeners.load(Ordering::SeqCst) {
            return Err(RegistryError::Sampling(
                "no relay is listening on the page".to_owned(),
            ));
        }
        self.bus.publish(PageEvent::SamplingRequested { request });

        let value = handle.wait().await.into_result().map_err(RegistryError::Sampling)?;
        serde_json::from_value(value).map_err(|err| RegistryError::Sampling(err.to_string()))
    }
}
