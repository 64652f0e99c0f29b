//! Agent UI controller service.

use crate::capability::domain::{BridgeFailure, CallId, CallOutcome, PageInstanceId};
use crate::config::BridgeConfig;
use crate::controller::{
    domain::{
        AgentSettings, ChatSession, ControllerStatus, FunctionCall, ModelInput, ModelRequest,
        ModelTurn, PageSnapshot, Transcript, TranscriptRole,
    },
    ports::{ModelClient, ModelClientError},
};
use crate::protocol::{BridgeMessage, Envelope, ProtocolError, SamplingRequest, SamplingResponse};
use crate::router::ports::{ControllerLink, LinkError, LinkResult, RouterLink};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

/// Service-level errors for controller operations.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// No page instance has been activated.
    #[error("no page instance is active")]
    NoActivePage,

    /// The active page's directory has not arrived yet.
    #[error("the capabilities of page instance {0} have not arrived yet")]
    AwaitingDirectory(PageInstanceId),

    /// The router could not be reached or refused the message.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// A reply failed boundary validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The router answered with a reply of the wrong type.
    #[error("router answered {0} where another reply was expected")]
    UnexpectedReply(&'static str),

    /// Chat was attempted without an API key.
    #[error("the model API key is not configured; set it in the agent settings")]
    MissingApiKey,

    /// The model call failed.
    #[error(transparent)]
    Model(#[from] ModelClientError),

    /// The model kept requesting functions without answering.
    #[error("the model requested functions for {0} rounds without answering")]
    TooManyFunctionRounds(u32),

    /// The controller state lock was poisoned.
    #[error("controller state is unavailable: {0}")]
    Poisoned(String),
}

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug, Default)]
struct ControllerState {
    settings: AgentSettings,
    active_page: Option<PageInstanceId>,
    directory_ready: bool,
    snapshot: PageSnapshot,
    status: ControllerStatus,
    transcript: Transcript,
    session: Option<ChatSession>,
    session_generation: u64,
}

impl ControllerState {
    fn reset_session(&mut self) {
        self.session = None;
        self.session_generation = self.session_generation.wrapping_add(1);
    }

    fn ready_status(&self) -> ControllerStatus {
        ControllerStatus::Ready {
            tool_count: self.snapshot.tools.len(),
        }
    }
}

/// The agent-facing side of the bridge.
///
/// Holds the active page, its last known capabilities, the chat transcript,
/// and the current model session. All traffic to pages goes through the
/// router link.
pub struct AgentController<M, C>
where
    M: ModelClient,
    C: Clock + Send + Sync,
{
    router: Arc<dyn RouterLink>,
    model: Arc<M>,
    clock: Arc<C>,
    state: Arc<Mutex<ControllerState>>,
    sampling_timeout: Duration,
    protocol_version: u32,
}

impl<M, C> Clone for AgentController<M, C>
where
    M: ModelClient,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            model: Arc::clone(&self.model),
            clock: Arc::clone(&self.clock),
            state: Arc::clone(&self.state),
            sampling_timeout: self.sampling_timeout,
            protocol_version: self.protocol_version,
        }
    }
}

impl<M, C> AgentController<M, C>
where
    M: ModelClient,
    C: Clock + Send + Sync,
{
    /// Creates an idle controller.
    #[must_use]
    pub fn new(
        router: Arc<dyn RouterLink>,
        model: Arc<M>,
        settings: AgentSettings,
        config: &BridgeConfig,
        clock: Arc<C>,
    ) -> Self {
        let state = ControllerState {
            settings,
            ..ControllerState::default()
        };
        Self {
            router,
            model,
            clock,
            state: Arc::new(Mutex::new(state)),
            sampling_timeout: config.sampling_timeout(),
            protocol_version: config.protocol_version,
        }
    }

    fn lock(&self) -> ControllerResult<MutexGuard<'_, ControllerState>> {
        self.state
            .lock()
            .map_err(|err| ControllerError::Poisoned(err.to_string()))
    }

    /// Returns the status line.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn status(&self) -> ControllerResult<ControllerStatus> {
        Ok(self.lock()?.status.clone())
    }

    /// Returns the active page instance.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn active_page(&self) -> ControllerResult<Option<PageInstanceId>> {
        Ok(self.lock()?.active_page.clone())
    }

    /// Returns the capabilities last reported for the active page.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn snapshot(&self) -> ControllerResult<PageSnapshot> {
        Ok(self.lock()?.snapshot.clone())
    }

    /// Returns the chat transcript.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn transcript(&self) -> ControllerResult<Transcript> {
        Ok(self.lock()?.transcript.clone())
    }

    /// Returns `true` while a chat session is open.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn has_session(&self) -> ControllerResult<bool> {
        Ok(self.lock()?.session.is_some())
    }

    /// Returns the current agent settings.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn settings(&self) -> ControllerResult<AgentSettings> {
        Ok(self.lock()?.settings.clone())
    }

    /// Replaces the agent settings and discards the chat session.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Poisoned`] when the state lock is poisoned.
    pub fn update_settings(&self, settings: AgentSettings) -> ControllerResult<()> {
        let mut state = self.lock()?;
        tracing::info!(model = %settings.model, "agent settings changed, session reset");
        state.settings = settings;
        state.reset_session();
        Ok(())
    }

    async fn request(&self, message: BridgeMessage) -> ControllerResult<BridgeMessage> {
        let reply = self
            .router
            .send(Envelope::stamped(message, &*self.clock), None)
            .await?;
        Ok(reply.open(self.protocol_version)?)
    }

    /// Makes `page` the active page and fetches its capabilities.
    ///
    /// Tool calls are refused until the snapshot has arrived.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Link`] or [`ControllerError::Protocol`]
    /// when the router cannot answer, and
    /// [`ControllerError::UnexpectedReply`] for a mistyped reply.
    pub async fn activate(&self, page: PageInstanceId) -> ControllerResult<PageSnapshot> {
        {
            let mut state = self.lock()?;
            state.active_page = Some(page.clone());
            state.directory_ready = false;
            state.snapshot = PageSnapshot::default();
            state.status = ControllerStatus::AwaitingDirectory;
            state.reset_session();
        }
        tracing::info!(page = %page, "page activated");

        let fetched = self.fetch_snapshot(&page).await;
        let mut state = self.lock()?;
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                state.status = ControllerStatus::Failed {
                    reason: err.to_string(),
                };
                return Err(err);
            }
        };
        if state.active_page.as_ref() == Some(&page) {
            state.snapshot = snapshot.clone();
            state.directory_ready = true;
            state.status = state.ready_status();
        }
        Ok(snapshot)
    }

    async fn fetch_snapshot(&self, page: &PageInstanceId) -> ControllerResult<PageSnapshot> {
        let tools = match self
            .request(BridgeMessage::GetToolsForTab {
                tab_id: page.clone(),
            })
            .await?
        {
            BridgeMessage::ToolsForTab { tools } => tools,
            other => return Err(ControllerError::UnexpectedReply(other.type_name())),
        };
        let resources = match self
            .request(BridgeMessage::GetResourcesForTab {
                tab_id: page.clone(),
            })
            .await?
        {
            BridgeMessage::ResourcesForTab { resources } => resources,
            other => return Err(ControllerError::UnexpectedReply(other.type_name())),
        };
        let prompts = match self
            .request(BridgeMessage::GetPromptsForTab {
                tab_id: page.clone(),
            })
            .await?
        {
            BridgeMessage::PromptsForTab { prompts } => prompts,
            other => return Err(ControllerError::UnexpectedReply(other.type_name())),
        };
        Ok(PageSnapshot {
            tools,
            resources,
            prompts,
        })
    }

    /// Applies a directory update pushed by the router.
    ///
    /// Updates for the active page replace the matching list and discard
    /// the chat session. Returns `false` when the update concerns another
    /// page.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Protocol`] for messages that are not
    /// directory updates.
    pub fn apply_update(&self, update: BridgeMessage) -> ControllerResult<bool> {
        let mut state = self.lock()?;
        let active = state.active_page.clone();
        let applies = |page: &PageInstanceId| active.as_ref() == Some(page);
        match update {
            BridgeMessage::ContextUpdated { tab_id, tools } if applies(&tab_id) => {
                state.snapshot.tools = tools;
                state.directory_ready = true;
                state.status = state.ready_status();
            }
            BridgeMessage::ResourceContextUpdated { tab_id, resources } if applies(&tab_id) => {
                state.snapshot.resources = resources;
            }
            BridgeMessage::PromptContextUpdated { tab_id, prompts } if applies(&tab_id) => {
                state.snapshot.prompts = prompts;
            }
            BridgeMessage::ContextUpdated { tab_id, .. }
            | BridgeMessage::ResourceContextUpdated { tab_id, .. }
            | BridgeMessage::PromptContextUpdated { tab_id, .. } => {
                tracing::debug!(page = %tab_id, "update for inactive page ignored");
                return Ok(false);
            }
            other => return Err(ProtocolError::UnexpectedMessage(other.type_name()).into()),
        }
        state.reset_session();
        tracing::debug!(status = %state.status, "directory update applied, session reset");
        Ok(true)
    }

    fn ready_page(&self) -> ControllerResult<PageInstanceId> {
        let state = self.lock()?;
        let page = state
            .active_page
            .clone()
            .ok_or(ControllerError::NoActivePage)?;
        if !state.directory_ready {
            return Err(ControllerError::AwaitingDirectory(page));
        }
        Ok(page)
    }

    async fn call(&self, request: BridgeMessage) -> ControllerResult<CallOutcome> {
        match self.request(request).await? {
            BridgeMessage::CallResponse { outcome, .. } => Ok(outcome),
            other => Err(ControllerError::UnexpectedReply(other.type_name())),
        }
    }

    /// Records an error outcome of a direct call in the chat and discards
    /// the session.
    fn render_failure(&self, capability: &str, outcome: &CallOutcome) {
        if outcome.is_success() {
            return;
        }
        let message = outcome
            .error_message()
            .map_or_else(|| outcome.result().to_string(), ToOwned::to_owned);
        if let Ok(mut state) = self.lock() {
            state.transcript.push(
                TranscriptRole::Error,
                format!("{capability}: {message}"),
                self.clock.utc(),
            );
            state.reset_session();
        }
        tracing::debug!(capability, error = %message, "call failed, session reset");
    }

    /// Executes a tool on the active page with a fresh call id.
    ///
    /// An error outcome is also appended to the transcript and discards the
    /// chat session.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NoActivePage`] or
    /// [`ControllerError::AwaitingDirectory`] when no call can be made yet,
    /// and link or protocol errors when the router cannot answer. Failures
    /// on the page come back as an error [`CallOutcome`].
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        args: Map<String, Value>,
    ) -> ControllerResult<CallOutcome> {
        let outcome = self.run_tool(tool_name, args).await?;
        self.render_failure(tool_name, &outcome);
        Ok(outcome)
    }

    async fn run_tool(
        &self,
        tool_name: &str,
        args: Map<String, Value>,
    ) -> ControllerResult<CallOutcome> {
        let page = self.ready_page()?;
        let call_id = CallId::generate();
        tracing::debug!(page = %page, call_id = %call_id, capability = tool_name, "executing tool");
        self.call(BridgeMessage::ExecuteToolRequest {
            tab_id: page,
            tool_name: tool_name.to_owned(),
            args,
            call_id,
        })
        .await
    }

    /// Reads a resource from the active page.
    ///
    /// # Errors
    ///
    /// See [`AgentController::execute_tool`].
    pub async fn read_resource(&self, resource_name: &str) -> ControllerResult<CallOutcome> {
        let page = self.ready_page()?;
        let outcome = self
            .call(BridgeMessage::ReadResourceRequest {
                tab_id: page,
                resource_name: resource_name.to_owned(),
                call_id: CallId::generate(),
            })
            .await?;
        self.render_failure(resource_name, &outcome);
        Ok(outcome)
    }

    /// Renders a prompt from the active page.
    ///
    /// # Errors
    ///
    /// See [`AgentController::execute_tool`].
    pub async fn get_prompt(
        &self,
        prompt_name: &str,
        args: Map<String, Value>,
    ) -> ControllerResult<CallOutcome> {
        let page = self.ready_page()?;
        let outcome = self
            .call(BridgeMessage::GetPromptRequest {
                tab_id: page,
                prompt_name: prompt_name.to_owned(),
                args,
                call_id: CallId::generate(),
            })
            .await?;
        self.render_failure(prompt_name, &outcome);
        Ok(outcome)
    }

    /// Sends a user message through the function-calling loop and returns
    /// the model's final answer.
    ///
    /// The user text, each tool call, and the answer or the failure are
    /// appended to the transcript. A failure discards the session.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::MissingApiKey`] without calling the model
    /// when no key is configured, [`ControllerError::Model`] when the model
    /// fails, and [`ControllerError::TooManyFunctionRounds`] when the model
    /// never answers.
    pub async fn send_user_message(&self, text: &str) -> ControllerResult<String> {
        let (api_key, mut session, generation, max_rounds) = {
            let mut state = self.lock()?;
            state.transcript.push(TranscriptRole::User, text, self.clock.utc());
            let Some(key) = state.settings.usable_api_key().map(str::to_owned) else {
                let err = ControllerError::MissingApiKey;
                state
                    .transcript
                    .push(TranscriptRole::Error, err.to_string(), self.clock.utc());
                return Err(err);
            };
            let session = state
                .session
                .clone()
                .unwrap_or_else(|| ChatSession::start(&state.settings, &state.snapshot.tools));
            (
                key,
                session,
                state.session_generation,
                state.settings.max_function_rounds,
            )
        };

        let outcome = self
            .converse(&api_key, &mut session, text, max_rounds)
            .await;

        let mut state = self.lock()?;
        match outcome {
            Ok(answer) => {
                state
                    .transcript
                    .push(TranscriptRole::Assistant, answer.as_str(), self.clock.utc());
                state.status = state.ready_status();
                if state.session_generation == generation {
                    state.session = Some(session);
                }
                Ok(answer)
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat turn failed, session reset");
                state
                    .transcript
                    .push(TranscriptRole::Error, err.to_string(), self.clock.utc());
                state.status = ControllerStatus::Failed {
                    reason: err.to_string(),
                };
                state.reset_session();
                Err(err)
            }
        }
    }

    async fn converse(
        &self,
        api_key: &str,
        session: &mut ChatSession,
        text: &str,
        max_rounds: u32,
    ) -> ControllerResult<String> {
        session.push(ModelInput::UserText {
            text: text.to_owned(),
        });
        let mut rounds = 0_u32;
        loop {
            let calls = match self.model.generate(api_key, session.request()).await? {
                ModelTurn::FunctionCalls(calls) if !calls.is_empty() => calls,
                ModelTurn::FunctionCalls(_) => return Ok(Self::finish(session, String::new())),
                ModelTurn::Text(answer) => return Ok(Self::finish(session, answer)),
            };
            if rounds >= max_rounds {
                return Err(ControllerError::TooManyFunctionRounds(max_rounds));
            }
            rounds = rounds.saturating_add(1);
            for call in calls {
                session.push(ModelInput::FunctionCall(call.clone()));
                let response = self.run_function(&call).await;
                session.push(ModelInput::FunctionResponse {
                    name: call.name,
                    response,
                });
            }
        }
    }

    fn finish(session: &mut ChatSession, answer: String) -> String {
        session.push(ModelInput::ModelText {
            text: answer.clone(),
        });
        answer
    }

    /// Executes one model-requested function. Failures become an
    /// `{ "error": ... }` payload for the model.
    async fn run_function(&self, call: &FunctionCall) -> Value {
        if let Ok(mut state) = self.lock() {
            state.status = ControllerStatus::Working {
                tool: call.name.clone(),
            };
            let rendered = format!("{}({})", call.name, Value::Object(call.args.clone()));
            state
                .transcript
                .push(TranscriptRole::Tool, rendered, self.clock.utc());
        }
        match self.run_tool(&call.name, call.args.clone()).await {
            Ok(outcome) => outcome.result().clone(),
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    /// Answers a page's sampling request with the configured model.
    ///
    /// The model call runs under the sampling deadline. Every failure is
    /// reported as an error outcome for the same request.
    pub async fn handle_sampling_request(&self, request: SamplingRequest) -> CallOutcome {
        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(err) => return CallOutcome::error(err.to_string()),
        };
        let Some(api_key) = settings.usable_api_key() else {
            return CallOutcome::error(ControllerError::MissingApiKey.to_string());
        };
        let model_request = ModelRequest::for_sampling(settings.model.as_str(), &request);
        tracing::debug!(request_id = %request.request_id, model = %settings.model, "answering sampling request");

        let generated =
            tokio::time::timeout(self.sampling_timeout, self.model.generate(api_key, model_request))
                .await;
        match generated {
            Err(_elapsed) => {
                tracing::warn!(request_id = %request.request_id, "sampling timed out");
                BridgeFailure::Timeout {
                    call_id: request.request_id,
                    waited: self.sampling_timeout,
                }
                .into()
            }
            Ok(Err(err)) => CallOutcome::error(err.to_string()),
            Ok(Ok(ModelTurn::FunctionCalls(_))) => {
                CallOutcome::error("the model requested functions while answering a page")
            }
            Ok(Ok(ModelTurn::Text(text))) => {
                let response = SamplingResponse::text(text, Some(settings.model.clone()));
                serde_json::to_value(response).map_or_else(
                    |err| CallOutcome::error(err.to_string()),
                    CallOutcome::success,
                )
            }
        }
    }
}

#[async_trait]
impl<M, C> ControllerLink for AgentController<M, C>
where
    M: ModelClient + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn notify(&self, update: Envelope<BridgeMessage>) -> LinkResult<()> {
        let message = update.open(self.protocol_version)?;
        self.apply_update(message).map_err(|err| match err {
            ControllerError::Protocol(protocol) => LinkError::Protocol(protocol),
            other => LinkError::Rejected(other.to_string()),
        })?;
        Ok(())
    }

    async fn sample(&self, request: Envelope<SamplingRequest>) -> LinkResult<CallOutcome> {
        let opened = request.open(self.protocol_version)?;
        Ok(self.handle_sampling_request(opened).await)
    }
}
