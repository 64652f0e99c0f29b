//! Router double and fixtures shared by controller tests.

use crate::capability::domain::{BridgeFailure, CallOutcome, CapabilityKind, PageInstanceId, ToolDescriptor};
use crate::config::BridgeConfig;
use crate::controller::{
    domain::AgentSettings,
    ports::ModelClient,
    services::AgentController,
};
use crate::protocol::{BridgeMessage, Envelope};
use crate::router::ports::{LinkError, LinkResult, RouterLink};
use async_trait::async_trait;
use mockable::DefaultClock;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Router stand-in serving one page with a `count_widgets` tool.
#[derive(Default)]
pub(super) struct FakeRouter {
    pub(super) offline: bool,
    pub(super) sent: Mutex<Vec<BridgeMessage>>,
}

impl FakeRouter {
    pub(super) fn offline() -> Self {
        Self {
            offline: true,
            sent: Mutex::default(),
        }
    }

    pub(super) fn sent(&self) -> Vec<BridgeMessage> {
        self.sent.lock().expect("lock").clone()
    }
}

pub(super) fn widget_tool() -> ToolDescriptor {
    ToolDescriptor::new("count_widgets", "Counts widgets on the page")
        .expect("valid tool")
        .with_input_schema(json!({ "type": "object" }))
}

#[async_trait]
impl RouterLink for FakeRouter {
    async fn send(
        &self,
        envelope: Envelope<BridgeMessage>,
        _origin: Option<&PageInstanceId>,
    ) -> LinkResult<Envelope<BridgeMessage>> {
        if self.offline {
            return Err(LinkError::Unreachable("router".to_owned()));
        }
        let message = envelope.open(1)?;
        self.sent.lock().expect("lock").push(message.clone());
        let reply = match message {
            BridgeMessage::GetToolsForTab { .. } => BridgeMessage::ToolsForTab {
                tools: vec![widget_tool()],
            },
            BridgeMessage::GetResourcesForTab { .. } => BridgeMessage::ResourcesForTab {
                resources: Vec::new(),
            },
            BridgeMessage::GetPromptsForTab { .. } => BridgeMessage::PromptsForTab {
                prompts: Vec::new(),
            },
            BridgeMessage::ExecuteToolRequest {
                tool_name, call_id, ..
            } => {
                let outcome = if tool_name == "count_widgets" {
                    CallOutcome::success(json!({ "widgets": 3 }))
                } else {
                    BridgeFailure::unknown(CapabilityKind::Tool, tool_name).into()
                };
                BridgeMessage::CallResponse { call_id, outcome }
            }
            _ => BridgeMessage::Ack,
        };
        Ok(Envelope::new(reply))
    }
}

pub(super) fn page() -> PageInstanceId {
    PageInstanceId::from(42)
}

pub(super) fn keyed_settings() -> AgentSettings {
    AgentSettings::default().with_api_key("test-key")
}

pub(super) fn controller<M: ModelClient>(
    router: &Arc<FakeRouter>,
    model: M,
    settings: AgentSettings,
) -> AgentController<M, DefaultClock> {
    AgentController::new(
        Arc::clone(router) as Arc<dyn RouterLink>,
        Arc::new(model),
        settings,
        &BridgeConfig::default(),
        Arc::new(DefaultClock),
    )
}
