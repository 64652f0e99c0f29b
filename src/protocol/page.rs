//! Page-local events and the in-page event bus.
//!
//! The bus models the page's custom-event surface: every subscriber sees
//! every event published after it subscribed, and a publisher never learns
//! who listened.

use super::{PageDirective, SamplingRequest};
use crate::capability::domain::{
    CallId, CallOutcome, CapabilityDescriptor, PromptDescriptor, ResourceDescriptor,
    ToolDescriptor,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Events exchanged between the registry and the relay inside one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum PageEvent {
    /// The registration surface is live.
    #[serde(rename = "MCP_INJECT_READY")]
    InjectReady,
    /// A tool was registered.
    #[serde(rename = "MCP_TOOL_DISCOVERED")]
    ToolDiscovered {
        /// Tool metadata.
        tool: ToolDescriptor,
    },
    /// A resource was registered.
    #[serde(rename = "MCP_RESOURCE_DISCOVERED")]
    ResourceDiscovered {
        /// Resource metadata.
        resource: ResourceDescriptor,
    },
    /// A prompt was registered.
    #[serde(rename = "MCP_PROMPT_DISCOVERED")]
    PromptDiscovered {
        /// Prompt metadata.
        prompt: PromptDescriptor,
    },
    /// The relay asks the page to run a tool.
    #[serde(rename = "EXECUTE_MCP_FROM_EXT")]
    ExecuteRequested {
        /// Correlation token.
        call_id: CallId,
        /// Tool to run.
        tool_name: String,
        /// Tool arguments.
        #[serde(default)]
        args: Map<String, Value>,
    },
    /// The page finished running a tool.
    #[serde(rename = "MCP_EXECUTION_RESULT")]
    ExecutionResult {
        /// Correlation token.
        call_id: CallId,
        /// Outcome of the handler.
        outcome: CallOutcome,
    },
    /// The relay asks the page to read a resource.
    #[serde(rename = "READ_RESOURCE_ON_PAGE")]
    ReadResourceRequested {
        /// Correlation token.
        call_id: CallId,
        /// Resource to read.
        resource_name: String,
    },
    /// The page finished reading a resource.
    #[serde(rename = "READ_RESOURCE_RESULT")]
    ReadResourceResult {
        /// Correlation token.
        call_id: CallId,
        /// Outcome of the read handler.
        outcome: CallOutcome,
    },
    /// The relay asks the page to render a prompt.
    #[serde(rename = "GET_PROMPT_ON_PAGE")]
    GetPromptRequested {
        /// Correlation token.
        call_id: CallId,
        /// Prompt to render.
        prompt_name: String,
        /// Prompt arguments.
        #[serde(default)]
        args: Map<String, Value>,
    },
    /// The page finished rendering a prompt.
    #[serde(rename = "GET_PROMPT_RESULT")]
    GetPromptResult {
        /// Correlation token.
        call_id: CallId,
        /// Outcome of the get handler.
        outcome: CallOutcome,
    },
    /// The page asks the agent's model something.
    #[serde(rename = "MCP_SAMPLING_REQUEST")]
    SamplingRequested {
        /// Sampling payload.
        request: SamplingRequest,
    },
    /// Answer to a page-raised sampling request.
    #[serde(rename = "MCP_SAMPLING_RESULT")]
    SamplingResult {
        /// Correlation token of the request.
        request_id: CallId,
        /// Outcome of the model call.
        outcome: CallOutcome,
    },
}

impl PageEvent {
    /// Builds the discovery event for a descriptor.
    #[must_use]
    pub fn discovered(descriptor: CapabilityDescriptor) -> Self {
        match descriptor {
            CapabilityDescriptor::Tool(tool) => Self::ToolDiscovered { tool },
            CapabilityDescriptor::Resource(resource) => Self::ResourceDiscovered { resource },
            CapabilityDescriptor::Prompt(prompt) => Self::PromptDiscovered { prompt },
        }
    }

    /// Returns the call outcome if this is a result event.
    #[must_use]
    pub fn into_result(self) -> Option<(CallId, CallOutcome)> {
        match self {
            Self::ExecutionResult { call_id, outcome }
            | Self::ReadResourceResult { call_id, outcome }
            | Self::GetPromptResult { call_id, outcome } => Some((call_id, outcome)),
            _ => None,
        }
    }
}

impl From<PageDirective> for PageEvent {
    fn from(directive: PageDirective) -> Self {
        match directive {
            PageDirective::ExecuteOnPage {
                tool_name,
                args,
                call_id,
            } => Self::ExecuteRequested {
                call_id,
                tool_name,
                args,
            },
            PageDirective::ReadResourceOnPage {
                resource_name,
                call_id,
            } => Self::ReadResourceRequested {
                call_id,
                resource_name,
            },
            PageDirective::GetPromptOnPage {
                prompt_name,
                args,
                call_id,
            } => Self::GetPromptRequested {
                call_id,
                prompt_name,
                args,
            },
        }
    }
}

/// Broadcast surface standing in for the page's custom events.
#[derive(Debug, Clone)]
pub struct PageEventBus {
    sender: broadcast::Sender<PageEvent>,
}

impl PageEventBus {
    /// Creates a bus buffering up to `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to every current subscriber.
    ///
    /// An event published while nobody listens is discarded.
    pub fn publish(&self, event: PageEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("page event published without subscribers");
        }
    }

    /// Returns how many subscribers are currently listening.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }
}
