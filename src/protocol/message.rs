//! Tagged-union messages exchanged with the router.

use super::{ProtocolError, SamplingRequest};
use crate::capability::domain::{
    CallId, CallOutcome, CapabilityDescriptor, CapabilityKind, PageInstanceId, PromptDescriptor,
    ResourceDescriptor, ToolDescriptor,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Messages handled by or emitted from the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BridgeMessage {
    /// A page advertised a tool.
    NewToolAvailable {
        /// Tool metadata.
        tool: ToolDescriptor,
    },
    /// A page advertised a resource.
    NewResourceAvailable {
        /// Resource metadata.
        resource: ResourceDescriptor,
    },
    /// A page advertised a prompt.
    NewPromptAvailable {
        /// Prompt metadata.
        prompt: PromptDescriptor,
    },
    /// Request for the tools of a page instance.
    GetToolsForTab {
        /// Page instance queried.
        tab_id: PageInstanceId,
    },
    /// Request for the resources of a page instance.
    GetResourcesForTab {
        /// Page instance queried.
        tab_id: PageInstanceId,
    },
    /// Request for the prompts of a page instance.
    GetPromptsForTab {
        /// Page instance queried.
        tab_id: PageInstanceId,
    },
    /// Reply carrying tools.
    ToolsForTab {
        /// Current tool list.
        tools: Vec<ToolDescriptor>,
    },
    /// Reply carrying resources.
    ResourcesForTab {
        /// Current resource list.
        resources: Vec<ResourceDescriptor>,
    },
    /// Reply carrying prompts.
    PromptsForTab {
        /// Current prompt list.
        prompts: Vec<PromptDescriptor>,
    },
    /// Notification that the tool list of a page changed.
    ContextUpdated {
        /// Page instance that changed.
        tab_id: PageInstanceId,
        /// Refreshed tool list.
        tools: Vec<ToolDescriptor>,
    },
    /// Notification that the resource list of a page changed.
    ResourceContextUpdated {
        /// Page instance that changed.
        tab_id: PageInstanceId,
        /// Refreshed resource list.
        resources: Vec<ResourceDescriptor>,
    },
    /// Notification that the prompt list of a page changed.
    PromptContextUpdated {
        /// Page instance that changed.
        tab_id: PageInstanceId,
        /// Refreshed prompt list.
        prompts: Vec<PromptDescriptor>,
    },
    /// Agent asks a page to run a tool.
    ExecuteToolRequest {
        /// Target page instance.
        tab_id: PageInstanceId,
        /// Tool to run.
        tool_name: String,
        /// Tool arguments.
        #[serde(default)]
        args: Map<String, Value>,
        /// Correlation token.
        call_id: CallId,
    },
    /// Agent asks a page to read a resource.
    ReadResourceRequest {
        /// Target page instance.
        tab_id: PageInstanceId,
        /// Resource to read.
        resource_name: String,
        /// Correlation token.
        call_id: CallId,
    },
    /// Agent asks a page to render a prompt.
    GetPromptRequest {
        /// Target page instance.
        tab_id: PageInstanceId,
        /// Prompt to render.
        prompt_name: String,
        /// Prompt arguments.
        #[serde(default)]
        args: Map<String, Value>,
        /// Correlation token.
        call_id: CallId,
    },
    /// Reply to a correlated execute, read, or get request.
    CallResponse {
        /// Correlation token of the request.
        call_id: CallId,
        /// Outcome of the call.
        outcome: CallOutcome,
    },
    /// A page asks the agent's model something.
    SamplingRequest {
        /// Sampling payload, including its request id.
        request: SamplingRequest,
    },
    /// Reply to a sampling request.
    SamplingResponse {
        /// Correlation token of the request.
        request_id: CallId,
        /// Outcome of the model call.
        outcome: CallOutcome,
    },
    /// A page instance was torn down.
    PageClosed {
        /// Page instance that went away.
        tab_id: PageInstanceId,
    },
    /// Acknowledgement without payload.
    Ack,
}

impl BridgeMessage {
    /// Wraps a descriptor into the matching `NEW_<KIND>_AVAILABLE` message.
    #[must_use]
    pub fn announce(descriptor: CapabilityDescriptor) -> Self {
        match descriptor {
            CapabilityDescriptor::Tool(tool) => Self::NewToolAvailable { tool },
            CapabilityDescriptor::Resource(resource) => Self::NewResourceAvailable { resource },
            CapabilityDescriptor::Prompt(prompt) => Self::NewPromptAvailable { prompt },
        }
    }

    /// Returns the wire discriminator of the message.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::NewToolAvailable { .. } => "NEW_TOOL_AVAILABLE",
            Self::NewResourceAvailable { .. } => "NEW_RESOURCE_AVAILABLE",
            Self::NewPromptAvailable { .. } => "NEW_PROMPT_AVAILABLE",
            Self::GetToolsForTab { .. } => "GET_TOOLS_FOR_TAB",
            Self::GetResourcesForTab { .. } => "GET_RESOURCES_FOR_TAB",
            Self::GetPromptsForTab { .. } => "GET_PROMPTS_FOR_TAB",
            Self::ToolsForTab { .. } => "TOOLS_FOR_TAB",
            Self::ResourcesForTab { .. } => "RESOURCES_FOR_TAB",
            Self::PromptsForTab { .. } => "PROMPTS_FOR_TAB",
            Self::ContextUpdated { .. } => "CONTEXT_UPDATED",
            Self::ResourceContextUpdated { .. } => "RESOURCE_CONTEXT_UPDATED",
            Self::PromptContextUpdated { .. } => "PROMPT_CONTEXT_UPDATED",
            Self::ExecuteToolRequest { .. } => "EXECUTE_TOOL_REQUEST",
            Self::ReadResourceRequest { .. } => "READ_RESOURCE_REQUEST",
            Self::GetPromptRequest { .. } => "GET_PROMPT_REQUEST",
            Self::CallResponse { .. } => "CALL_RESPONSE",
            Self::SamplingRequest { .. } => "SAMPLING_REQUEST",
            Self::SamplingResponse { .. } => "SAMPLING_RESPONSE",
            Self::PageClosed { .. } => "PAGE_CLOSED",
            Self::Ack => "ACK",
        }
    }

    /// Re-checks domain invariants of payloads received from another context.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] when a carried descriptor
    /// has a blank name.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::NewToolAvailable { tool } => {
                CapabilityDescriptor::Tool(tool.clone()).validate()?;
            }
            Self::NewResourceAvailable { resource } => {
                CapabilityDescriptor::Resource(resource.clone()).validate()?;
            }
            Self::NewPromptAvailable { prompt } => {
                CapabilityDescriptor::Prompt(prompt.clone()).validate()?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Directive a relay executes against its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PageDirective {
    /// Run a tool on the page.
    ExecuteOnPage {
        /// Tool to run.
        tool_name: String,
        /// Tool arguments.
        #[serde(default)]
        args: Map<String, Value>,
        /// Correlation token.
        call_id: CallId,
    },
    /// Read a resource on the page.
    ReadResourceOnPage {
        /// Resource to read.
        resource_name: String,
        /// Correlation token.
        call_id: CallId,
    },
    /// Render a prompt on the page.
    GetPromptOnPage {
        /// Prompt to render.
        prompt_name: String,
        /// Prompt arguments.
        #[serde(default)]
        args: Map<String, Value>,
        /// Correlation token.
        call_id: CallId,
    },
}

impl PageDirective {
    /// Returns the correlation token.
    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        match self {
            Self::ExecuteOnPage { call_id, .. }
            | Self::ReadResourceOnPage { call_id, .. }
            | Self::GetPromptOnPage { call_id, .. } => call_id,
        }
    }

    /// Returns the capability kind targeted by the directive.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::ExecuteOnPage { .. } => CapabilityKind::Tool,
            Self::ReadResourceOnPage { .. } => CapabilityKind::Resource,
            Self::GetPromptOnPage { .. } => CapabilityKind::Prompt,
        }
    }

    /// Returns the targeted capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ExecuteOnPage { tool_name, .. } => tool_name,
            Self::ReadResourceOnPage { resource_name, .. } => resource_name,
            Self::GetPromptOnPage { prompt_name, .. } => prompt_name,
        }
    }

    /// Returns a copy of the directive carrying `call_id`.
    #[must_use]
    pub fn with_call_id(self, call_id: CallId) -> Self {
        match self {
            Self::ExecuteOnPage {
                tool_name, args, ..
            } => Self::ExecuteOnPage {
                tool_name,
                args,
                call_id,
            },
            Self::ReadResourceOnPage { resource_name, .. } => Self::ReadResourceOnPage {
                resource_name,
                call_id,
            },
            Self::GetPromptOnPage {
                prompt_name, args, ..
            } => Self::GetPromptOnPage {
                prompt_name,
                args,
                call_id,
            },
        }
    }

    /// Splits an agent request into its target page and page directive.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedMessage`] for messages that are not
    /// execute, read, or get requests.
    pub fn from_request(message: BridgeMessage) -> Result<(PageInstanceId, Self), ProtocolError> {
        match message {
            BridgeMessage::ExecuteToolRequest {
                tab_id,
                tool_name,
                args,
                call_id,
            } => Ok((
                tab_id,
                Self::ExecuteOnPage {
                    tool_name,
                    args,
                    call_id,
                },
            )),
            BridgeMessage::ReadResourceRequest {
                tab_id,
                resource_name,
                call_id,
            } => Ok((
                tab_id,
                Self::ReadResourceOnPage {
                    resource_name,
                    call_id,
                },
            )),
            BridgeMessage::GetPromptRequest {
                tab_id,
                prompt_name,
                args,
                call_id,
            } => Ok((
                tab_id,
                Self::GetPromptOnPage {
                    prompt_name,
                    args,
                    call_id,
                },
            )),
            other => Err(ProtocolError::UnexpectedMessage(other.type_name())),
        }
    }
}
