//! Provider-neutral function-calling vocabulary.

use crate::capability::domain::ToolDescriptor;
use crate::protocol::{ChatMessage, MessageRole, SamplingRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool as declared to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name; matches the tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON description of the parameters.
    pub parameters: Value,
}

impl From<&ToolDescriptor> for FunctionDeclaration {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name().to_owned(),
            description: tool.description().to_owned(),
            parameters: tool.input_schema().clone(),
        }
    }
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments supplied by the model.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl FunctionCall {
    /// Creates a call with the given arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One entry of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelInput {
    /// Text typed by the user.
    UserText {
        /// Message body.
        text: String,
    },
    /// Text previously produced by the model.
    ModelText {
        /// Message body.
        text: String,
    },
    /// A function call previously requested by the model.
    FunctionCall(FunctionCall),
    /// The result of executing a function call.
    FunctionResponse {
        /// Function name.
        name: String,
        /// Result payload, or `{ "error": ... }`.
        response: Value,
    },
}

impl From<&ChatMessage> for ModelInput {
    fn from(message: &ChatMessage) -> Self {
        let text = message.content.text().to_owned();
        match message.role {
            MessageRole::User => Self::UserText { text },
            MessageRole::Assistant => Self::ModelText { text },
        }
    }
}

/// What the model produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTurn {
    /// A final text answer.
    Text(String),
    /// One or more function calls to execute before asking again.
    FunctionCalls(Vec<FunctionCall>),
}

/// A complete, stateless request to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system instruction.
    pub system_instruction: Option<String>,
    /// Functions the model may call.
    pub tools: Vec<FunctionDeclaration>,
    /// Conversation so far.
    pub contents: Vec<ModelInput>,
    /// Optional output token limit.
    pub max_tokens: Option<u32>,
}

impl ModelRequest {
    /// Builds a tool-free request answering a page's sampling request.
    #[must_use]
    pub fn for_sampling(model: impl Into<String>, request: &SamplingRequest) -> Self {
        Self {
            model: model.into(),
            system_instruction: request.system_prompt.clone(),
            tools: Vec::new(),
            contents: request.messages.iter().map(ModelInput::from).collect(),
            max_tokens: request.max_tokens,
        }
    }
}
