//! Message types for the reverse sampling channel and prompt results.

use crate::capability::domain::CallId;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// End user or page.
    User,
    /// Model.
    Assistant,
}

/// Content of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text.
    Text {
        /// Text body.
        text: String,
    },
}

impl MessageContent {
    /// Returns the text body.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// One message of a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: MessageRole,
    /// Message body.
    pub content: MessageContent,
}

impl ChatMessage {
    /// Creates a user text message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text { text: text.into() },
        }
    }

    /// Creates an assistant text message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text { text: text.into() },
        }
    }
}

/// A page asking the agent's model to produce a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingRequest {
    /// Correlation token for the reply.
    pub request_id: CallId,
    /// Conversation history sent to the model.
    pub messages: Vec<ChatMessage>,
    /// Optional system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Optional output token limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl SamplingRequest {
    /// Creates a request with a fresh request id.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            request_id: CallId::generate(),
            messages,
            system_prompt: None,
            max_tokens: None,
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Sets the output token limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The model's answer to a sampling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingResponse {
    /// Always the assistant.
    pub role: MessageRole,
    /// Generated content.
    pub content: MessageContent,
    /// Model that produced the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SamplingResponse {
    /// Creates an assistant text response.
    #[must_use]
    pub fn text(text: impl Into<String>, model: Option<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text { text: text.into() },
            model,
        }
    }
}
