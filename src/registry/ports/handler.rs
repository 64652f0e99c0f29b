//! Handler contracts supplied by page code at registration time.
//!
//! The bridge never inspects what a handler does; it only awaits whether it
//! resolves or rejects.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type returned by every handler.
pub type HandlerResult = Result<Value, HandlerError>;

/// Rejection raised by a handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a rejection with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a rejection from any error value.
    #[must_use]
    pub fn from_error(err: &(impl std::error::Error + ?Sized)) -> Self {
        Self::new(err.to_string())
    }

    /// Returns the rejection message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Invocation handler of a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool with the given arguments.
    async fn execute(&self, args: Map<String, Value>) -> HandlerResult;
}

/// Read handler of a resource.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Reads the current resource content.
    async fn read(&self) -> HandlerResult;
}

/// Get handler of a prompt template.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    /// Renders the prompt into a message list.
    async fn get(&self, args: Map<String, Value>) -> HandlerResult;
}
