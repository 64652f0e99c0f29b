//! Language model port.

use crate::controller::domain::{ModelRequest, ModelTurn};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for model calls.
pub type ModelClientResult<T> = Result<T, ModelClientError>;

/// A function-calling language model.
///
/// Requests are stateless: the controller owns the conversation and sends
/// it whole on every turn.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Produces the next turn of the conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ModelClientError`] when the provider rejects the request or
    /// cannot be reached.
    async fn generate(&self, api_key: &str, request: ModelRequest) -> ModelClientResult<ModelTurn>;
}

/// Errors returned by model client implementations.
#[derive(Debug, Clone, Error)]
pub enum ModelClientError {
    /// The provider refused the request.
    #[error("model rejected the request: {0}")]
    Rejected(String),

    /// The provider could not be reached.
    #[error("model transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl ModelClientError {
    /// Wraps a transport-level error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
