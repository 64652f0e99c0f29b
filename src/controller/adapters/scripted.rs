//! Model client replaying a fixed script of turns.
//!
//! Stands in for a real provider in demos and integration tests. Every
//! request is recorded so callers can inspect what the model was shown.

use crate::controller::domain::{ModelRequest, ModelTurn};
use crate::controller::ports::{ModelClient, ModelClientError, ModelClientResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    turns: VecDeque<ModelClientResult<ModelTurn>>,
    requests: Vec<ModelRequest>,
}

/// Scripted [`ModelClient`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedModelClient {
    script: Arc<Mutex<Script>>,
    latency: Duration,
}

impl ScriptedModelClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Appends a turn to the script.
    #[must_use]
    pub fn then(self, turn: ModelTurn) -> Self {
        self.push(Ok(turn));
        self
    }

    /// Appends a failure to the script.
    #[must_use]
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(ModelClientError::Rejected(message.into())));
        self
    }

    fn push(&self, turn: ModelClientResult<ModelTurn>) {
        if let Ok(mut script) = self.script.lock() {
            script.turns.push_back(turn);
        }
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.script
            .lock()
            .map(|script| script.requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn generate(&self, _api_key: &str, request: ModelRequest) -> ModelClientResult<ModelTurn> {
        let next = {
            let mut script = self
                .script
                .lock()
                .map_err(|err| ModelClientError::Rejected(err.to_string()))?;
            script.requests.push(request);
            script.turns.pop_front()
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        next.unwrap_or_else(|| Err(ModelClientError::Rejected("script exhausted".to_owned())))
    }
}
