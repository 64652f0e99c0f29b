//! Structured outcome of a correlated call.

use super::BridgeFailure;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Whether a call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// The handler produced a value.
    Success,
    /// The call failed; the result holds `{"error": message}`.
    Error,
}

/// Outcome reported exactly once per call id.
///
/// Serialises as `{"status": "success" | "error", "result": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    status: CallStatus,
    result: Value,
}

impl CallOutcome {
    /// Wraps a successful handler result.
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self {
            status: CallStatus::Success,
            result,
        }
    }

    /// Wraps an error message as `{"error": message}`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CallStatus::Error,
            result: json!({ "error": message.into() }),
        }
    }

    /// Returns the call status.
    #[must_use]
    pub const fn status(&self) -> CallStatus {
        self.status
    }

    /// Returns whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, CallStatus::Success)
    }

    /// Returns the result payload.
    #[must_use]
    pub const fn result(&self) -> &Value {
        &self.result
    }

    /// Returns the error message of a failed call.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self.status {
            CallStatus::Success => None,
            CallStatus::Error => self.result.get("error").and_then(Value::as_str),
        }
    }

    /// Consumes the outcome, returning the payload or the error message.
    ///
    /// # Errors
    ///
    /// Returns the error message when the call failed.
    pub fn into_result(self) -> Result<Value, String> {
        match self.status {
            CallStatus::Success => Ok(self.result),
            CallStatus::Error => Err(self
                .result
                .get("error")
                .and_then(Value::as_str)
                .map_or_else(|| self.result.to_string(), ToOwned::to_owned)),
        }
    }
}

impl From<BridgeFailure> for CallOutcome {
    fn from(failure: BridgeFailure) -> Self {
        Self::error(failure.to_string())
    }
}
