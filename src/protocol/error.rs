//! Errors raised while decoding or validating protocol messages.

use crate::capability::domain::CapabilityDomainError;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned when a message fails boundary validation.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The envelope declares a version this build does not speak.
    #[error("unsupported protocol version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version carried by the envelope.
        found: u32,
        /// Version understood by this build.
        supported: u32,
    },

    /// The payload is not valid JSON for the expected message type.
    #[error("malformed message: {0}")]
    Malformed(Arc<serde_json::Error>),

    /// The payload decoded but violates a domain invariant.
    #[error(transparent)]
    InvalidPayload(#[from] CapabilityDomainError),

    /// The message is valid but not accepted at this boundary.
    #[error("unexpected message type {0} at this boundary")]
    UnexpectedMessage(&'static str),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(Arc::new(err))
    }
}
