//! Error types for capability validation and the bridge failure taxonomy.

use super::{CallId, CapabilityKind, PageInstanceId};
use std::time::Duration;
use thiserror::Error;

/// Errors returned while constructing capability domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityDomainError {
    /// A capability name is empty after trimming.
    #[error("{0} name must not be empty")]
    EmptyCapabilityName(CapabilityKind),

    /// A prompt argument name is empty after trimming.
    #[error("prompt argument name must not be empty")]
    EmptyPromptArgumentName,

    /// A page instance identifier is empty after trimming.
    #[error("page instance identifier must not be empty")]
    EmptyPageInstanceId,

    /// A call identifier is empty after trimming.
    #[error("call identifier must not be empty")]
    EmptyCallId,
}

/// Error returned while parsing a capability kind from its wire form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability kind: {0}")]
pub struct ParseCapabilityKindError(pub String);

/// Failure taxonomy shared by every context of the bridge.
///
/// Failures never cross a context boundary as Rust errors. They are
/// converted into an error [`super::CallOutcome`] at the point where they
/// are detected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeFailure {
    /// The named capability is not registered on the page.
    #[error("Unknown {kind}: {name}")]
    UnknownCapability {
        /// Capability kind that was looked up.
        kind: CapabilityKind,
        /// Name that was not found.
        name: String,
    },

    /// The handler rejected or panicked.
    #[error("{0}")]
    HandlerFailure(String),

    /// The deadline elapsed before a response arrived.
    #[error("Timeout: no response for call {call_id} within {}ms", .waited.as_millis())]
    Timeout {
        /// Call that timed out.
        call_id: CallId,
        /// Deadline that elapsed.
        waited: Duration,
    },

    /// The destination context is no longer reachable.
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),
}

impl BridgeFailure {
    /// Builds an unknown-capability failure.
    #[must_use]
    pub fn unknown(kind: CapabilityKind, name: impl Into<String>) -> Self {
        Self::UnknownCapability {
            kind,
            name: name.into(),
        }
    }

    /// Builds a channel-unavailable failure for a page instance.
    #[must_use]
    pub fn page_unreachable(page: &PageInstanceId) -> Self {
        Self::ChannelUnavailable(format!("page instance {page} is not reachable"))
    }
}
