//! Cross-context links between relays, the router, and the agent UI.
//!
//! Each link carries versioned envelopes. A link whose far side is gone
//! reports [`LinkError::Unreachable`]; callers turn that into a
//! `ChannelUnavailable` outcome instead of retrying.

use crate::capability::domain::{CallOutcome, PageInstanceId};
use crate::protocol::{BridgeMessage, Envelope, PageDirective, ProtocolError, SamplingRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors returned when a message cannot cross a link.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// Nothing is listening on the far side.
    #[error("{0} is not reachable")]
    Unreachable(String),

    /// The far side received the message and refused it.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// The envelope failed boundary validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Inbound side of the router, used by relays and the agent UI.
#[async_trait]
pub trait RouterLink: Send + Sync {
    /// Sends a message and waits for the router's reply.
    ///
    /// `origin` is the page instance of a relay sender and `None` for the
    /// agent UI.
    async fn send(
        &self,
        envelope: Envelope<BridgeMessage>,
        origin: Option<&PageInstanceId>,
    ) -> LinkResult<Envelope<BridgeMessage>>;
}

/// Path from the router to the relay of a page instance.
#[async_trait]
pub trait RelayLink: Send + Sync {
    /// Delivers a directive to `page` and waits for its outcome.
    async fn dispatch(
        &self,
        page: &PageInstanceId,
        directive: Envelope<PageDirective>,
    ) -> LinkResult<CallOutcome>;
}

/// Path from the router to the agent UI.
#[async_trait]
pub trait ControllerLink: Send + Sync {
    /// Pushes a directory update.
    async fn notify(&self, update: Envelope<BridgeMessage>) -> LinkResult<()>;

    /// Asks the agent's model to answer a page sampling request.
    async fn sample(&self, request: Envelope<SamplingRequest>) -> LinkResult<CallOutcome>;
}
