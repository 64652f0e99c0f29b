//! Wire protocol shared by every context of the bridge.
//!
//! Messages are tagged unions (`type` discriminator plus camelCase payload)
//! wrapped in a versioned [`Envelope`] that is validated at each boundary.
//! Page-local traffic travels as [`PageEvent`]s over a [`PageEventBus`].

mod envelope;
mod error;
mod message;
mod page;
mod sampling;

pub use envelope::{CURRENT_PROTOCOL_VERSION, Envelope};
pub use error::ProtocolError;
pub use message::{BridgeMessage, PageDirective};
pub use page::{PageEvent, PageEventBus};
pub use sampling::{ChatMessage, MessageContent, MessageRole, SamplingRequest, SamplingResponse};

#[cfg(test)]
mod tests;
