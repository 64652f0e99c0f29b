//! Versioned message envelope.
//!
//! Every message that crosses a context boundary is wrapped with an explicit
//! protocol version so the format can evolve additively.

use super::ProtocolError;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Protocol version produced by this build.
pub const CURRENT_PROTOCOL_VERSION: u32 = 1;

/// A message plus the protocol version it was encoded with.
///
/// # Examples
///
/// ```
/// use capability_bridge::capability::domain::PageInstanceId;
/// use capability_bridge::protocol::{BridgeMessage, Envelope};
///
/// let envelope = Envelope::new(BridgeMessage::GetToolsForTab {
///     tab_id: PageInstanceId::from(7),
/// });
/// let json = envelope.encode().expect("serialisable");
/// let decoded = Envelope::<BridgeMessage>::decode(&json).expect("valid envelope");
/// assert_eq!(decoded.version(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<M> {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sent_at: Option<DateTime<Utc>>,
    message: M,
}

impl<M> Envelope<M> {
    /// Wraps a message with the current protocol version.
    #[must_use]
    pub const fn new(message: M) -> Self {
        Self {
            version: CURRENT_PROTOCOL_VERSION,
            sent_at: None,
            message,
        }
    }

    /// Wraps a message and stamps it with the clock's current time.
    #[must_use]
    pub fn stamped(message: M, clock: &impl Clock) -> Self {
        Self {
            version: CURRENT_PROTOCOL_VERSION,
            sent_at: Some(clock.utc()),
            message,
        }
    }

    /// Returns the declared protocol version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the send timestamp, if stamped.
    #[must_use]
    pub const fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// Returns the wrapped message.
    #[must_use]
    pub const fn message(&self) -> &M {
        &self.message
    }

    /// Checks the version and returns the wrapped message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnsupportedVersion`] when the version differs
    /// from `supported`.
    pub fn open(self, supported: u32) -> Result<M, ProtocolError> {
        if self.version != supported {
            return Err(ProtocolError::UnsupportedVersion {
                found: self.version,
                supported,
            });
        }
        Ok(self.message)
    }
}

impl<M: Serialize> Envelope<M> {
    /// Serialises the envelope to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] when serialisation fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<M: DeserializeOwned> Envelope<M> {
    /// Parses an envelope from a JSON string without checking the version.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] when the JSON does not match the
    /// envelope or message shape.
    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }
}
