//! Identifier newtypes for page instances and call correlation.

use super::CapabilityDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of one page instance (one page or tab).
///
/// Numeric tab identifiers convert into it, so `PageInstanceId::from(42)`
/// and `PageInstanceId::new("42")` name the same instance.
///
/// Deserialising goes through [`PageInstanceId::new`], so blank identifiers
/// never cross a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageInstanceId(String);

impl PageInstanceId {
    /// Creates a page instance identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyPageInstanceId`] when the value
    /// is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, CapabilityDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(CapabilityDomainError::EmptyPageInstanceId);
        }
        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for PageInstanceId {
    fn from(tab_id: u64) -> Self {
        Self(tab_id.to_string())
    }
}

impl TryFrom<String> for PageInstanceId {
    type Error = CapabilityDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageInstanceId> for String {
    fn from(page: PageInstanceId) -> Self {
        page.0
    }
}

impl AsRef<str> for PageInstanceId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PageInstanceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Correlation token pairing a request with its eventual response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallId(String);

impl CallId {
    /// Generates a fresh random call identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing correlation token.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityDomainError::EmptyCallId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, CapabilityDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(CapabilityDomainError::EmptyCallId);
        }
        Ok(Self(normalized))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CallId {
    type Error = CapabilityDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CallId> for String {
    fn from(call_id: CallId) -> Self {
        call_id.0
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
