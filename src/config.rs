//! Bridge configuration.
//!
//! Deadlines, protocol version, bus sizing, and the durable record name are
//! gathered here so every component reads them from one value.

use crate::protocol::CURRENT_PROTOCOL_VERSION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors returned when a configuration is rejected.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A deadline is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The page bus capacity is zero.
    #[error("page bus capacity must be greater than zero")]
    ZeroBusCapacity,

    /// The durable record name is blank or contains a path separator.
    #[error("invalid store record name: '{0}'")]
    InvalidRecordName(String),

    /// The configuration source is not valid JSON.
    #[error("invalid configuration JSON: {0}")]
    Parse(Arc<serde_json::Error>),
}

/// Settings shared by the registry, relay, router, and controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Protocol version spoken on every boundary.
    pub protocol_version: u32,
    /// Deadline for page-side tool, resource, and prompt calls, in ms.
    pub execution_timeout_ms: u64,
    /// Deadline for model sampling round trips, in ms.
    pub sampling_timeout_ms: u64,
    /// Per-subscriber buffer of the page event bus.
    pub page_bus_capacity: usize,
    /// File name of the persisted directory record.
    pub store_record: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            protocol_version: CURRENT_PROTOCOL_VERSION,
            execution_timeout_ms: 10_000,
            sampling_timeout_ms: 30_000,
            page_bus_capacity: 256,
            store_record: "capability_directories.json".to_owned(),
        }
    }
}

impl BridgeConfig {
    /// Creates a configuration with short deadlines.
    ///
    /// Useful for tests that exercise timeouts against real time.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            execution_timeout_ms: 200,
            sampling_timeout_ms: 500,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid JSON and the validation
    /// errors of [`BridgeConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(Arc::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that deadlines and sizes are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("executionTimeoutMs"));
        }
        if self.sampling_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("samplingTimeoutMs"));
        }
        if self.page_bus_capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        let record = self.store_record.trim();
        if record.is_empty() || record.contains(['/', '\\']) {
            return Err(ConfigError::InvalidRecordName(self.store_record.clone()));
        }
        Ok(())
    }

    /// Returns the page-side execution deadline.
    #[must_use]
    pub const fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    /// Returns the sampling deadline.
    #[must_use]
    pub const fn sampling_timeout(&self) -> Duration {
        Duration::from_millis(self.sampling_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_config_values() {
        let config = BridgeConfig::default();
        assert_eq!(config.execution_timeout(), Duration::from_secs(10));
        assert_eq!(config.sampling_timeout(), Duration::from_secs(30));
        assert_eq!(config.protocol_version, 1);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(r#"{"executionTimeoutMs": 2500}"#)
            .expect("valid configuration");
        assert_eq!(config.execution_timeout(), Duration::from_millis(2500));
        assert_eq!(config.sampling_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    #[case(r#"{"executionTimeoutMs": 0}"#)]
    #[case(r#"{"samplingTimeoutMs": 0}"#)]
    #[case(r#"{"pageBusCapacity": 0}"#)]
    #[case(r#"{"storeRecord": "../escape.json"}"#)]
    #[case("{")]
    fn invalid_configurations_are_rejected(#[case] json: &str) {
        assert!(BridgeConfig::from_json(json).is_err());
    }
}
