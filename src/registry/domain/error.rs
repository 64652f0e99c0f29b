//! Error types for the capability registry.

use crate::capability::domain::CapabilityDomainError;
use crate::correlation::CorrelationError;
use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A definition failed validation.
    #[error(transparent)]
    Domain(#[from] CapabilityDomainError),

    /// The sampling correlation table rejected the request.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    /// The registry state lock was poisoned.
    #[error("capability registry is unavailable: {0}")]
    Poisoned(String),

    /// A registration surface refused the definition.
    #[error("registration rejected: {0}")]
    Rejected(String),

    /// A sampling request failed or timed out.
    #[error("sampling failed: {0}")]
    Sampling(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
