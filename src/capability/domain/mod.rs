//! Domain model for advertised capabilities.
//!
//! The capability domain models page-instance identity, correlation ids,
//! the three capability descriptor kinds, per-page directories, and the
//! structured outcome reported for every invocation.

mod descriptor;
mod directory;
mod error;
mod ids;
mod outcome;

pub use descriptor::{
    CapabilityDescriptor, CapabilityKind, PromptArgument, PromptDescriptor, ResourceDescriptor,
    ToolDescriptor,
};
pub use directory::{CapabilityDirectory, DirectoryInsertion};
pub use error::{BridgeFailure, CapabilityDomainError, ParseCapabilityKindError};
pub use ids::{CallId, PageInstanceId};
pub use outcome::{CallOutcome, CallStatus};
