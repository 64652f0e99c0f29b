//! Domain types for page-side capability registration.

mod definition;
mod error;

pub use definition::{Capability, PromptDefinition, ResourceDefinition, ToolDefinition};
pub use error::{RegistryError, RegistryResult};
