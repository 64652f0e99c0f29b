//! Service layer for page-side capability registration and dispatch.

mod registry;

pub use registry::CapabilityRegistry;
