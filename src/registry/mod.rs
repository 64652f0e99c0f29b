//! Page-side capability registry.
//!
//! The registry is the only context holding handler closures. It implements
//! the registration surface ([`ports::ModelContext`]), announces descriptors
//! on the page event bus, and turns inbound directives into handler calls.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
