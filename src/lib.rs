//! Capability bridge: lets web pages offer tools, resources, and prompts to
//! an AI agent running in a separate, memory-isolated context.
//!
//! Four contexts take part and share no memory. Each can appear and vanish
//! independently:
//!
//! - **Page**: a [`registry::services::CapabilityRegistry`] holds the
//!   handlers and announces descriptors on the page event bus.
//! - **Relay**: one [`relay::Relay`] per page instance bridges the page bus
//!   and the router, correlating every directive with a call id and a
//!   deadline.
//! - **Router**: the disposable [`router::services::Router`] keeps
//!   per-page directories as a cache over a durable
//!   [`router::ports::DirectoryStore`] and routes calls.
//! - **Agent UI**: the [`controller::services::AgentController`] queries the
//!   router, runs the function-calling loop, and answers sampling requests.
//!
//! # Architecture
//!
//! Each component module follows hexagonal architecture:
//!
//! - **Domain**: Pure types and invariants
//! - **Ports**: Trait interfaces for the other contexts and for storage
//! - **Adapters**: Concrete port implementations
//! - **Services**: Orchestration
//!
//! # Modules
//!
//! - [`capability`]: Descriptors, directories, identifiers, call outcomes
//! - [`protocol`]: Versioned envelope and message vocabulary
//! - [`correlation`]: Pending-call table with deadlines
//! - [`config`]: Bridge configuration

pub mod capability;
pub mod config;
pub mod controller;
pub mod correlation;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod router;
