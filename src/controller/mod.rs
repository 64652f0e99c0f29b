//! Agent UI controller.
//!
//! The controller is the agent-facing side of the bridge. It fetches the
//! capability directory of the active page from the router, drives the
//! function-calling loop against a [`ports::ModelClient`], and answers
//! sampling requests raised by pages.
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
