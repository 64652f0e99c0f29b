//! Shared capability model for the bridge.
//!
//! Every context (page, relay, router, agent UI) exchanges the same
//! handler-free descriptors, directories, identifiers, and call outcomes.
//! Handlers themselves never leave the page context and live in
//! [`crate::registry`].

pub mod domain;

#[cfg(test)]
mod tests;
