//! Central router of capability directories and cross-context calls.
//!
//! The router holds one [`crate::capability::domain::CapabilityDirectory`]
//! per page instance, forwards agent requests to the owning relay, and
//! forwards page sampling requests to the agent UI. Its memory is only a
//! cache: every mutation is written through to a
//! [`ports::DirectoryStore`], and every read falls back to it, so a router
//! can be discarded and rebuilt at any time.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
