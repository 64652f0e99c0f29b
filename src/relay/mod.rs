//! Per-page relay between the page context and the router.
//!
//! A relay is the only component attached both to a page's event bus and
//! to the router. It owns the pending-call table for directives sent into
//! its page and forwards page sampling requests outward.

mod service;

pub use service::Relay;

#[cfg(test)]
mod tests;
