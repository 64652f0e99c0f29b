//! Correlation of requests with their eventual responses.
//!
//! A [`PendingCalls`] table is the only place a call id is retired. The
//! first of {matching response, deadline, owner teardown} wins and every
//! later attempt to resolve the same id is ignored.

mod pending;

pub use pending::{CallKind, CorrelationError, PendingCall, PendingCalls, PendingHandle};
