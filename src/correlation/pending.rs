//! Pending-call table with deadline-bounded waits.

use crate::capability::domain::{BridgeFailure, CallId, CallOutcome, CapabilityKind, PageInstanceId};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

/// What a pending call is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// A page-side tool, resource, or prompt call.
    Capability(CapabilityKind),
    /// A model sampling round trip.
    Sampling,
}

impl fmt::Display for CallKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capability(kind) => write!(formatter, "{kind}"),
            Self::Sampling => formatter.write_str("sampling"),
        }
    }
}

/// Errors returned by the pending-call table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// The call id is already outstanding in this table.
    #[error("call {0} is already pending")]
    DuplicateCallId(CallId),

    /// The table lock was poisoned by a panicking holder.
    #[error("pending-call table is unavailable: {0}")]
    Poisoned(String),
}

/// Bookkeeping for one outstanding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    call_id: CallId,
    kind: CallKind,
    owner: Option<PageInstanceId>,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

impl PendingCall {
    /// Returns the correlation token.
    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// Returns what the call waits for.
    #[must_use]
    pub const fn kind(&self) -> CallKind {
        self.kind
    }

    /// Returns the page instance that owns the call, if scoped to one.
    #[must_use]
    pub const fn owner(&self) -> Option<&PageInstanceId> {
        self.owner.as_ref()
    }

    /// Returns when the call was dispatched.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the call gives up waiting.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }
}

struct PendingEntry {
    call: PendingCall,
    token: u64,
    sender: oneshot::Sender<CallOutcome>,
}

#[derive(Default)]
struct PendingState {
    entries: HashMap<CallId, PendingEntry>,
}

type SharedState = Arc<Mutex<PendingState>>;

fn lock_state(state: &SharedState) -> Result<MutexGuard<'_, PendingState>, CorrelationError> {
    state
        .lock()
        .map_err(|err| CorrelationError::Poisoned(err.to_string()))
}

/// Table of outstanding calls for one correlation scope.
pub struct PendingCalls<C>
where
    C: Clock + Send + Sync,
{
    state: SharedState,
    next_token: Arc<AtomicU64>,
    clock: Arc<C>,
}

impl<C> Clone for PendingCalls<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            next_token: Arc::clone(&self.next_token),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> PendingCalls<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Arc::default(),
            next_token: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    /// Registers an outstanding call and returns the handle to await it.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::DuplicateCallId`] when `call_id` is
    /// already outstanding, or [`CorrelationError::Poisoned`].
    pub fn register(
        &self,
        call_id: CallId,
        kind: CallKind,
        owner: Option<PageInstanceId>,
        timeout: Duration,
    ) -> Result<PendingHandle, CorrelationError> {
        let mut state = lock_state(&self.state)?;
        if state.entries.contains_key(&call_id) {
            return Err(CorrelationError::DuplicateCallId(call_id));
        }

        let created_at = self.clock.utc();
        let deadline = TimeDelta::from_std(timeout)
            .ok()
            .and_then(|delta| created_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();

        state.entries.insert(
            call_id.clone(),
            PendingEntry {
                call: PendingCall {
                    call_id: call_id.clone(),
                    kind,
                    owner,
                    created_at,
                    deadline,
                },
                token,
                sender,
            },
        );

        Ok(PendingHandle {
            call_id,
            kind,
            token,
            timeout,
            receiver,
            state: Arc::clone(&self.state),
        })
    }

    /// Delivers the outcome of a call.
    ///
    /// Returns `false` when the call id is not outstanding, which covers
    /// unknown ids and ids already retired by a response, a deadline, or a
    /// teardown.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::Poisoned`] when the lock is poisoned.
    pub fn resolve(&self, call_id: &CallId, outcome: CallOutcome) -> Result<bool, CorrelationError> {
        let entry = lock_state(&self.state)?.entries.remove(call_id);
        let Some(entry) = entry else {
            tracing::debug!(call_id = %call_id, "dropping response for retired or unknown call");
            return Ok(false);
        };
        Ok(entry.sender.send(outcome).is_ok())
    }

    /// Retires every call owned by `owner`. Their waiters observe
    /// [`BridgeFailure::ChannelUnavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::Poisoned`] when the lock is poisoned.
    pub fn retire_owner(&self, owner: &PageInstanceId) -> Result<usize, CorrelationError> {
        let mut state = lock_state(&self.state)?;
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| entry.call.owner.as_ref() != Some(owner));
        Ok(before - state.entries.len())
    }

    /// Returns whether `call_id` is outstanding.
    #[must_use]
    pub fn contains(&self, call_id: &CallId) -> bool {
        lock_state(&self.state).is_ok_and(|state| state.entries.contains_key(call_id))
    }

    /// Returns the number of outstanding calls.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_state(&self.state).map_or(0, |state| state.entries.len())
    }

    /// Returns whether no call is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bookkeeping of every outstanding call.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PendingCall> {
        lock_state(&self.state).map_or_else(
            |_| Vec::new(),
            |state| state.entries.values().map(|entry| entry.call.clone()).collect(),
        )
    }
}

/// Awaitable side of one pending call.
///
/// Dropping the handle retires the call, so an abandoned wait never leaks
/// its table entry.
pub struct PendingHandle {
    call_id: CallId,
    kind: CallKind,
    token: u64,
    timeout: Duration,
    receiver: oneshot::Receiver<CallOutcome>,
    state: SharedState,
}

impl PendingHandle {
    /// Returns the correlation token.
    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// Waits for the outcome or the deadline, whichever comes first.
    pub async fn wait(mut self) -> CallOutcome {
        match tokio::time::timeout(self.timeout, &mut self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                tracing::debug!(call_id = %self.call_id, kind = %self.kind, "pending call retired without response");
                BridgeFailure::ChannelUnavailable(format!(
                    "call {} was retired before a response arrived",
                    self.call_id
                ))
                .into()
            }
            Err(_) => {
                tracing::warn!(
                    call_id = %self.call_id,
                    kind = %self.kind,
                    timeout = ?self.timeout,
                    "pending call timed out"
                );
                BridgeFailure::Timeout {
                    call_id: self.call_id.clone(),
                    waited: self.timeout,
                }
                .into()
            }
        }
    }
}

impl Drop for PendingHandle {
    fn drop(&mut self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state
            .entries
            .get(&self.call_id)
            .is_some_and(|entry| entry.token == self.token)
        {
            state.entries.remove(&self.call_id);
        }
    }
}
