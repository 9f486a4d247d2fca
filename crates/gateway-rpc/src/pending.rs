//! Pending Call Table - the async-to-sync bridge.
//!
//! Maps correlation IDs to callers waiting for a bus response.
//!
//! Flow:
//! 1. Engine generates a `CorrelationId` and calls `register()` to get a
//!    oneshot receiver; registration arms a deadline timer
//! 2. Engine publishes the request tagged with the ID
//! 3. Dispatcher receives the response, `take()`s the entry and settles it
//! 4. Or the deadline fires first, `take()`s the entry and rejects it
//!
//! `take()` is a single map removal, so of the dispatcher and the deadline
//! exactly one obtains the entry; the loser sees `None` and does nothing.

use crate::correlation::CorrelationId;
use crate::error::RpcError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// What a waiting caller eventually receives.
pub type CallOutcome = Result<Value, RpcError>;

/// One outstanding request.
pub struct PendingCall {
    /// Correlation ID the response must carry
    id: CorrelationId,
    /// Topic the request was published on
    request_topic: String,
    /// Channel to the waiting caller
    sender: oneshot::Sender<CallOutcome>,
    /// Deadline timer, aborted once the call is settled some other way
    deadline: AbortHandle,
    /// Deadline length, reported on timeout
    timeout: Duration,
    /// When the call was registered
    created_at: Instant,
}

impl PendingCall {
    /// Correlation ID of this call.
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Topic the request went out on.
    pub fn request_topic(&self) -> &str {
        &self.request_topic
    }

    /// Time since registration.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Counters for the table.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Calls registered
    pub registered: AtomicU64,
    /// Calls settled by a response (success, remote error or decode error)
    pub completed: AtomicU64,
    /// Calls rejected by their deadline
    pub timed_out: AtomicU64,
    /// Calls withdrawn before a response (publish failure, shutdown)
    pub cancelled: AtomicU64,
    /// Outcomes nobody was left to receive
    pub abandoned: AtomicU64,
}

pub struct PendingCallTable {
    calls: DashMap<CorrelationId, PendingCall>,
    stats: PendingStats,
}

impl PendingCallTable {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            stats: PendingStats::default(),
        }
    }

    /// Register a call under `id` and arm its deadline.
    ///
    /// Returns `None` without touching the existing entry if `id` is
    /// already in flight.
    pub fn register(
        self: &Arc<Self>,
        id: CorrelationId,
        request_topic: &str,
        timeout: Duration,
    ) -> Option<oneshot::Receiver<CallOutcome>> {
        let slot = match self.calls.entry(id) {
            Entry::Occupied(_) => {
                warn!(correlation_id = %id, "Correlation ID collision, entry kept");
                return None;
            }
            Entry::Vacant(slot) => slot,
        };

        let (sender, receiver) = oneshot::channel();
        // The timer cannot observe the map until the slot guard is released.
        let deadline = tokio::spawn(expire_after(Arc::downgrade(self), id, timeout)).abort_handle();
        slot.insert(PendingCall {
            id,
            request_topic: request_topic.to_string(),
            sender,
            deadline,
            timeout,
            created_at: Instant::now(),
        });
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %id,
            request_topic = request_topic,
            timeout_ms = timeout.as_millis(),
            "Registered pending call"
        );
        Some(receiver)
    }

    /// Remove and return the entry for `id`. At most one caller ever gets it.
    pub fn take(&self, id: &CorrelationId) -> Option<PendingCall> {
        self.calls.remove(id).map(|(_, call)| call)
    }

    /// Deliver `outcome` to a call obtained through [`Self::take`],
    /// disarming its deadline.
    ///
    /// Returns false if the caller stopped waiting.
    pub fn settle(&self, call: PendingCall, outcome: CallOutcome) -> bool {
        call.deadline.abort();
        let delivered = call.sender.send(outcome).is_ok();

        if delivered {
            self.stats.completed.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %call.id,
                request_topic = %call.request_topic,
                response_time_ms = call.created_at.elapsed().as_millis(),
                "Pending call settled"
            );
        } else {
            self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %call.id, "Caller stopped waiting before settlement");
        }
        delivered
    }

    /// Withdraw a call without settling it (its receiver sees a closed channel).
    ///
    /// Returns false if the entry was already taken.
    pub fn cancel(&self, id: &CorrelationId) -> bool {
        match self.take(id) {
            Some(call) => {
                call.deadline.abort();
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Reject every pending call with `error`. Returns how many were rejected.
    pub fn drain(&self, error: RpcError) -> usize {
        let ids: Vec<CorrelationId> = self.calls.iter().map(|entry| *entry.key()).collect();
        let mut rejected = 0;

        for id in ids {
            if let Some(call) = self.take(&id) {
                call.deadline.abort();
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                let _ = call.sender.send(Err(error.clone()));
                rejected += 1;
            }
        }
        rejected
    }

    fn expire(&self, id: CorrelationId) {
        let Some(call) = self.take(&id) else {
            // Settled just before the deadline.
            return;
        };
        self.stats.timed_out.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id = %id,
            request_topic = %call.request_topic,
            timeout_ms = call.timeout.as_millis(),
            "Pending call timed out"
        );

        let error = RpcError::Timeout {
            request_topic: call.request_topic,
            after: call.timeout,
        };
        if call.sender.send(Err(error)).is_err() {
            self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.calls.len()
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.calls.contains_key(id)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

impl Default for PendingCallTable {
    fn default() -> Self {
        Self::new()
    }
}

async fn expire_after(table: Weak<PendingCallTable>, id: CorrelationId, timeout: Duration) {
    tokio::time::sleep(timeout).await;
    if let Some(table) = table.upgrade() {
        table.expire(id);
    }
}
