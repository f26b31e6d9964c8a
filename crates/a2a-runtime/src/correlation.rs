//! Correlation & expiry manager
//!
//! Tracks requests this core has issued and matches inbound responses back
//! to the awaiting caller. Entries are keyed by the request's `message_id`
//! in a concurrent map; resolution removes the entry atomically, so exactly
//! one resolution wins and any later response, error, or expiry for the
//! same id is a no-op rather than a fault.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use a2a_core::{Envelope, ErrorCode};

struct PendingEntry {
    /// The original request, kept so expiry can synthesize a correlated error
    request: Envelope,
    deadline: DateTime<Utc>,
    tx: oneshot::Sender<Envelope>,
}

/// Pending-request table with deterministic single-resolution semantics
pub struct CorrelationManager {
    pending: DashMap<String, PendingEntry>,
    /// Deadline applied to requests that carry no `expires_at`
    default_ttl: Duration,
}

impl CorrelationManager {
    /// Create a manager; `default_ttl` bounds requests without `expires_at`
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            default_ttl,
        }
    }

    /// Register an outbound request and receive the channel its resolution
    /// will arrive on
    pub fn register(&self, request: &Envelope) -> oneshot::Receiver<Envelope> {
        let (tx, rx) = oneshot::channel();
        let deadline = request
            .expires_at
            .unwrap_or_else(|| Utc::now() + self.default_ttl);
        self.pending.insert(
            request.message_id.clone(),
            PendingEntry {
                request: request.clone(),
                deadline,
                tx,
            },
        );
        debug!(
            message_id = %request.message_id,
            receiver = %request.receiver_id,
            deadline = %deadline,
            "pending request registered"
        );
        rx
    }

    /// Resolve the pending entry matching an inbound response/error
    ///
    /// Returns whether an entry was resolved. Resolving an id that was
    /// already resolved or expired returns false and changes nothing.
    pub fn resolve(&self, envelope: Envelope) -> bool {
        let Some(correlation_id) = envelope.correlation_id.clone() else {
            warn!(
                message_id = %envelope.message_id,
                "inbound {:?} without correlation_id dropped",
                envelope.message_type
            );
            return false;
        };

        // remove() is the atomic claim: only one caller gets the entry.
        let Some((_, entry)) = self.pending.remove(&correlation_id) else {
            debug!(correlation_id = %correlation_id, "no pending entry; late or duplicate resolution ignored");
            return false;
        };

        debug!(
            correlation_id = %correlation_id,
            kind = ?envelope.message_type,
            "pending request resolved"
        );
        // The caller may have stopped waiting; that is not an error.
        let _ = entry.tx.send(envelope);
        true
    }

    /// Expire every entry whose deadline has passed, resolving each with a
    /// synthetic `TIMEOUT` error exactly once
    ///
    /// Returns the number of entries expired. Idempotent: a second sweep at
    /// the same instant finds nothing.
    pub fn expire_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|entry| entry.deadline <= now)
            .map(|entry| entry.key().clone())
            .collect();

        let mut expired = 0;
        for message_id in due {
            // A concurrent resolve may have claimed the entry in between.
            let Some((_, entry)) = self.pending.remove(&message_id) else {
                continue;
            };
            warn!(message_id = %message_id, "pending request expired");
            let timeout = Envelope::error_to(
                &entry.request,
                ErrorCode::Timeout,
                "request expired before a response arrived",
            );
            let _ = entry.tx.send(timeout);
            expired += 1;
        }
        expired
    }

    /// Number of requests currently awaiting resolution
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Background sweep driving [`CorrelationManager::expire_due`]
    ///
    /// Runs forever; spawn it once from the composition root.
    pub async fn run_sweeper(&self, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.expire_due(Utc::now());
        }
    }
}
