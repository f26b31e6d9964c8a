//! Bounded worker pool with a reserved tier for critical requests
//!
//! Engine computations run on tokio tasks gated by this pool so load cannot
//! fan out unboundedly. Low/normal/high requests share the general permits;
//! critical requests fall back to a small reserved tier when the general
//! tier is saturated, so queued low-priority work cannot starve them.
//! Heartbeats never touch the pool at all (see the router).

use std::sync::Arc;

use a2a_core::Priority;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Permit guard; dropping it frees the worker slot
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
}

/// Bounded pool of analysis workers
pub struct WorkerPool {
    general: Arc<Semaphore>,
    reserved: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool with `max_workers` general permits and
    /// `reserved_critical` extra permits only critical requests may use
    pub fn new(max_workers: usize, reserved_critical: usize) -> Self {
        Self {
            general: Arc::new(Semaphore::new(max_workers.max(1))),
            reserved: Arc::new(Semaphore::new(reserved_critical)),
        }
    }

    /// Acquire a worker slot, waiting if the pool is saturated
    ///
    /// Critical requests try the general tier first and fall back to the
    /// reserved tier rather than queueing behind lower-priority work.
    pub async fn acquire(&self, priority: Priority) -> WorkerPermit {
        if priority == Priority::Critical {
            if let Ok(permit) = self.general.clone().try_acquire_owned() {
                return WorkerPermit { _permit: permit };
            }
            trace!("general tier saturated, critical request using reserved tier");
            let permit = self
                .reserved
                .clone()
                .acquire_owned()
                .await
                .expect("worker pool semaphore closed");
            return WorkerPermit { _permit: permit };
        }

        let permit = self
            .general
            .clone()
            .acquire_owned()
            .await
            .expect("worker pool semaphore closed");
        WorkerPermit { _permit: permit }
    }

    /// Free general slots right now
    pub fn available_workers(&self) -> usize {
        self.general.available_permits()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(8, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        tokio_test::block_on(async {
            let pool = WorkerPool::new(2, 0);
            let a = pool.acquire(Priority::Normal).await;
            let _b = pool.acquire(Priority::Normal).await;
            assert_eq!(pool.available_workers(), 0);

            drop(a);
            assert_eq!(pool.available_workers(), 1);
        });
    }

    #[tokio::test]
    async fn test_critical_admitted_when_general_saturated() {
        let pool = Arc::new(WorkerPool::new(1, 1));
        let _held = pool.acquire(Priority::Low).await;

        // A low request would now queue...
        let queued = {
            let pool = pool.clone();
            tokio::time::timeout(Duration::from_millis(50), async move {
                pool.acquire(Priority::Low).await
            })
            .await
        };
        assert!(queued.is_err(), "low request should still be queued");

        // ...but a critical one goes through the reserved tier immediately.
        let critical = {
            let pool = pool.clone();
            tokio::time::timeout(Duration::from_millis(50), async move {
                pool.acquire(Priority::Critical).await
            })
            .await
        };
        assert!(critical.is_ok(), "critical request should not queue");
    }

    #[tokio::test]
    async fn test_critical_prefers_general_tier() {
        let pool = WorkerPool::new(2, 1);
        let _permit = pool.acquire(Priority::Critical).await;
        // Took a general permit, not the reserved one.
        assert_eq!(pool.available_workers(), 1);
    }
}
