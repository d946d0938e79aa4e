//! Bounded worker pool for fetch attempts.
//!
//! Every attempt runs on its own tokio task so its timeout can be enforced
//! from the outside. The pool caps how many of those tasks may be in flight
//! at once across all fetch calls sharing it. Dropping an [`AttemptHandle`]
//! aborts the task and, with it, any I/O it still has pending.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::error::AttemptError;

/// Default number of concurrent attempts.
pub const DEFAULT_CAPACITY: usize = 16;

// ============================================================================
// Worker Pool
// ============================================================================

/// Shared, bounded pool of attempt workers.
///
/// Cloning is cheap; clones share the same permits.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool allowing `capacity` concurrent attempts (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many workers are free right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free worker, then runs `task` on it.
    ///
    /// The permit is held by the task and released when it finishes or is
    /// aborted.
    pub async fn dispatch<F, T>(&self, task: F) -> Result<AttemptHandle<T>, AttemptError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AttemptError::WorkerFailed("worker pool closed".to_string()))?;
        trace!(available = self.available(), "Worker acquired");

        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });

        Ok(AttemptHandle { handle })
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ============================================================================
// Attempt Handle
// ============================================================================

/// Handle to a running attempt. Aborts the attempt when dropped.
#[derive(Debug)]
pub struct AttemptHandle<T> {
    handle: JoinHandle<T>,
}

impl<T> AttemptHandle<T> {
    /// Waits for the attempt to finish.
    pub async fn join(&mut self) -> Result<T, AttemptError> {
        (&mut self.handle).await.map_err(|e| {
            if e.is_panic() {
                AttemptError::WorkerFailed("attempt worker panicked".to_string())
            } else {
                AttemptError::WorkerFailed("attempt worker was cancelled".to_string())
            }
        })
    }
}

impl<T> Drop for AttemptHandle<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatch_returns_output() {
        let pool = WorkerPool::new(2);
        let mut handle = pool.dispatch(async { 41 + 1 }).await.unwrap();
        assert_eq!(handle.join().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_capacity_floor() {
        assert_eq!(WorkerPool::new(0).capacity(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_permit() {
        let pool = WorkerPool::new(1);
        let handle = pool
            .dispatch(tokio::time::sleep(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert_eq!(pool.available(), 0);

        drop(handle);
        // Let the runtime process the abort.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_reports_worker_failure() {
        let pool = WorkerPool::new(1);
        let mut handle = pool
            .dispatch(async {
                panic!("boom");
            })
            .await
            .unwrap();

        let result: Result<(), _> = handle.join().await;
        assert!(matches!(result, Err(AttemptError::WorkerFailed(_))));
        assert_eq!(pool.available(), 1);
    }
}
