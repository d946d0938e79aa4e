//! Bounded-retry fetcher for a single target.
//!
//! A [`ResilientFetcher`] runs one *stage*: up to `max_attempts` sequential
//! attempts against one target, each cut off at `timeout_per_attempt`.
//! The first response wins. Exhausting the budget is a normal outcome and
//! is reported as data in [`StageOutcome`], never as an error.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::AttemptError;
use crate::policy::RetryPolicy;
use crate::pool::WorkerPool;
use crate::target::{FetchTarget, RemoteResponse};

// ============================================================================
// Attempt Record
// ============================================================================

/// Record of a single attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number within the stage.
    pub number: u32,
    /// Whether the attempt produced a response.
    pub success: bool,
    /// Whether the attempt was cut off by its timeout.
    pub timed_out: bool,
    /// Error if the attempt failed.
    pub error: Option<String>,
    /// How long the attempt took.
    pub duration: Duration,
}

impl AttemptRecord {
    /// Creates a successful attempt record.
    pub fn success(number: u32, duration: Duration) -> Self {
        Self {
            number,
            success: true,
            timed_out: false,
            error: None,
            duration,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(number: u32, error: &AttemptError, duration: Duration) -> Self {
        Self {
            number,
            success: false,
            timed_out: error.is_timeout(),
            error: Some(error.to_string()),
            duration,
        }
    }
}

// ============================================================================
// Stage Outcome
// ============================================================================

/// The outcome of one stage.
#[derive(Debug)]
pub struct StageOutcome {
    /// Name of the target that was tried.
    pub target: String,
    /// The response, if an attempt succeeded.
    pub response: Option<RemoteResponse>,
    /// All attempts made, in order.
    pub attempts: Vec<AttemptRecord>,
    /// Last failure seen, if any.
    pub last_error: Option<Arc<AttemptError>>,
    /// Total duration of the stage.
    pub duration: Duration,
}

impl StageOutcome {
    /// Returns true if no attempt succeeded.
    pub fn is_exhausted(&self) -> bool {
        !self.attempts.iter().any(|a| a.success)
    }

    /// Returns the response, if any.
    pub fn response(&self) -> Option<&RemoteResponse> {
        self.response.as_ref()
    }

    /// Moves the response out of the outcome, leaving the attempt log.
    pub fn take_response(&mut self) -> Option<RemoteResponse> {
        self.response.take()
    }

    /// Returns the number of attempts made.
    pub fn attempts_count(&self) -> u32 {
        u32::try_from(self.attempts.len()).unwrap_or(u32::MAX)
    }

    /// Returns the last failure, if any.
    pub fn last_error(&self) -> Option<&Arc<AttemptError>> {
        self.last_error.as_ref()
    }

    /// Returns all errors that occurred.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }
}

// ============================================================================
// Resilient Fetcher
// ============================================================================

/// Runs a bounded number of timed attempts against one target.
///
/// Attempts never overlap: attempt *k+1* starts only after attempt *k* has
/// returned or been cut off. A cut-off attempt has its cancellation token
/// fired and its worker aborted before the next one begins.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    target: Arc<dyn FetchTarget>,
    policy: RetryPolicy,
    pool: WorkerPool,
}

impl ResilientFetcher {
    /// Creates a fetcher with its own default-sized worker pool.
    pub fn new(target: Arc<dyn FetchTarget>, policy: RetryPolicy) -> Self {
        Self::with_pool(target, policy, WorkerPool::default())
    }

    /// Creates a fetcher that dispatches attempts to a shared pool.
    pub fn with_pool(target: Arc<dyn FetchTarget>, policy: RetryPolicy, pool: WorkerPool) -> Self {
        Self {
            target,
            policy,
            pool,
        }
    }

    /// Returns the target's name.
    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    /// Returns the policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches `owner/id`, returning the first successful response.
    #[instrument(
        skip(self),
        fields(target = %self.target.name(), max_attempts = self.policy.max_attempts())
    )]
    pub async fn fetch(&self, owner: &str, id: &str) -> StageOutcome {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut last_error = None;

        for number in 1..=max_attempts {
            let attempt_start = Instant::now();
            debug!(attempt = number, "Starting attempt");

            match self.attempt(owner, id).await {
                Ok(response) => {
                    let duration = attempt_start.elapsed();
                    info!(
                        attempt = number,
                        status = response.status,
                        duration = ?duration,
                        "Attempt succeeded"
                    );

                    attempts.push(AttemptRecord::success(number, duration));
                    return StageOutcome {
                        target: self.target.name().to_string(),
                        response: Some(response),
                        attempts,
                        last_error,
                        duration: start.elapsed(),
                    };
                }
                Err(error) => {
                    let duration = attempt_start.elapsed();
                    warn!(
                        attempt = number,
                        error = %error,
                        duration = ?duration,
                        "Attempt failed"
                    );

                    attempts.push(AttemptRecord::failure(number, &error, duration));
                    last_error = Some(Arc::new(error));
                }
            }
        }

        warn!(attempts = max_attempts, "Stage exhausted");
        StageOutcome {
            target: self.target.name().to_string(),
            response: None,
            attempts,
            last_error,
            duration: start.elapsed(),
        }
    }

    /// Runs one attempt on a pooled worker under the per-attempt timeout.
    ///
    /// The timeout starts once a worker is free; queueing for the pool never
    /// uses up an attempt.
    async fn attempt(&self, owner: &str, id: &str) -> Result<RemoteResponse, AttemptError> {
        let timeout = self.policy.timeout_per_attempt();
        let cancel = CancellationToken::new();

        let target = Arc::clone(&self.target);
        let token = cancel.clone();
        let (owner, id) = (owner.to_string(), id.to_string());
        let call = async move {
            let endpoint = target.resolve(&owner, &id)?;
            target.invoke(&endpoint, &token).await
        };

        let mut handle = self.pool.dispatch(call).await?;

        let joined = tokio::time::timeout(timeout, handle.join()).await;
        match joined {
            Ok(result) => result?.map_err(AttemptError::from),
            Err(_) => {
                // The token reaches anything the target spawned itself;
                // dropping the handle aborts the worker.
                cancel.cancel();
                drop(handle);
                Err(AttemptError::Timeout(timeout))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::target::Endpoint;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails until the `succeed_on`-th call, then answers with `body`.
    struct ScriptedTarget {
        calls: AtomicU32,
        succeed_on: Option<u32>,
        body: &'static str,
    }

    impl ScriptedTarget {
        fn succeeding_on(call: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: Some(call),
                body: r#"{"full_name":"a/b"}"#,
            }
        }

        fn always_failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: None,
                body: "",
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FetchTarget for ScriptedTarget {
        fn name(&self) -> &str {
            "scripted"
        }

        fn resolve(&self, owner: &str, id: &str) -> Result<Endpoint, TransportError> {
            Endpoint::parse(&format!("http://scripted.test/{owner}/{id}"))
        }

        async fn invoke(
            &self,
            endpoint: &Endpoint,
            _cancel: &CancellationToken,
        ) -> Result<RemoteResponse, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.succeed_on {
                Some(n) if call >= n => Ok(RemoteResponse::ok_json(self.body).with_endpoint(endpoint)),
                _ => Err(TransportError::Other("stubbed processing failure".to_string())),
            }
        }
    }

    /// Never answers; keeps the tokens it was handed.
    #[derive(Default)]
    struct HangingTarget {
        calls: AtomicU32,
        tokens: Mutex<Vec<CancellationToken>>,
    }

    #[async_trait]
    impl FetchTarget for HangingTarget {
        fn name(&self) -> &str {
            "hanging"
        }

        fn resolve(&self, owner: &str, id: &str) -> Result<Endpoint, TransportError> {
            Endpoint::parse(&format!("http://hanging.test/{owner}/{id}"))
        }

        async fn invoke(
            &self,
            _endpoint: &Endpoint,
            cancel: &CancellationToken,
        ) -> Result<RemoteResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens.lock().unwrap().push(cancel.clone());
            std::future::pending().await
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::from_millis(100, max_attempts).unwrap()
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let target = Arc::new(ScriptedTarget::succeeding_on(1));
        let fetcher = ResilientFetcher::new(target.clone(), policy(3));

        let outcome = fetcher.fetch("a", "b").await;

        assert!(!outcome.is_exhausted());
        assert_eq!(outcome.attempts_count(), 1);
        assert_eq!(target.calls(), 1);
        assert!(outcome.last_error().is_none());
    }

    #[tokio::test]
    async fn test_success_on_kth_attempt_stops_retrying() {
        for n in 1..=5 {
            for k in 1..=n {
                let target = Arc::new(ScriptedTarget::succeeding_on(k));
                let fetcher = ResilientFetcher::new(target.clone(), policy(n));

                let outcome = fetcher.fetch("owner", "1").await;

                assert!(outcome.response().is_some(), "n={n} k={k}");
                assert_eq!(target.calls(), k, "n={n} k={k}");
                assert_eq!(outcome.errors().len() as u32, k - 1);
            }
        }
    }

    #[tokio::test]
    async fn test_exhaustion_is_data() {
        let target = Arc::new(ScriptedTarget::always_failing());
        let fetcher = ResilientFetcher::new(target.clone(), policy(3));

        let outcome = fetcher.fetch("owner", "1").await;

        assert!(outcome.is_exhausted());
        assert!(outcome.response().is_none());
        assert_eq!(outcome.attempts_count(), 3);
        assert_eq!(target.calls(), 3);
        assert!(matches!(
            outcome.last_error().map(|e| &**e),
            Some(AttemptError::Transport(TransportError::Other(_)))
        ));
    }

    #[tokio::test]
    async fn test_response_is_returned_unmodified() {
        let target = Arc::new(ScriptedTarget::succeeding_on(2));
        let fetcher = ResilientFetcher::new(target, policy(2));

        let response = fetcher.fetch("a", "b").await.take_response().unwrap();

        assert_eq!(response.body, r#"{"full_name":"a/b"}"#);
        assert_eq!(response.status, 200);
        assert_eq!(response.endpoint.as_deref(), Some("http://scripted.test/a/b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_consume_attempts_and_cancel() {
        let target = Arc::new(HangingTarget::default());
        let fetcher = ResilientFetcher::new(target.clone(), policy(3));

        let start = Instant::now();
        let outcome = fetcher.fetch("a", "b").await;
        let elapsed = start.elapsed();

        assert!(outcome.is_exhausted());
        assert!(outcome.attempts.iter().all(|a| a.timed_out));
        assert_eq!(target.calls.load(Ordering::SeqCst), 3);

        // No backoff: three timeouts take three timeouts' worth of time.
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed <= policy(3).worst_case_duration() + Duration::from_millis(10));

        let tokens = target.tokens.lock().unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_workers_are_released() {
        let target = Arc::new(HangingTarget::default());
        let pool = WorkerPool::new(1);
        let fetcher = ResilientFetcher::with_pool(target.clone(), policy(2), pool.clone());

        let outcome = fetcher.fetch("a", "b").await;

        // With a single worker, the second attempt could only start because
        // the first one's worker was reclaimed.
        assert_eq!(outcome.attempts_count(), 2);
        assert_eq!(target.calls.load(Ordering::SeqCst), 2);
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_resolve_failure_counts_as_attempt() {
        struct Unresolvable(AtomicU32);

        #[async_trait]
        impl FetchTarget for Unresolvable {
            fn name(&self) -> &str {
                "unresolvable"
            }

            fn resolve(&self, _owner: &str, _id: &str) -> Result<Endpoint, TransportError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::InvalidUrl("no template".to_string()))
            }

            async fn invoke(
                &self,
                _endpoint: &Endpoint,
                _cancel: &CancellationToken,
            ) -> Result<RemoteResponse, TransportError> {
                unreachable!("resolve never succeeds")
            }
        }

        let target = Arc::new(Unresolvable(AtomicU32::new(0)));
        let fetcher = ResilientFetcher::new(target.clone(), policy(2));

        let outcome = fetcher.fetch("a", "b").await;

        assert!(outcome.is_exhausted());
        assert_eq!(target.0.load(Ordering::SeqCst), 2);
    }
}
