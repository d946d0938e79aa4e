//! Primary/fallback orchestration.
//!
//! The orchestrator runs the primary stage and, only if it is exhausted, the
//! fallback stage. When both are exhausted the call fails with
//! [`FetchError::ExternalServiceUnhealthy`], the only failure that leaves
//! this module.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::FetchError;
use crate::fetcher::{ResilientFetcher, StageOutcome};
use crate::policy::RetryPolicy;
use crate::pool::{self, WorkerPool};
use crate::target::{FetchTarget, RemoteResponse};

// ============================================================================
// Stage & State
// ============================================================================

/// Which target a stage runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The preferred target.
    Primary,
    /// The target tried after the primary is exhausted.
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Progress of one orchestrated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Running the primary stage.
    TryingPrimary,
    /// Running the fallback stage.
    TryingFallback,
    /// A stage produced a response.
    Succeeded(Stage),
    /// Both stages were exhausted.
    Failed,
}

impl FetchState {
    /// Returns true for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed)
    }

    /// Returns the stage running in this state, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::TryingPrimary => Some(Stage::Primary),
            Self::TryingFallback => Some(Stage::Fallback),
            Self::Succeeded(_) | Self::Failed => None,
        }
    }

    /// Returns the state after the running stage finished.
    ///
    /// Terminal states are absorbing.
    pub fn advance(self, exhausted: bool) -> Self {
        match (self, exhausted) {
            (Self::TryingPrimary, false) => Self::Succeeded(Stage::Primary),
            (Self::TryingPrimary, true) => Self::TryingFallback,
            (Self::TryingFallback, false) => Self::Succeeded(Stage::Fallback),
            (Self::TryingFallback, true) => Self::Failed,
            (terminal, _) => terminal,
        }
    }
}

// ============================================================================
// Orchestrator Config
// ============================================================================

/// Construction-time settings for a [`FallbackOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Policy for the primary stage.
    pub primary_policy: RetryPolicy,
    /// Policy for the fallback stage; `None` reuses the primary policy.
    pub fallback_policy: Option<RetryPolicy>,
    /// Maximum attempts in flight across all calls.
    pub max_in_flight: usize,
}

impl OrchestratorConfig {
    /// Uses `policy` for both stages.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            primary_policy: policy,
            fallback_policy: None,
            max_in_flight: pool::DEFAULT_CAPACITY,
        }
    }

    /// Gives the fallback stage its own policy.
    pub fn with_fallback_policy(mut self, policy: RetryPolicy) -> Self {
        self.fallback_policy = Some(policy);
        self
    }

    /// Sets the worker pool bound.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Returns the policy the fallback stage will use.
    pub fn effective_fallback_policy(&self) -> RetryPolicy {
        self.fallback_policy.unwrap_or(self.primary_policy)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

// ============================================================================
// Fetch Report
// ============================================================================

/// Everything that happened during one orchestrated fetch.
#[derive(Debug)]
pub struct FetchReport {
    /// The response, or the terminal failure.
    pub result: Result<RemoteResponse, FetchError>,
    /// Final state (`Succeeded` or `Failed`).
    pub state: FetchState,
    /// Primary stage outcome.
    pub primary: StageOutcome,
    /// Fallback stage outcome, if the fallback was contacted.
    pub fallback: Option<StageOutcome>,
    /// Total duration.
    pub duration: Duration,
}

impl FetchReport {
    /// Returns true if a response was obtained.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the stage that served the response.
    pub fn served_by(&self) -> Option<Stage> {
        match self.state {
            FetchState::Succeeded(stage) => Some(stage),
            _ => None,
        }
    }

    /// Returns the total number of attempts across both stages.
    pub fn total_attempts(&self) -> u32 {
        self.primary.attempts_count()
            + self.fallback.as_ref().map_or(0, StageOutcome::attempts_count)
    }
}

// ============================================================================
// Fallback Orchestrator
// ============================================================================

/// Primary-then-fallback fetch with a terminal failure on double exhaustion.
///
/// Targets and policies are fixed at construction. Calls share nothing but
/// the worker pool, so one orchestrator can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    primary: ResilientFetcher,
    fallback: ResilientFetcher,
    config: OrchestratorConfig,
    pool: WorkerPool,
}

impl FallbackOrchestrator {
    /// Creates an orchestrator over the two targets.
    pub fn new(
        primary: Arc<dyn FetchTarget>,
        fallback: Arc<dyn FetchTarget>,
        config: OrchestratorConfig,
    ) -> Self {
        let pool = WorkerPool::new(config.max_in_flight);
        Self {
            primary: ResilientFetcher::with_pool(primary, config.primary_policy, pool.clone()),
            fallback: ResilientFetcher::with_pool(
                fallback,
                config.effective_fallback_policy(),
                pool.clone(),
            ),
            config,
            pool,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the shared worker pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Fetches `owner/id`, falling back once if the primary is exhausted.
    pub async fn get_repository(&self, owner: &str, id: &str) -> Result<RemoteResponse, FetchError> {
        self.fetch_with_report(owner, id).await.result
    }

    /// Like [`get_repository`](Self::get_repository), but also returns the
    /// per-stage attempt log.
    #[instrument(
        skip(self),
        fields(primary = %self.primary.target_name(), fallback = %self.fallback.target_name())
    )]
    pub async fn fetch_with_report(&self, owner: &str, id: &str) -> FetchReport {
        let start = Instant::now();
        let mut state = FetchState::TryingPrimary;

        let mut primary = self.primary.fetch(owner, id).await;
        state = state.advance(primary.is_exhausted());

        let mut fallback = None;
        if state == FetchState::TryingFallback {
            warn!(
                attempts = primary.attempts_count(),
                "Primary exhausted, switching to fallback"
            );
            let outcome = self.fallback.fetch(owner, id).await;
            state = state.advance(outcome.is_exhausted());
            fallback = Some(outcome);
        }

        let served = primary
            .take_response()
            .or_else(|| fallback.as_mut().and_then(StageOutcome::take_response));
        let result = match served {
            Some(response) => {
                if let FetchState::Succeeded(stage) = state {
                    info!(stage = %stage, "Fetch succeeded");
                }
                Ok(response)
            }
            None => {
                let (attempts, cause) = fallback.as_ref().map_or((0, None), |outcome| {
                    (outcome.attempts_count(), outcome.last_error().cloned())
                });
                warn!(attempts, "Fallback exhausted, service unhealthy");
                Err(FetchError::ExternalServiceUnhealthy { attempts, cause })
            }
        };

        FetchReport {
            result,
            state,
            primary,
            fallback,
            duration: start.elapsed(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
