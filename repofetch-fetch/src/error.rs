//! Fetch error types.
//!
//! Errors are layered the same way failures propagate:
//!
//! - [`TransportError`] is raised by a [`FetchTarget`](crate::FetchTarget)
//! - [`AttemptError`] is one failed attempt; it never leaves the fetcher
//! - [`FetchError`] is what crosses the orchestrator boundary

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Both the primary and the fallback stage were exhausted.
    #[error(
        "Unhealthy service state detected after [{attempts}] attempts against the fallback target! \
         Underlying cause was [{}]. \
         Try again later or contact the remote host's administrators!",
        describe_cause(.cause)
    )]
    ExternalServiceUnhealthy {
        /// Attempts made by the final (fallback) stage.
        attempts: u32,
        /// Last failure seen by the final stage, if any attempt ran.
        #[source]
        cause: Option<Arc<AttemptError>>,
    },

    /// Retry policy values violate their invariants.
    #[error("Invalid retry policy: {0}")]
    InvalidPolicy(String),

    /// Target definition (URL template, domains) is unusable.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error while reading or writing configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Returns true for the terminal double-exhaustion failure.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::ExternalServiceUnhealthy { .. })
    }
}

fn describe_cause(cause: &Option<Arc<AttemptError>>) -> String {
    cause
        .as_ref()
        .map_or_else(|| "unknown".to_string(), ToString::to_string)
}

// ============================================================================
// Attempt Error
// ============================================================================

/// Why a single attempt failed.
///
/// The retry loop treats every variant the same way: one attempt is consumed
/// and the next one starts immediately.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The attempt did not finish within the per-attempt timeout.
    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The target raised a transport or processing failure.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The worker running the attempt died or could not be scheduled.
    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

impl AttemptError {
    /// Returns true if the attempt was cut off by its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

// ============================================================================
// Transport Error
// ============================================================================

/// Error raised by a fetch target while resolving or invoking an endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request error.
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// The call observed its cancellation token.
    #[error("Request cancelled")]
    Cancelled,

    /// Any other processing failure.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Tests
// ============================================================================
