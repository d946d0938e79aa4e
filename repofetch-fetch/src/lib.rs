// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Repofetch Fetch
//!
//! Resilient retrieval of repository descriptors from remote hosts.
//!
//! ## Fetching
//!
//! - [`fetcher::ResilientFetcher`] - Bounded retries with a per-attempt timeout
//! - [`orchestrator::FallbackOrchestrator`] - Primary target first, then the fallback
//! - [`pool::WorkerPool`] - Shared, bounded pool that runs attempts
//! - [`policy::RetryPolicy`] - Timeout and attempt budget for one stage
//!
//! ## Hosts
//!
//! - [`target::FetchTarget`] - Trait for anything that can serve a descriptor
//! - [`host::http`] - HTTP target with URL templates and domain allowlist
//!
//! ## Example
//!
//! ```ignore
//! use repofetch_fetch::FetchConfig;
//!
//! let orchestrator = FetchConfig::load()?.build_orchestrator()?;
//! let response = orchestrator.get_repository("octocat", "Hello-World").await?;
//! println!("{}", response.body);
//! ```

// Core modules
pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod host;
pub mod orchestrator;
pub mod policy;
pub mod pool;
pub mod target;

// Re-export key types at crate root

// Errors
pub use error::{AttemptError, FetchError, TransportError};

// Targets
pub use host::HttpTarget;
pub use target::{Endpoint, FetchTarget, RemoteResponse};

// Fetching
pub use fetcher::{AttemptRecord, ResilientFetcher, StageOutcome};
pub use orchestrator::{FallbackOrchestrator, FetchReport, FetchState, OrchestratorConfig, Stage};
pub use policy::RetryPolicy;
pub use pool::WorkerPool;

// Integration
pub use backend::FetchBackend;
pub use config::{FallbackOverrides, FetchConfig};
