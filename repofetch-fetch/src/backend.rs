//! [`RepositoryBackend`] backed by the fallback orchestrator.

use std::error::Error as StdError;

use repofetch_core::{CoreError, Repository, RepositoryBackend};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::orchestrator::FallbackOrchestrator;
use crate::target::RemoteResponse;

/// Reads repositories through a [`FallbackOrchestrator`] and maps the raw
/// response to the domain model.
#[derive(Debug, Clone)]
pub struct FetchBackend {
    orchestrator: FallbackOrchestrator,
}

impl FetchBackend {
    /// Creates a backend over the given orchestrator.
    pub fn new(orchestrator: FallbackOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Returns the orchestrator.
    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }
}

impl RepositoryBackend for FetchBackend {
    async fn read(&self, owner: &str, name: &str) -> Result<Repository, CoreError> {
        let response = self
            .orchestrator
            .get_repository(owner, name)
            .await
            .map_err(CoreError::from)?;

        to_repository(owner, name, &response)
    }
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        let message = err.to_string();
        match err {
            FetchError::ExternalServiceUnhealthy { attempts, cause } => Self::ServiceUnhealthy {
                message,
                attempts,
                cause: cause.map(|c| Box::new(c) as Box<dyn StdError + Send + Sync>),
            },
            other => Self::ServiceUnhealthy {
                message,
                attempts: 0,
                cause: Some(Box::new(other)),
            },
        }
    }
}

/// Maps a raw response to a repository.
///
/// 2xx bodies are deserialized, 404 becomes
/// [`CoreError::RepositoryNotFound`], anything else is unexpected.
pub fn to_repository(
    owner: &str,
    name: &str,
    response: &RemoteResponse,
) -> Result<Repository, CoreError> {
    if response.is_success() {
        debug!(status = response.status, "Deserializing repository");
        return Repository::from_json(&response.body);
    }

    if response.is_not_found() {
        return Err(CoreError::not_found(owner, name));
    }

    warn!(status = response.status, "Unexpected status from remote host");
    Err(CoreError::UnexpectedStatus(response.status))
}
