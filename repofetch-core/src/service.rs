//! Read-through repository service.

use tracing::{debug, instrument};

use crate::error::CoreError;
use crate::models::Repository;
use crate::traits::RepositoryBackend;

/// Read-through service over a [`RepositoryBackend`].
///
/// Holds no state of its own; every call goes to the backend.
#[derive(Debug, Clone)]
pub struct RepositoryService<B> {
    backend: B,
}

impl<B: RepositoryBackend> RepositoryService<B> {
    /// Creates a service reading through the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Reads the repository `name` owned by `owner`.
    #[instrument(skip(self))]
    pub async fn read_by_owner_and_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Repository, CoreError> {
        debug!("Reading repository");
        self.backend.read(owner, name).await
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockBackend {
        calls: AtomicU32,
        known: &'static str,
    }

    impl RepositoryBackend for MockBackend {
        async fn read(&self, owner: &str, name: &str) -> Result<Repository, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let full_name = format!("{owner}/{name}");
            if full_name == self.known {
                Ok(Repository::new(full_name, "https://example.com/x.git", Utc::now()))
            } else {
                Err(CoreError::not_found(owner, name))
            }
        }
    }

    #[tokio::test]
    async fn test_reads_through_backend() {
        let service = RepositoryService::new(MockBackend {
            calls: AtomicU32::new(0),
            known: "octocat/Hello-World",
        });

        let repo = service
            .read_by_owner_and_name("octocat", "Hello-World")
            .await
            .unwrap();
        assert_eq!(repo.full_name, "octocat/Hello-World");

        // No caching: a second read hits the backend again.
        service
            .read_by_owner_and_name("octocat", "Hello-World")
            .await
            .unwrap();
        assert_eq!(service.backend().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_propagates_backend_error() {
        let service = RepositoryService::new(MockBackend {
            calls: AtomicU32::new(0),
            known: "octocat/Hello-World",
        });

        let err = service
            .read_by_owner_and_name("octocat", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RepositoryNotFound { .. }));
    }
}
