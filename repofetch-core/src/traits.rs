//! Trait definitions for repofetch.

use crate::error::CoreError;
use crate::models::Repository;

/// A source of repository descriptors.
///
/// Implementors resolve an `owner/name` pair against whatever remote hosts
/// they wrap and map the answer to a [`Repository`]. Retry and fallback
/// behaviour belongs to the implementor, not to callers.
pub trait RepositoryBackend: Send + Sync {
    /// Reads a single repository.
    fn read(
        &self,
        owner: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Repository, CoreError>> + Send;
}
