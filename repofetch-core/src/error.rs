//! Core error types for repofetch.

use std::error::Error as StdError;
use thiserror::Error;

/// Core error type for repository reads.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The remote host answered but has no such repository.
    #[error("Repository with given owner [{owner}] and id [{id}] has not been found!")]
    RepositoryNotFound {
        /// Requested owner.
        owner: String,
        /// Requested repository id.
        id: String,
    },

    /// Neither the primary nor the fallback host produced a response.
    #[error("{message}")]
    ServiceUnhealthy {
        /// Human-readable description of the failure.
        message: String,
        /// Attempts made against the last host tried.
        attempts: u32,
        /// Last underlying failure, if any attempt ran.
        #[source]
        cause: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The remote host answered with a status we do not map.
    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    /// Invalid data in a response body.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a not-found error for the given coordinates.
    pub fn not_found(owner: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RepositoryNotFound {
            owner: owner.into(),
            id: id.into(),
        }
    }

    /// Creates a service-unhealthy error without an underlying cause.
    pub fn unhealthy(message: impl Into<String>, attempts: u32) -> Self {
        Self::ServiceUnhealthy {
            message: message.into(),
            attempts,
            cause: None,
        }
    }

    /// Returns the attempt count carried by a service-unhealthy error.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::ServiceUnhealthy { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Returns true if the failure is on the remote side rather than in the
    /// request or the payload.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnhealthy { .. } | Self::UnexpectedStatus(_))
    }
}
