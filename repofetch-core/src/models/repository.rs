//! Repository descriptor types.
//!
//! A [`Repository`] is what a remote host describes when asked for an
//! `owner/name` pair. Field names follow the GitHub REST representation so a
//! response body can be deserialized without a translation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Repository
// ============================================================================

/// A repository descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Full name in `owner/name` form.
    pub full_name: String,
    /// Free-form description, if the owner set one.
    #[serde(default)]
    pub description: Option<String>,
    /// HTTPS clone URL.
    pub clone_url: String,
    /// Number of stargazers.
    #[serde(rename = "stargazers_count", alias = "stars", default)]
    pub stars: u64,
    /// When the repository was created.
    pub created_at: DateTime<Utc>,
}

impl Repository {
    /// Creates a repository with no description and no stars.
    pub fn new(
        full_name: impl Into<String>,
        clone_url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            description: None,
            clone_url: clone_url.into(),
            stars: 0,
            created_at,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the stargazer count.
    pub fn with_stars(mut self, stars: u64) -> Self {
        self.stars = stars;
        self
    }

    /// Deserializes a repository from a JSON response body.
    ///
    /// Unknown fields are ignored, so a full GitHub payload is accepted.
    pub fn from_json(body: &str) -> Result<Self, CoreError> {
        let repository: Self = serde_json::from_str(body)?;
        if repository.full_name.is_empty() {
            return Err(CoreError::InvalidData(
                "repository full_name is empty".to_string(),
            ));
        }
        Ok(repository)
    }

    /// Returns the owner part of `full_name`.
    pub fn owner(&self) -> Option<&str> {
        self.full_name.split_once('/').map(|(owner, _)| owner)
    }

    /// Returns the name part of `full_name`, or the whole string when it has
    /// no owner prefix.
    pub fn name(&self) -> &str {
        self.full_name
            .split_once('/')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }
}

// ============================================================================
// Tests
// ============================================================================
