//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::host::HttpTarget;
use crate::orchestrator::{FallbackOrchestrator, OrchestratorConfig};
use crate::policy::{self, RetryPolicy};
use crate::pool;

/// Fetch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URL template of the primary target.
    #[serde(default = "default_primary_url")]
    pub primary_url: String,
    /// URL template of the fallback target.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Attempts per stage.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fallback-stage overrides.
    #[serde(default)]
    pub fallback: FallbackOverrides,
    /// Maximum attempts in flight across concurrent fetches.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Domains requests may go to; unrestricted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
}

/// Values that replace the shared policy for the fallback stage only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackOverrides {
    /// Per-attempt timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Attempts for the fallback stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl FallbackOverrides {
    fn is_empty(&self) -> bool {
        self.timeout_ms.is_none() && self.max_attempts.is_none()
    }
}

fn default_primary_url() -> String {
    "https://api.github.com/repos/{owner}/{id}".to_string()
}

// Without a dedicated mirror, the fallback retries the primary host.
fn default_fallback_url() -> String {
    default_primary_url()
}

fn default_timeout_ms() -> u64 {
    u64::try_from(policy::DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

fn default_max_attempts() -> u32 {
    policy::DEFAULT_MAX_ATTEMPTS
}

fn default_max_in_flight() -> usize {
    pool::DEFAULT_CAPACITY
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            fallback_url: default_fallback_url(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            fallback: FallbackOverrides::default(),
            max_in_flight: default_max_in_flight(),
            allowed_domains: None,
        }
    }
}

impl FetchConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repofetch")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, FetchError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, FetchError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: FetchConfig = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), FetchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validates the retry settings into orchestrator settings.
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, FetchError> {
        let primary = RetryPolicy::from_millis(self.timeout_ms, self.max_attempts)?;
        let mut config = OrchestratorConfig::new(primary).with_max_in_flight(self.max_in_flight);

        if !self.fallback.is_empty() {
            let fallback = RetryPolicy::from_millis(
                self.fallback.timeout_ms.unwrap_or(self.timeout_ms),
                self.fallback.max_attempts.unwrap_or(self.max_attempts),
            )?;
            config = config.with_fallback_policy(fallback);
        }

        Ok(config)
    }

    /// Builds HTTP targets and an orchestrator from this configuration.
    pub fn build_orchestrator(&self) -> Result<FallbackOrchestrator, FetchError> {
        let config = self.orchestrator_config()?;

        let mut primary = HttpTarget::new("primary", &self.primary_url)?;
        let mut fallback = HttpTarget::new("fallback", &self.fallback_url)?;
        if let Some(domains) = &self.allowed_domains {
            primary = primary.with_allowed_domains(domains.clone());
            fallback = fallback.with_allowed_domains(domains.clone());
        }

        Ok(FallbackOrchestrator::new(
            Arc::new(primary),
            Arc::new(fallback),
            config,
        ))
    }
}
