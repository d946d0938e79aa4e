//! Fetch target trait and types.
//!
//! A target is one remote host that can answer for an `owner/id` pair. The
//! orchestrator holds two of them (primary and fallback) and never looks
//! inside: it only resolves an endpoint and invokes it.

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::TransportError;

// ============================================================================
// Endpoint
// ============================================================================

/// A concrete endpoint, resolved from a target's template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Creates an endpoint from an already parsed URL.
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// Parses an endpoint from a string.
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        Url::parse(url)
            .map(Self)
            .map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))
    }

    /// Returns the URL.
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Returns the URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

// ============================================================================
// Remote Response
// ============================================================================

/// A raw response from a target.
///
/// Any completed exchange is a response, whatever its status; classifying
/// the status is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content type reported by the host.
    pub content_type: Option<String>,
    /// Response body, untouched.
    pub body: String,
    /// Endpoint that produced the response.
    pub endpoint: Option<String>,
}

impl RemoteResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
            endpoint: None,
        }
    }

    /// Creates a `200 OK` JSON response.
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body).with_content_type("application/json")
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Records the endpoint that produced this response.
    pub fn with_endpoint(mut self, endpoint: &Endpoint) -> Self {
        self.endpoint = Some(endpoint.as_str().to_string());
        self
    }

    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for a 404 status.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

// ============================================================================
// Fetch Target Trait
// ============================================================================

/// A remote host that serves repository descriptors.
///
/// ## Implementing a Target
///
/// ```ignore
/// struct StaticTarget;
///
/// #[async_trait]
/// impl FetchTarget for StaticTarget {
///     fn name(&self) -> &str {
///         "static"
///     }
///
///     fn resolve(&self, owner: &str, id: &str) -> Result<Endpoint, TransportError> {
///         Endpoint::parse(&format!("memory://repos/{owner}/{id}"))
///     }
///
///     async fn invoke(
///         &self,
///         endpoint: &Endpoint,
///         _cancel: &CancellationToken,
///     ) -> Result<RemoteResponse, TransportError> {
///         Ok(RemoteResponse::ok_json("{}").with_endpoint(endpoint))
///     }
/// }
/// ```
#[async_trait]
pub trait FetchTarget: Send + Sync {
    /// Short name used in logs and reports (e.g. "github", "mirror").
    fn name(&self) -> &str;

    /// Resolves the endpoint for `owner` and `id`.
    ///
    /// Both values are opaque and must be passed through without
    /// interpretation.
    fn resolve(&self, owner: &str, id: &str) -> Result<Endpoint, TransportError>;

    /// Performs one call against the endpoint.
    ///
    /// `cancel` fires when the caller gives up on this call. Long-running
    /// implementations should stop work and return
    /// [`TransportError::Cancelled`] once it does.
    async fn invoke(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> Result<RemoteResponse, TransportError>;
}

impl fmt::Debug for dyn FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTarget")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
