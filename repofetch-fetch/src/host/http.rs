//! HTTP fetch target with URL templates, tracing, and domain allowlist.
//!
//! [`HttpTarget`] turns an `owner/id` pair into a GET request against a
//! templated URL such as `https://api.github.com/repos/{owner}/{id}`.
//! Placeholders must occupy whole path segments; the substituted values are
//! percent-encoded as single segments, so an id containing `/` cannot
//! escape its segment.

use async_trait::async_trait;
use reqwest::{Client, header};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{FetchError, TransportError};
use crate::target::{Endpoint, FetchTarget, RemoteResponse};

/// User agent string for repofetch.
const USER_AGENT: &str = concat!("repofetch/", env!("CARGO_PKG_VERSION"));

/// Placeholder for the owner segment.
pub const OWNER_PLACEHOLDER: &str = "{owner}";

/// Placeholder for the id segment.
pub const ID_PLACEHOLDER: &str = "{id}";

// ============================================================================
// URL Template
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Owner,
    Id,
}

/// Parsed URL template.
#[derive(Debug, Clone)]
struct UrlTemplate {
    base: Url,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    fn parse(template: &str) -> Result<Self, FetchError> {
        let invalid = |reason: &str| FetchError::InvalidTarget(format!("{template}: {reason}"));

        let base = Url::parse(template).map_err(|e| invalid(&e.to_string()))?;
        let raw_segments = base
            .path_segments()
            .ok_or_else(|| invalid("URL cannot have a path"))?;

        let mut segments = Vec::new();
        for raw in raw_segments {
            // `Url` stores braces percent-encoded.
            let segment = match raw {
                "%7Bowner%7D" | "{owner}" => Segment::Owner,
                "%7Bid%7D" | "{id}" => Segment::Id,
                literal if literal.contains('%') => {
                    return Err(invalid(&format!(
                        "segment '{literal}' must be a whole placeholder or plain text"
                    )));
                }
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }

        if !segments.contains(&Segment::Owner) {
            return Err(invalid("missing {owner} segment"));
        }
        if !segments.contains(&Segment::Id) {
            return Err(invalid("missing {id} segment"));
        }

        Ok(Self { base, segments })
    }

    fn resolve(&self, owner: &str, id: &str) -> Result<Endpoint, TransportError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| TransportError::InvalidUrl(self.base.to_string()))?;
            path.clear();
            for segment in &self.segments {
                match segment {
                    Segment::Literal(text) => path.push(text),
                    Segment::Owner => path.push(owner),
                    Segment::Id => path.push(id),
                };
            }
        }
        Ok(Endpoint::new(url))
    }
}

// ============================================================================
// HTTP Target
// ============================================================================

/// A [`FetchTarget`] backed by an HTTP host.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    name: String,
    template: UrlTemplate,
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpTarget {
    /// Creates a target for the given URL template.
    ///
    /// The client carries no request timeout of its own; each call is bounded
    /// by the fetcher's per-attempt timeout instead.
    pub fn new(name: impl Into<String>, template: &str) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Self::with_client(name, template, client)
    }

    /// Creates a target that sends requests through an existing client.
    pub fn with_client(
        name: impl Into<String>,
        template: &str,
        client: Client,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            name: name.into(),
            template: UrlTemplate::parse(template)?,
            inner: client,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains and their subdomains.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &Url) -> Result<(), TransportError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let host = url
            .host_str()
            .ok_or_else(|| TransportError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(TransportError::DomainNotAllowed(host.to_string()))
        }
    }

    async fn get(&self, endpoint: &Endpoint) -> Result<RemoteResponse, TransportError> {
        let response = self
            .inner
            .get(endpoint.url().clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        let mut remote = RemoteResponse::new(status, body).with_endpoint(endpoint);
        remote.content_type = content_type;
        Ok(remote)
    }
}

#[async_trait]
impl FetchTarget for HttpTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, owner: &str, id: &str) -> Result<Endpoint, TransportError> {
        self.template.resolve(owner, id)
    }

    #[instrument(skip(self, cancel), fields(target = %self.name, url = %endpoint))]
    async fn invoke(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> Result<RemoteResponse, TransportError> {
        self.is_domain_allowed(endpoint.url())?;
        debug!("GET request");

        tokio::select! {
            result = self.get(endpoint) => result,
            () = cancel.cancelled() => Err(TransportError::Cancelled),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
