//! Extraction of redirect inputs from HTTP requests
//!
//! The resolver only needs three facts about a request: the host it was sent
//! to, whether it arrived over HTTPS and the original request-target. This
//! module pulls them out of [`http`] request types so servers and middleware
//! do not each re-implement the header handling.

use http::header::HOST;
use http::request::Parts;
use http::uri::Authority;
use http::{HeaderMap, Request, Uri};
use thiserror::Error;

use crate::registry::DomainRegistry;

/// Header set by TLS-terminating proxies with the client-facing scheme
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Request extraction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Host header not found")]
    MissingHost,

    #[error("Invalid host header: {0}")]
    InvalidHost(String),
}

/// The request facts a redirect decision is made from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFacts {
    /// Host without port, case preserved
    pub host: String,
    /// Whether the client-facing connection is HTTPS
    pub is_secure: bool,
    /// Path plus query string, always starting with `/`
    pub path: String,
}

impl RequestFacts {
    /// Extract request facts from a URI and its headers
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority (HTTP/2 requests carry it there). With `trust_forwarded`, an
    /// `X-Forwarded-Proto: https` header marks the request as secure, for
    /// deployments where TLS is terminated upstream.
    pub fn from_uri_and_headers(
        uri: &Uri,
        headers: &HeaderMap,
        trust_forwarded: bool,
    ) -> Result<Self, RequestError> {
        let host = extract_host(uri, headers)?;

        let is_secure = uri.scheme_str() == Some("https")
            || (trust_forwarded && forwarded_https(headers));

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| pq.starts_with('/'))
            .unwrap_or("/")
            .to_string();

        Ok(Self {
            host,
            is_secure,
            path,
        })
    }

    /// Extract request facts from request parts
    pub fn from_parts(parts: &Parts, trust_forwarded: bool) -> Result<Self, RequestError> {
        Self::from_uri_and_headers(&parts.uri, &parts.headers, trust_forwarded)
    }

    /// Extract request facts from a full request
    pub fn from_request<B>(
        request: &Request<B>,
        trust_forwarded: bool,
    ) -> Result<Self, RequestError> {
        Self::from_uri_and_headers(request.uri(), request.headers(), trust_forwarded)
    }

    /// Resolve the canonical redirect for these facts
    pub fn resolve(&self, registry: &DomainRegistry) -> Option<String> {
        registry.resolve_redirect(&self.host, self.is_secure, &self.path)
    }
}

/// Extract the request host, without port
fn extract_host(uri: &Uri, headers: &HeaderMap) -> Result<String, RequestError> {
    if let Some(value) = headers.get(HOST) {
        let raw = value.to_str().map_err(|_| {
            RequestError::InvalidHost(String::from_utf8_lossy(value.as_bytes()).into_owned())
        })?;
        return normalize_host(raw);
    }

    uri.authority()
        .map(|authority| authority.host().to_string())
        .filter(|host| !host.is_empty())
        .ok_or(RequestError::MissingHost)
}

/// Normalize host header (remove port if present)
///
/// Bracketed IPv6 literals keep their brackets. Case is left untouched.
fn normalize_host(raw: &str) -> Result<String, RequestError> {
    if raw.is_empty() {
        return Err(RequestError::MissingHost);
    }

    let authority: Authority = raw
        .parse()
        .map_err(|_| RequestError::InvalidHost(raw.to_string()))?;

    let host = authority.host();
    if host.is_empty() {
        return Err(RequestError::InvalidHost(raw.to_string()));
    }

    Ok(host.to_string())
}

/// Check whether the first `X-Forwarded-Proto` value is `https`
fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}
