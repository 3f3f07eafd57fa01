//! Redirect resolution
//!
//! Rules are checked in a fixed order and the first match wins:
//! 1. Secondary domain: always redirect to its primary domain
//! 2. Primary domain served over the wrong scheme: redirect to the right one
//! 3. Unknown host with a fallback configured: redirect to the fallback
//! 4. Otherwise no redirect
//!
//! A secondary domain therefore reaches the primary's canonical scheme and
//! host in a single hop.

use crate::registry::{DomainRegistry, PrimaryDomain};
use crate::url::build_url;
use tracing::trace;

/// Resolve the canonical redirect for a request
///
/// `host` is matched by exact string equality, `is_secure` tells whether the
/// request arrived over HTTPS and `path` is the original request-target
/// (path plus query string). Returns `None` when the request is already on
/// its canonical host and scheme, or the host is unknown and no fallback is
/// configured.
pub fn resolve_redirect(
    registry: &DomainRegistry,
    host: &str,
    is_secure: bool,
    path: &str,
) -> Option<String> {
    if let Some(secondary) = registry.secondary_domains().get(host) {
        let primary = registry.primary_domains().get(&secondary.target)?;
        trace!(host, primary = %primary.host, "Secondary domain match");
        return Some(canonical_url(primary, path));
    }

    if let Some(primary) = registry.primary_domains().get(host) {
        if primary.requires_ssl != is_secure {
            trace!(
                host,
                requires_ssl = primary.requires_ssl,
                "Scheme mismatch on primary domain"
            );
            return Some(canonical_url(primary, path));
        }

        trace!(host, "Request already canonical");
        return None;
    }

    if let Some(fallback) = registry.fallback_domain() {
        let primary = registry.primary_domains().get(fallback)?;
        trace!(host, fallback, "Unknown host, using fallback domain");
        return Some(canonical_url(primary, path));
    }

    trace!(host, "Unknown host, no fallback configured");
    None
}

fn canonical_url(primary: &PrimaryDomain, path: &str) -> String {
    build_url(&primary.host, primary.requires_ssl, path)
}

impl DomainRegistry {
    /// Resolve the canonical redirect for a request against this registry
    ///
    /// See [`resolve_redirect`].
    pub fn resolve_redirect(&self, host: &str, is_secure: bool, path: &str) -> Option<String> {
        resolve_redirect(self, host, is_secure, path)
    }
}
