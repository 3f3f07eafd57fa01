//! Domain string parsing
//!
//! Turns the domain strings used in configuration (`imos.net`,
//! `www.imos.net`, `https://shop.imos.net/`) into a bare host and detects a
//! leading `www.` label.
//!
//! Hosts are taken exactly as written: no lowercasing, punycode conversion or
//! trailing-dot stripping is applied, because lookups at request time compare
//! hosts by exact string equality.

use http::Uri;
use thiserror::Error;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";
const WWW_PREFIX: &str = "www.";

/// Errors that can occur while parsing a domain string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Empty domain")]
    EmptyDomain,

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Domain has no host component: {0}")]
    MissingHost(String),
}

/// Result of parsing a domain string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDomain {
    /// Bare host (no scheme, port, path or trailing slash)
    pub host: String,
    /// Whether the host starts with `www.`
    pub has_www: bool,
    /// The host with the leading `www.` removed, set only when `has_www` is true
    pub host_without_www: Option<String>,
}

impl ParsedDomain {
    /// The `www`-stripped variant of this host, if there is one
    pub fn without_www(&self) -> Option<&str> {
        self.host_without_www.as_deref()
    }
}

/// Parse a domain string into its bare host
///
/// When `domain` does not start with `http://` or `https://`, a scheme is
/// prepended (`https://` if `assume_ssl`, otherwise `http://`) so bare
/// hostnames parse the same way as full URLs. Port, path and query are
/// ignored.
///
/// # Examples
/// ```
/// use canonhost_router::parse_domain;
///
/// let parsed = parse_domain("https://www.imos.net/", false).unwrap();
/// assert_eq!(parsed.host, "www.imos.net");
/// assert!(parsed.has_www);
/// assert_eq!(parsed.without_www(), Some("imos.net"));
///
/// let parsed = parse_domain("shop.imos.net", true).unwrap();
/// assert_eq!(parsed.host, "shop.imos.net");
/// assert!(!parsed.has_www);
/// ```
pub fn parse_domain(domain: &str, assume_ssl: bool) -> Result<ParsedDomain, DomainError> {
    if domain.is_empty() {
        return Err(DomainError::EmptyDomain);
    }

    let url = if domain.starts_with(HTTP_PREFIX) || domain.starts_with(HTTPS_PREFIX) {
        domain.to_string()
    } else if assume_ssl {
        format!("{}{}", HTTPS_PREFIX, domain)
    } else {
        format!("{}{}", HTTP_PREFIX, domain)
    };

    let uri: Uri = url
        .parse()
        .map_err(|_| DomainError::InvalidDomain(domain.to_string()))?;

    let host = uri
        .host()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| DomainError::MissingHost(domain.to_string()))?;

    let has_www = host.len() > WWW_PREFIX.len() && host.starts_with(WWW_PREFIX);
    let host_without_www = if has_www {
        Some(host[WWW_PREFIX.len()..].to_string())
    } else {
        None
    };

    Ok(ParsedDomain {
        host: host.to_string(),
        has_www,
        host_without_www,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_host() {
        let parsed = parse_domain("imos.net", false).unwrap();
        assert_eq!(parsed.host, "imos.net");
        assert!(!parsed.has_www);
        assert_eq!(parsed.host_without_www, None);
    }

    #[test]
    fn test_parse_www_host() {
        let parsed = parse_domain("www.imos.net", true).unwrap();
        assert_eq!(parsed.host, "www.imos.net");
        assert!(parsed.has_www);
        assert_eq!(parsed.host_without_www, Some("imos.net".to_string()));
    }

    #[test]
    fn test_parse_strips_scheme_port_and_path() {
        let parsed = parse_domain("https://www.imos.net:8443/de/index.html?x=y", false).unwrap();
        assert_eq!(parsed.host, "www.imos.net");
        assert_eq!(parsed.without_www(), Some("imos.net"));

        let parsed = parse_domain("http://shop.imos.net/", true).unwrap();
        assert_eq!(parsed.host, "shop.imos.net");
    }

    #[test]
    fn test_parse_preserves_case() {
        // Matching is exact, so the parser must not normalize
        let parsed = parse_domain("WWW.Imos.net", false).unwrap();
        assert_eq!(parsed.host, "WWW.Imos.net");
        assert!(!parsed.has_www);

        let parsed = parse_domain("www.Imos.NET", false).unwrap();
        assert_eq!(parsed.without_www(), Some("Imos.NET"));
    }

    #[test]
    fn test_www_must_be_a_prefix() {
        let parsed = parse_domain("shop.www.imos.net", false).unwrap();
        assert!(!parsed.has_www);

        let parsed = parse_domain("wwwimos.net", false).unwrap();
        assert!(!parsed.has_www);

        // Nothing follows the prefix
        let parsed = parse_domain("www.", false).unwrap();
        assert_eq!(parsed.host, "www.");
        assert!(!parsed.has_www);
        assert_eq!(parsed.without_www(), None);
    }

    #[test]
    fn test_parse_invalid_domains() {
        assert_eq!(parse_domain("", false), Err(DomainError::EmptyDomain));
        assert!(parse_domain("imos net", false).is_err());
        assert!(parse_domain("http://", false).is_err());
    }
}
