//! Domain registry for canonical host redirects
//!
//! Holds three things:
//! - Primary domains: canonical hosts with a fixed SSL requirement
//! - Secondary domains: hosts that always redirect to a primary domain
//! - An optional fallback primary domain for unknown hosts
//!
//! Secondary and fallback registrations are validated against the primary
//! domains when they are made, and primaries are never removed, so every
//! reference held by the registry always points at a live primary domain.
//! Build the registry once at startup, then share it read-only (e.g. behind
//! an `Arc`) with request handlers.

use crate::domain::{parse_domain, DomainError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// A canonical host requests should be served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryDomain {
    /// Bare host (e.g., "www.imos.net")
    pub host: String,
    /// Whether the host must be served over HTTPS
    pub requires_ssl: bool,
}

/// A host that always redirects to a primary domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryDomain {
    /// Bare host (e.g., "imosnet.de")
    pub host: String,
    /// Host of the primary domain to redirect to
    pub target: String,
}

/// Domain registry errors
///
/// All of these surface while the registry is being configured. Resolving a
/// redirect never fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Primary domain=({0}) does not exist")]
    MissingPrimaryDomain(String),

    #[error("Secondary domain=({0}) does not exist")]
    MissingSecondaryDomain(String),

    #[error(transparent)]
    InvalidDomain(#[from] DomainError),
}

/// Registry of primary, secondary and fallback domains
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    primary_domains: HashMap<String, PrimaryDomain>,
    secondary_domains: HashMap<String, SecondaryDomain>,
    fallback_domain: Option<String>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a primary domain
    ///
    /// Re-registering an existing host overwrites its SSL requirement. When the
    /// host starts with `www.`, the bare host is registered as a secondary
    /// domain pointing at it (e.g. `imos.net` -> `www.imos.net`).
    pub fn add_primary_domain(
        &mut self,
        domain: &str,
        requires_ssl: bool,
    ) -> Result<&mut Self, RegistryError> {
        let parsed = parse_domain(domain, requires_ssl)?;

        // Validate the derived bare host before touching the registry
        if let Some(without_www) = parsed.without_www() {
            parse_domain(without_www, false)?;
        }

        debug!(
            host = %parsed.host,
            requires_ssl,
            "Registering primary domain"
        );
        self.primary_domains.insert(
            parsed.host.clone(),
            PrimaryDomain {
                host: parsed.host.clone(),
                requires_ssl,
            },
        );

        if let Some(without_www) = parsed.without_www() {
            self.add_secondary_domain(without_www, &parsed.host, true)?;
        }

        Ok(self)
    }

    /// Register a secondary domain redirecting to the primary domain `target`
    ///
    /// `target` is a bare host and must already be registered as a primary
    /// domain. With `auto_add_www` set and a `www.` host, the bare host is
    /// registered as well, pointing at the same target.
    ///
    /// Fails without modifying the registry if `target` is unknown.
    pub fn add_secondary_domain(
        &mut self,
        domain: &str,
        target: &str,
        auto_add_www: bool,
    ) -> Result<&mut Self, RegistryError> {
        let parsed = parse_domain(domain, false)?;

        if !self.is_primary_domain(target) {
            return Err(RegistryError::MissingPrimaryDomain(target.to_string()));
        }

        debug!(host = %parsed.host, primary = target, "Registering secondary domain");
        self.insert_secondary(&parsed.host, target);

        if auto_add_www {
            if let Some(without_www) = parsed.without_www() {
                debug!(
                    host = %without_www,
                    primary = target,
                    "Registering derived non-www secondary domain"
                );
                self.insert_secondary(without_www, target);
            }
        }

        Ok(self)
    }

    fn insert_secondary(&mut self, host: &str, target: &str) {
        self.secondary_domains.insert(
            host.to_string(),
            SecondaryDomain {
                host: host.to_string(),
                target: target.to_string(),
            },
        );
    }

    /// Lookup a primary domain
    pub fn primary_domain(&self, host: &str) -> Result<&PrimaryDomain, RegistryError> {
        self.primary_domains
            .get(host)
            .ok_or_else(|| RegistryError::MissingPrimaryDomain(host.to_string()))
    }

    /// Lookup a secondary domain
    pub fn secondary_domain(&self, host: &str) -> Result<&SecondaryDomain, RegistryError> {
        self.secondary_domains
            .get(host)
            .ok_or_else(|| RegistryError::MissingSecondaryDomain(host.to_string()))
    }

    /// Check if a primary domain exists
    pub fn is_primary_domain(&self, host: &str) -> bool {
        self.primary_domains.contains_key(host)
    }

    /// Check if a secondary domain exists
    pub fn is_secondary_domain(&self, host: &str) -> bool {
        self.secondary_domains.contains_key(host)
    }

    /// All primary domains keyed by host
    pub fn primary_domains(&self) -> &HashMap<String, PrimaryDomain> {
        &self.primary_domains
    }

    /// All secondary domains keyed by host
    pub fn secondary_domains(&self) -> &HashMap<String, SecondaryDomain> {
        &self.secondary_domains
    }

    /// Set the primary domain unknown hosts are redirected to
    ///
    /// Replaces any previously configured fallback.
    pub fn set_fallback_domain(&mut self, host: &str) -> Result<&mut Self, RegistryError> {
        if !self.is_primary_domain(host) {
            return Err(RegistryError::MissingPrimaryDomain(host.to_string()));
        }

        debug!(host, "Setting fallback domain");
        self.fallback_domain = Some(host.to_string());
        Ok(self)
    }

    /// Host of the configured fallback domain
    pub fn fallback_domain(&self) -> Option<&str> {
        self.fallback_domain.as_deref()
    }

    /// Hosts registered both as a primary and as a secondary domain
    ///
    /// The secondary entry always wins at resolution time, so such a primary
    /// is never served directly (and redirects to itself when the secondary
    /// targets it). Returned sorted.
    pub fn conflicting_hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self
            .secondary_domains
            .keys()
            .filter(|host| self.primary_domains.contains_key(host.as_str()))
            .map(String::as_str)
            .collect();
        hosts.sort_unstable();
        hosts
    }

    /// Get number of registered primary domains
    pub fn primary_count(&self) -> usize {
        self.primary_domains.len()
    }

    /// Get number of registered secondary domains
    pub fn secondary_count(&self) -> usize {
        self.secondary_domains.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_www_domain_adds_secondary() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("www.imos.net", true).unwrap();

        assert!(registry.is_primary_domain("www.imos.net"));
        assert!(registry.is_secondary_domain("imos.net"));
        assert_eq!(
            registry.secondary_domain("imos.net").unwrap().target,
            "www.imos.net"
        );
    }

    #[test]
    fn test_primary_without_www_adds_no_secondary() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("shop.imos.net", true).unwrap();

        assert_eq!(registry.primary_count(), 1);
        assert_eq!(registry.secondary_count(), 0);
    }

    #[test]
    fn test_primary_keyed_by_bare_host() {
        let mut registry = DomainRegistry::new();
        registry
            .add_primary_domain("https://shop.imos.net/", true)
            .unwrap();

        let primary = registry.primary_domain("shop.imos.net").unwrap();
        assert_eq!(primary.host, "shop.imos.net");
        assert!(primary.requires_ssl);
    }

    #[test]
    fn test_secondary_keyed_by_bare_host() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("www.imos.net", true).unwrap();
        registry
            .add_secondary_domain("https://imosnet.de/de/index.html", "www.imos.net", true)
            .unwrap();

        let secondary = registry.secondary_domain("imosnet.de").unwrap();
        assert_eq!(secondary.host, "imosnet.de");
        assert_eq!(secondary.target, "www.imos.net");

        // Same entry as the bare registration
        let count = registry.secondary_count();
        registry
            .add_secondary_domain("imosnet.de", "www.imos.net", true)
            .unwrap();
        assert_eq!(registry.secondary_count(), count);
        assert!(!registry.is_secondary_domain("https://imosnet.de/de/index.html"));
    }

    #[test]
    fn test_primary_reregistration_overwrites() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("www.imos.net", true).unwrap();
        registry.add_primary_domain("www.imos.net", false).unwrap();

        assert_eq!(registry.primary_count(), 1);
        assert!(!registry.primary_domain("www.imos.net").unwrap().requires_ssl);
    }

    #[test]
    fn test_secondary_requires_existing_primary() {
        let mut registry = DomainRegistry::new();

        let result = registry.add_secondary_domain("imos.net", "www.imos.net", true);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::MissingPrimaryDomain("www.imos.net".to_string())
        );
        assert_eq!(registry.secondary_count(), 0);
    }

    #[test]
    fn test_secondary_www_auto_adds_bare_host() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("imos.de", false).unwrap();
        registry
            .add_secondary_domain("www.imosnet.de", "imos.de", true)
            .unwrap();

        assert_eq!(registry.secondary_domain("www.imosnet.de").unwrap().target, "imos.de");
        assert_eq!(registry.secondary_domain("imosnet.de").unwrap().target, "imos.de");
    }

    #[test]
    fn test_secondary_www_without_auto_add() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("shop.imos.net", true).unwrap();
        registry
            .add_secondary_domain("www.shop.imos.net", "shop.imos.net", false)
            .unwrap();

        assert!(registry.is_secondary_domain("www.shop.imos.net"));
        assert!(!registry.is_secondary_domain("shop.imos.net"));
        assert_eq!(registry.secondary_count(), 1);
    }

    #[test]
    fn test_registration_chaining() {
        let mut registry = DomainRegistry::new();
        registry
            .add_primary_domain("www.imos.net", true)
            .and_then(|r| r.add_secondary_domain("imosnet.de", "www.imos.net", true))
            .and_then(|r| r.set_fallback_domain("www.imos.net"))
            .unwrap();

        assert_eq!(registry.fallback_domain(), Some("www.imos.net"));
        assert_eq!(registry.secondary_count(), 2);
    }

    #[test]
    fn test_lookup_missing_domains() {
        let registry = DomainRegistry::new();

        assert_eq!(
            registry.primary_domain("imos.net").unwrap_err(),
            RegistryError::MissingPrimaryDomain("imos.net".to_string())
        );
        assert_eq!(
            registry.secondary_domain("imos.net").unwrap_err(),
            RegistryError::MissingSecondaryDomain("imos.net".to_string())
        );
        assert!(!registry.is_primary_domain("imos.net"));
        assert!(!registry.is_secondary_domain("imos.net"));
    }

    #[test]
    fn test_fallback_requires_existing_primary() {
        let mut registry = DomainRegistry::new();
        assert_eq!(registry.fallback_domain(), None);

        let result = registry.set_fallback_domain("www.imos.net");
        assert!(matches!(result, Err(RegistryError::MissingPrimaryDomain(_))));
        assert_eq!(registry.fallback_domain(), None);
    }

    #[test]
    fn test_fallback_overwrites_previous() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("www.imos.net", true).unwrap();
        registry.add_primary_domain("shop.imos.net", true).unwrap();

        registry.set_fallback_domain("www.imos.net").unwrap();
        registry.set_fallback_domain("shop.imos.net").unwrap();
        assert_eq!(registry.fallback_domain(), Some("shop.imos.net"));
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let mut registry = DomainRegistry::new();
        let result = registry.add_primary_domain("", true);

        assert!(matches!(result, Err(RegistryError::InvalidDomain(_))));
        assert_eq!(registry.primary_count(), 0);
    }

    #[test]
    fn test_bare_www_primary_registers_atomically() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("www.", true).unwrap();

        assert_eq!(registry.primary_count(), 1);
        assert_eq!(registry.secondary_count(), 0);
        assert_eq!(registry.resolve_redirect("www.", true, "/"), None);

        let mut registry = DomainRegistry::new();
        assert!(registry.add_primary_domain("https://", true).is_err());
        assert_eq!(registry.primary_count(), 0);
        assert_eq!(registry.secondary_count(), 0);
    }

    #[test]
    fn test_conflicting_hosts() {
        let mut registry = DomainRegistry::new();
        registry.add_primary_domain("blog.imos.de", false).unwrap();
        assert!(registry.conflicting_hosts().is_empty());

        // The derived non-www entry shadows the primary
        registry
            .add_secondary_domain("www.blog.imos.de", "blog.imos.de", true)
            .unwrap();
        assert_eq!(registry.conflicting_hosts(), vec!["blog.imos.de"]);
    }

    #[test]
    fn test_error_messages() {
        let err = RegistryError::MissingPrimaryDomain("www.imos.net".to_string());
        assert_eq!(err.to_string(), "Primary domain=(www.imos.net) does not exist");
    }
}
