//! Redirect configuration file support
//!
//! Primary, secondary and fallback domains plus server settings are defined
//! in a single YAML file (`canonhost.yml` by default).

use anyhow::{Context, Result};
use axum::http::StatusCode;
use canonhost_router::DomainRegistry;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, info};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "canonhost.yml";

/// Redirect statuses accepted for `server.status`
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Redirect configuration file format
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RedirectConfig {
    /// Canonical hosts
    #[serde(default)]
    pub primary: Vec<PrimaryEntry>,

    /// Hosts redirecting to a primary domain
    #[serde(default)]
    pub secondary: Vec<SecondaryEntry>,

    /// Primary domain that receives all unknown hosts
    #[serde(default)]
    pub fallback: Option<String>,

    /// Redirect server settings
    #[serde(default)]
    pub server: ServerSettings,
}

/// A primary domain definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryEntry {
    /// Domain, with or without scheme (e.g., "www.imos.net")
    pub domain: String,

    /// Whether the domain must be served over HTTPS
    #[serde(default)]
    pub ssl: bool,
}

/// A secondary domain definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryEntry {
    /// Domain to redirect from
    pub domain: String,

    /// Host of the primary domain to redirect to (no scheme)
    pub target: String,

    /// Also redirect the non-www variant of a `www.` domain
    #[serde(default = "default_auto_www")]
    pub auto_www: bool,
}

fn default_auto_www() -> bool {
    true
}

/// Redirect server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Status code used for redirects
    #[serde(default = "default_status")]
    pub status: u16,

    /// Treat `X-Forwarded-Proto: https` as a secure request
    #[serde(default = "default_trust_forwarded_proto")]
    pub trust_forwarded_proto: bool,

    /// Status code used when no redirect applies
    #[serde(default = "default_no_redirect_status")]
    pub no_redirect_status: u16,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_status() -> u16 {
    301
}

fn default_trust_forwarded_proto() -> bool {
    true
}

fn default_no_redirect_status() -> u16 {
    404
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            status: default_status(),
            trust_forwarded_proto: default_trust_forwarded_proto(),
            no_redirect_status: default_no_redirect_status(),
        }
    }
}

impl ServerSettings {
    /// Parsed listen address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.bind))
    }

    /// Status code for redirect responses
    pub fn redirect_status(&self) -> Result<StatusCode> {
        if !REDIRECT_STATUSES.contains(&self.status) {
            anyhow::bail!(
                "Invalid redirect status {}: must be one of 301, 302, 303, 307 or 308",
                self.status
            );
        }
        StatusCode::from_u16(self.status)
            .with_context(|| format!("Invalid redirect status: {}", self.status))
    }

    /// Status code for requests that need no redirect
    ///
    /// Informational and redirect codes are rejected, as the response
    /// carries no `Location` header.
    pub fn no_redirect_status(&self) -> Result<StatusCode> {
        let status = StatusCode::from_u16(self.no_redirect_status)
            .with_context(|| format!("Invalid no-redirect status: {}", self.no_redirect_status))?;

        if !(status.is_success() || status.is_client_error() || status.is_server_error()) {
            anyhow::bail!(
                "Invalid no-redirect status {}: must be a 2xx, 4xx or 5xx code",
                self.no_redirect_status
            );
        }
        Ok(status)
    }
}

impl RedirectConfig {
    /// Load config from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::parse(&content)?;
        info!(
            "Loaded {} primary and {} secondary domain(s) from {:?}",
            config.primary.len(),
            config.secondary.len(),
            path
        );
        Ok(config)
    }

    /// Parse config from YAML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: RedirectConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        for entry in &self.primary {
            if entry.domain.trim().is_empty() {
                anyhow::bail!("Primary domain must not be empty");
            }
        }

        for entry in &self.secondary {
            if entry.domain.trim().is_empty() {
                anyhow::bail!("Secondary domain must not be empty");
            }
            if entry.target.trim().is_empty() {
                anyhow::bail!("Secondary domain '{}' has an empty target", entry.domain);
            }
        }

        self.server.bind_addr()?;
        self.server.redirect_status()?;
        self.server.no_redirect_status()?;

        Ok(())
    }

    /// Build the domain registry described by this config
    ///
    /// Primaries are registered first, then secondaries, then the fallback,
    /// so secondaries may reference any primary in the file.
    pub fn build_registry(&self) -> Result<DomainRegistry> {
        let mut registry = DomainRegistry::new();

        for entry in &self.primary {
            registry
                .add_primary_domain(&entry.domain, entry.ssl)
                .with_context(|| format!("Invalid primary domain '{}'", entry.domain))?;
        }

        for entry in &self.secondary {
            registry
                .add_secondary_domain(&entry.domain, &entry.target, entry.auto_www)
                .with_context(|| format!("Invalid secondary domain '{}'", entry.domain))?;
        }

        if let Some(fallback) = &self.fallback {
            registry
                .set_fallback_domain(fallback)
                .with_context(|| format!("Invalid fallback domain '{}'", fallback))?;
        }

        debug!(
            primaries = registry.primary_count(),
            secondaries = registry.secondary_count(),
            fallback = ?registry.fallback_domain(),
            "Domain registry built"
        );

        Ok(registry)
    }

    /// Generate a template config file content
    pub fn template() -> String {
        r#"# canonhost redirect configuration

# Canonical hosts. A www. primary also redirects its bare host.
primary:
  - domain: www.example.com
    ssl: true
  # - domain: shop.example.com
  #   ssl: true

# Hosts that always redirect to a primary domain (target is a bare host).
secondary:
  - domain: example.net
    target: www.example.com
  # - domain: www.shop.example.com
  #   target: shop.example.com
  #   auto_www: false

# Primary domain for every unknown host (optional).
# fallback: www.example.com

server:
  bind: "0.0.0.0:8080"
  status: 301
  trust_forwarded_proto: true
  no_redirect_status: 404
"#
        .to_string()
    }
}
