//! canonhost - canonical host redirect server
//!
//! Loads a YAML domain configuration into a
//! [`DomainRegistry`](canonhost_router::DomainRegistry) and serves redirects
//! to each request's canonical URL.

pub mod config;
pub mod server;
