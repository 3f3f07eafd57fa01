//! Canonical host redirect logic
//!
//! Decides, for an incoming request's host, scheme and request-target, whether
//! the request should be redirected to a canonical ("primary") host and builds
//! the exact target URL.
//!
//! Domains are matched by exact host string. Primary domains carry their SSL
//! requirement, secondary domains always redirect to a primary, and an optional
//! fallback primary catches every unknown host.
//!
//! ```
//! use canonhost_router::DomainRegistry;
//!
//! let mut registry = DomainRegistry::new();
//! registry.add_primary_domain("www.imos.net", true).unwrap();
//!
//! assert_eq!(
//!     registry.resolve_redirect("imos.net", false, "/de/test.html?x=y"),
//!     Some("https://www.imos.net/de/test.html?x=y".to_string())
//! );
//! assert_eq!(registry.resolve_redirect("www.imos.net", true, "/"), None);
//! ```

pub mod domain;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod url;

pub use domain::{parse_domain, DomainError, ParsedDomain};
pub use registry::{DomainRegistry, PrimaryDomain, RegistryError, SecondaryDomain};
pub use request::{RequestError, RequestFacts};
pub use resolver::resolve_redirect;
pub use url::build_url;
