//! Directory server discovery
//!
//! Resolves a domain to an ordered list of candidate directory servers using
//! the `_ldap._tcp.<domain>` SRV records, caching the result per domain.

mod cache;
mod resolver;

pub use cache::{DomainDiscovery, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use resolver::{HickorySrvResolver, SrvRecord, SrvResolver};

/// SRV service name queried for a domain
pub fn srv_service_name(domain: &str) -> String {
    format!("_ldap._tcp.{}", domain)
}
