//! SRV record resolution

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, warn};

use crate::error::DiscoveryError;

/// One SRV answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

impl SrvRecord {
    pub fn new(priority: u16, weight: u16, port: u16, target: impl Into<String>) -> Self {
        Self {
            priority,
            weight,
            port,
            target: target.into(),
        }
    }

    /// `host:port` server entry, with the root dot stripped from the target
    pub fn server_entry(&self) -> Option<String> {
        let host = self.target.strip_suffix('.').unwrap_or(&self.target);
        if host.is_empty() {
            return None;
        }
        Some(format!("{}:{}", host, self.port))
    }
}

/// Source of SRV records
#[async_trait]
pub trait SrvResolver: Send + Sync {
    /// Look up SRV records for `name`, in the order the resolver returned them.
    /// A name without records yields an empty list.
    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DiscoveryError>;
}

/// DNS resolver backed by hickory
pub struct HickorySrvResolver {
    resolver: TokioAsyncResolver,
}

impl HickorySrvResolver {
    /// Use the host's resolver configuration, or public defaults when it cannot be read
    pub fn from_system_conf() -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!("Failed to read system resolver config, using defaults: {}", e);
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self { resolver }
    }
}

#[async_trait]
impl SrvResolver for HickorySrvResolver {
    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DiscoveryError> {
        match self.resolver.srv_lookup(name).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|srv| {
                    SrvRecord::new(
                        srv.priority(),
                        srv.weight(),
                        srv.port(),
                        srv.target().to_utf8(),
                    )
                })
                .collect()),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                debug!("No SRV records for {}", name);
                Ok(Vec::new())
            }
            Err(e) => Err(DiscoveryError::Lookup {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_entry_strips_root_dot() {
        let record = SrvRecord::new(0, 100, 389, "dc1.corp.example.");
        assert_eq!(record.server_entry().as_deref(), Some("dc1.corp.example:389"));

        let record = SrvRecord::new(0, 100, 3268, "dc2.corp.example");
        assert_eq!(record.server_entry().as_deref(), Some("dc2.corp.example:3268"));
    }

    #[test]
    fn test_root_target_is_unusable() {
        // "." means the service is decidedly not available
        assert_eq!(SrvRecord::new(0, 0, 389, ".").server_entry(), None);
    }
}
