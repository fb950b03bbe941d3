//! Per-domain server list cache

use std::sync::Arc;
use std::time::Duration;

use dirauth_core::config::DiscoverySettings;
use metrics::counter;
use moka::future::Cache;
use tracing::{debug, warn};

use super::resolver::SrvResolver;
use super::srv_service_name;
use crate::names::{DISCOVERY_CACHE_HITS_TOTAL, DISCOVERY_CACHE_MISSES_TOTAL};

/// Default time-to-live of a discovered server list
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached domains
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Resolves domains to ordered `host[:port]` server lists.
///
/// Entries are keyed by the lowercased domain and are never empty: when DNS
/// yields nothing usable the domain itself is cached as a pseudo-server.
/// Concurrent misses for the same domain share a single resolution.
#[derive(Clone)]
pub struct DomainDiscovery {
    cache: Cache<String, Arc<Vec<String>>>,
    resolver: Arc<dyn SrvResolver>,
}

impl DomainDiscovery {
    pub fn new(resolver: Arc<dyn SrvResolver>) -> Self {
        Self::with_policy(resolver, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    pub fn with_policy(resolver: Arc<dyn SrvResolver>, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, resolver }
    }

    pub fn from_settings(resolver: Arc<dyn SrvResolver>, settings: &DiscoverySettings) -> Self {
        Self::with_policy(
            resolver,
            settings.cache_capacity,
            Duration::from_secs(settings.cache_ttl_secs),
        )
    }

    /// Ordered server list for `domain`. Empty only for a blank domain, which is not cached.
    pub async fn resolve(&self, domain: &str) -> Arc<Vec<String>> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Arc::new(Vec::new());
        }

        let key = domain.to_lowercase();
        if let Some(servers) = self.cache.get(&key).await {
            debug!("Using cached LDAP servers for {}", key);
            counter!(DISCOVERY_CACHE_HITS_TOTAL).increment(1);
            return servers;
        }

        counter!(DISCOVERY_CACHE_MISSES_TOTAL).increment(1);
        self.cache
            .get_with(key.clone(), async {
                Arc::new(discover(self.resolver.as_ref(), &key).await)
            })
            .await
    }

    /// Drop the cached list for one domain
    pub async fn invalidate(&self, domain: &str) {
        self.cache.invalidate(&domain.trim().to_lowercase()).await;
    }

    /// Drop every cached list
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

async fn discover(resolver: &dyn SrvResolver, domain: &str) -> Vec<String> {
    let query = srv_service_name(domain);

    let mut servers: Vec<String> = match resolver.lookup_srv(&query).await {
        Ok(records) => records.iter().filter_map(|r| r.server_entry()).collect(),
        Err(e) => {
            warn!("DNS SRV lookup failed for {}: {}", query, e);
            Vec::new()
        }
    };

    if servers.is_empty() {
        debug!("No SRV records found for {}, falling back to the domain itself", domain);
        servers.push(domain.to_string());
    } else {
        debug!("Discovered {} LDAP servers for {}", servers.len(), domain);
    }

    servers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SrvRecord;
    use crate::error::DiscoveryError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedResolver {
        answer: Result<Vec<SrvRecord>, DiscoveryError>,
        calls: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    impl ScriptedResolver {
        fn answering(records: Vec<SrvRecord>) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(records),
                calls: AtomicUsize::new(0),
                names: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: Err(DiscoveryError::Lookup {
                    name: "_ldap._tcp.corp.example".to_string(),
                    message: "SERVFAIL".to_string(),
                }),
                calls: AtomicUsize::new(0),
                names: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SrvResolver for ScriptedResolver {
        async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.names.lock().push(name.to_string());
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn test_resolves_srv_records_in_resolver_order() {
        let resolver = ScriptedResolver::answering(vec![
            SrvRecord::new(10, 50, 389, "dc2.corp.example."),
            SrvRecord::new(0, 100, 3268, "dc1.corp.example."),
        ]);
        let discovery = DomainDiscovery::new(resolver.clone());

        let servers = discovery.resolve("corp.example").await;

        assert_eq!(
            servers.as_slice(),
            ["dc2.corp.example:389", "dc1.corp.example:3268"]
        );
        assert_eq!(resolver.names.lock().as_slice(), ["_ldap._tcp.corp.example"]);
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_domain() {
        let resolver = ScriptedResolver::failing();
        let discovery = DomainDiscovery::new(resolver.clone());

        let servers = discovery.resolve("corp.example").await;
        assert_eq!(servers.as_slice(), ["corp.example"]);

        // the fallback is cached too
        let again = discovery.resolve("corp.example").await;
        assert_eq!(again.as_slice(), ["corp.example"]);
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_answer_falls_back_to_domain() {
        let resolver = ScriptedResolver::answering(vec![SrvRecord::new(0, 0, 389, ".")]);
        let discovery = DomainDiscovery::new(resolver);

        let servers = discovery.resolve("corp.example").await;
        assert_eq!(servers.as_slice(), ["corp.example"]);
    }

    #[tokio::test]
    async fn test_cache_key_is_lowercased() {
        let resolver =
            ScriptedResolver::answering(vec![SrvRecord::new(0, 100, 389, "dc1.corp.example.")]);
        let discovery = DomainDiscovery::new(resolver.clone());

        let first = discovery.resolve("CORP.Example").await;
        let second = discovery.resolve("corp.example").await;

        assert_eq!(first, second);
        assert_eq!(resolver.calls(), 1);
        assert_eq!(resolver.names.lock().as_slice(), ["_ldap._tcp.corp.example"]);
    }

    #[tokio::test]
    async fn test_blank_domain_is_not_resolved() {
        let resolver = ScriptedResolver::answering(vec![]);
        let discovery = DomainDiscovery::new(resolver.clone());

        assert!(discovery.resolve("").await.is_empty());
        assert!(discovery.resolve("   ").await.is_empty());
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let resolver =
            ScriptedResolver::answering(vec![SrvRecord::new(0, 100, 389, "dc1.corp.example.")]);
        let discovery =
            DomainDiscovery::with_policy(resolver.clone(), 10, Duration::from_millis(100));

        discovery.resolve("corp.example").await;
        discovery.resolve("corp.example").await;
        assert_eq!(resolver.calls(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;

        discovery.resolve("corp.example").await;
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_lookup() {
        let resolver =
            ScriptedResolver::answering(vec![SrvRecord::new(0, 100, 389, "dc1.corp.example.")]);
        let discovery = DomainDiscovery::new(resolver.clone());

        discovery.resolve("corp.example").await;
        discovery.invalidate("Corp.Example").await;
        discovery.resolve("corp.example").await;

        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let resolver =
            ScriptedResolver::answering(vec![SrvRecord::new(0, 100, 389, "dc1.corp.example.")]);
        let discovery = DomainDiscovery::new(resolver.clone());

        discovery.resolve("corp.example").await;
        discovery.resolve("lab.example").await;
        discovery.cache.run_pending_tasks().await;
        assert_eq!(discovery.entry_count(), 2);

        discovery.invalidate_all();
        discovery.resolve("corp.example").await;
        discovery.resolve("lab.example").await;

        assert_eq!(resolver.calls(), 4);
    }

    #[tokio::test]
    async fn test_capacity_bounds_cached_domains() {
        let resolver =
            ScriptedResolver::answering(vec![SrvRecord::new(0, 100, 389, "dc1.corp.example.")]);
        let discovery =
            DomainDiscovery::with_policy(resolver.clone(), 2, Duration::from_secs(3600));

        for domain in ["a.example", "b.example", "c.example"] {
            discovery.resolve(domain).await;
            discovery.cache.run_pending_tasks().await;
        }
        assert!(discovery.entry_count() <= 2);
        assert_eq!(resolver.calls(), 3);

        // At least one domain was dropped and has to be looked up again
        for domain in ["a.example", "b.example", "c.example"] {
            discovery.resolve(domain).await;
        }
        assert!(resolver.calls() > 3);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_lookup() {
        let resolver =
            ScriptedResolver::answering(vec![SrvRecord::new(0, 100, 389, "dc1.corp.example.")]);
        let discovery = DomainDiscovery::new(resolver.clone());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let discovery = discovery.clone();
                tokio::spawn(async move { discovery.resolve("corp.example").await })
            })
            .collect();

        for task in tasks {
            let servers = task.await.unwrap();
            assert_eq!(servers.as_slice(), ["dc1.corp.example:389"]);
        }
        assert_eq!(resolver.calls(), 1);
    }
}
