//! Metric names recorded by the directory layer

/// Authentication calls by outcome (`authenticated` or the error code)
pub const AUTH_OUTCOMES_TOTAL: &str = "dirauth_auth_outcomes_total";

/// Handshake attempts, retries included
pub const SERVER_ATTEMPTS_TOTAL: &str = "dirauth_server_attempts_total";

pub const DISCOVERY_CACHE_HITS_TOTAL: &str = "dirauth_discovery_cache_hits_total";
pub const DISCOVERY_CACHE_MISSES_TOTAL: &str = "dirauth_discovery_cache_misses_total";
