//! Configuration for Dirauth

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirAuthConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ldap: LdapSettings,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirAuthConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::ConfigRead(format!("{}: {}", path, e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::ConfigParse(e.to_string()))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("DIRAUTH_BIND_ADDRESS") {
            config.server.bind_address = addr;
        }
        if let Ok(port) = std::env::var("DIRAUTH_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Ok(level) = std::env::var("DIRAUTH_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Directory settings from environment
        if let Ok(dn) = std::env::var("DIRAUTH_LDAP_SERVICE_BIND_DN") {
            config.ldap.service_bind_dn = dn;
        }
        if let Ok(password) = std::env::var("DIRAUTH_LDAP_SERVICE_BIND_PASSWORD") {
            config.ldap.service_bind_password = password;
        }
        if let Ok(base) = std::env::var("DIRAUTH_LDAP_BASE_DN") {
            config.ldap.base_dn = base;
        }
        if let Ok(filter) = std::env::var("DIRAUTH_LDAP_SEARCH_FILTER") {
            config.ldap.user_search_filter = filter;
        }
        if let Ok(ms) = std::env::var("DIRAUTH_LDAP_CONNECT_TIMEOUT_MILLIS") {
            if let Ok(ms) = ms.parse() {
                config.ldap.connect_timeout_millis = ms;
            }
        }
        if let Ok(ms) = std::env::var("DIRAUTH_LDAP_READ_TIMEOUT_MILLIS") {
            if let Ok(ms) = ms.parse() {
                config.ldap.read_timeout_millis = ms;
            }
        }
        if std::env::var("DIRAUTH_LDAP_START_TLS").map(|v| v == "true").unwrap_or(false) {
            config.ldap.start_tls = true;
        }

        if let Ok(ttl) = std::env::var("DIRAUTH_DISCOVERY_CACHE_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                config.discovery.cache_ttl_secs = ttl;
            }
        }

        config
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.ldap.validate()?;
        self.discovery.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Directory connection and search settings
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapSettings {
    /// Service account used to search for the user DN
    /// Example: "cn=svc,dc=example,dc=com"
    #[serde(default = "default_service_bind_dn")]
    pub service_bind_dn: String,

    /// Service account password
    #[serde(default = "default_service_bind_password")]
    pub service_bind_password: String,

    /// Base DN for user searches
    #[serde(default = "default_base_dn")]
    pub base_dn: String,

    /// User search filter, `{0}` is replaced by the escaped username
    /// Example: "(sAMAccountName={0})" or "(uid={0})"
    #[serde(default = "default_user_search_filter")]
    pub user_search_filter: String,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_millis: u64,

    /// Per-operation response timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_millis: u64,

    /// Upgrade plain connections with STARTTLS
    #[serde(default)]
    pub start_tls: bool,
}

fn default_service_bind_dn() -> String {
    "cn=svc,dc=example,dc=com".to_string()
}

fn default_service_bind_password() -> String {
    "change-this".to_string()
}

fn default_base_dn() -> String {
    "dc=example,dc=com".to_string()
}

fn default_user_search_filter() -> String {
    "(sAMAccountName={0})".to_string()
}

fn default_connect_timeout() -> u64 {
    3000
}

fn default_read_timeout() -> u64 {
    5000
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            service_bind_dn: default_service_bind_dn(),
            service_bind_password: default_service_bind_password(),
            base_dn: default_base_dn(),
            user_search_filter: default_user_search_filter(),
            connect_timeout_millis: default_connect_timeout(),
            read_timeout_millis: default_read_timeout(),
            start_tls: false,
        }
    }
}

// Keeps the service password out of logs
impl std::fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSettings")
            .field("service_bind_dn", &self.service_bind_dn)
            .field("service_bind_password", &"***")
            .field("base_dn", &self.base_dn)
            .field("user_search_filter", &self.user_search_filter)
            .field("connect_timeout_millis", &self.connect_timeout_millis)
            .field("read_timeout_millis", &self.read_timeout_millis)
            .field("start_tls", &self.start_tls)
            .finish()
    }
}

impl LdapSettings {
    pub fn validate(&self) -> crate::Result<()> {
        if self.service_bind_dn.trim().is_empty() {
            return Err(crate::Error::InvalidConfig(
                "ldap.service_bind_dn is required".into(),
            ));
        }
        if self.base_dn.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("ldap.base_dn is required".into()));
        }
        if !self.user_search_filter.contains("{0}") {
            return Err(crate::Error::InvalidConfig(
                "ldap.user_search_filter must contain the {0} placeholder".into(),
            ));
        }
        if self.connect_timeout_millis == 0 || self.read_timeout_millis == 0 {
            return Err(crate::Error::InvalidConfig(
                "ldap timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Domain discovery cache policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// Time-to-live for a discovered server list
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached domains
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_cache_capacity() -> u64 {
    1000
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl DiscoverySettings {
    pub fn validate(&self) -> crate::Result<()> {
        if self.cache_capacity == 0 {
            return Err(crate::Error::InvalidConfig(
                "discovery.cache_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Per-server retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries beyond the first attempt before moving to the next server
    #[serde(default = "default_max_retries")]
    pub max_retries_per_server: u32,

    /// First backoff delay, doubled on every further retry
    #[serde(default = "default_backoff_base")]
    pub backoff_base_millis: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base() -> u64 {
    200
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries_per_server: default_max_retries(),
            backoff_base_millis: default_backoff_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
