//! Directory client seam
//!
//! The authenticator talks to directory servers through [`DirectoryConnector`]
//! and [`DirectoryConnection`]. [`Ldap3Connector`] is the production
//! implementation; every connection it opens is owned by a single attempt and
//! closed before the attempt returns.

use std::time::Duration;

use async_trait::async_trait;
use dirauth_core::config::LdapSettings;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use tracing::debug;

use crate::address::ServerAddress;
use crate::diagnostic::ResultCode;
use crate::error::{DirectoryError, DirectoryResult};

/// Attributes requested when locating a user entry
pub const USER_SEARCH_ATTRIBUTES: [&str; 2] = ["distinguishedName", "dn"];

/// Result of a bind that completed at the protocol level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindResult {
    pub code: ResultCode,
    pub diagnostic: String,
}

impl BindResult {
    pub fn success() -> Self {
        Self {
            code: ResultCode::SUCCESS,
            diagnostic: String::new(),
        }
    }

    pub fn failure(code: ResultCode, diagnostic: impl Into<String>) -> Self {
        Self {
            code,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

/// Opens connections to directory servers
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn connect(&self, server: &ServerAddress) -> DirectoryResult<Box<dyn DirectoryConnection>>;
}

/// One open directory connection
#[async_trait]
pub trait DirectoryConnection: Send {
    /// Simple bind. A negative result code is returned, not raised.
    async fn simple_bind(&mut self, dn: &str, password: &str) -> DirectoryResult<BindResult>;

    /// Subtree search under `base`, returning the DNs of matching entries in server order
    async fn search_dns(&mut self, base: &str, filter: &str) -> DirectoryResult<Vec<String>>;

    /// Unbind and drop the connection
    async fn close(&mut self);
}

/// [`DirectoryConnector`] backed by `ldap3`
#[derive(Debug, Clone)]
pub struct Ldap3Connector {
    connect_timeout: Duration,
    read_timeout: Duration,
    start_tls: bool,
}

impl Ldap3Connector {
    pub fn from_settings(settings: &LdapSettings) -> Self {
        Self {
            connect_timeout: Duration::from_millis(settings.connect_timeout_millis),
            read_timeout: Duration::from_millis(settings.read_timeout_millis),
            start_tls: settings.start_tls,
        }
    }
}

#[async_trait]
impl DirectoryConnector for Ldap3Connector {
    async fn connect(&self, server: &ServerAddress) -> DirectoryResult<Box<dyn DirectoryConnection>> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.connect_timeout)
            .set_starttls(self.start_tls);

        let url = server.url();
        debug!("Connecting to LDAP server: {}", url);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| classify(e, Phase::Connect))?;

        ldap3::drive!(conn);

        Ok(Box::new(Ldap3Connection {
            ldap,
            read_timeout: self.read_timeout,
        }))
    }
}

struct Ldap3Connection {
    ldap: Ldap,
    read_timeout: Duration,
}

#[async_trait]
impl DirectoryConnection for Ldap3Connection {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> DirectoryResult<BindResult> {
        let result = self
            .ldap
            .with_timeout(self.read_timeout)
            .simple_bind(dn, password)
            .await
            .map_err(|e| classify(e, Phase::Operation))?;

        Ok(BindResult {
            code: ResultCode(result.rc),
            diagnostic: result.text,
        })
    }

    async fn search_dns(&mut self, base: &str, filter: &str) -> DirectoryResult<Vec<String>> {
        let (entries, _res) = self
            .ldap
            .with_timeout(self.read_timeout)
            .search(base, Scope::Subtree, filter, USER_SEARCH_ATTRIBUTES.to_vec())
            .await
            .map_err(|e| classify(e, Phase::Operation))?
            .success()
            .map_err(|e| classify(e, Phase::Operation))?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_ref())
            .map(|entry| SearchEntry::construct(entry).dn)
            .collect())
    }

    async fn close(&mut self) {
        let _ = self.ldap.unbind().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connect,
    Operation,
}

/// Map an `ldap3` error onto a result code.
///
/// Transport failures become the client-side codes (`connect error`,
/// `server down`, `timeout`). Anything else the client rejects locally
/// (filter parsing, TLS setup, URL or adapter errors) is a `local error`,
/// so every failure short of an authentication result stays retryable.
fn classify(err: LdapError, phase: Phase) -> DirectoryError {
    match err {
        LdapError::LdapResult { result } => {
            DirectoryError::new(ResultCode(result.rc), result.text)
        }
        LdapError::Timeout { .. } => DirectoryError::new(ResultCode::TIMEOUT, err.to_string()),
        LdapError::Io { source } => {
            let code = match phase {
                Phase::Connect => ResultCode::CONNECT_ERROR,
                Phase::Operation => ResultCode::SERVER_DOWN,
            };
            DirectoryError::new(code, source.to_string())
        }
        // The connection task is gone
        LdapError::EndOfStream
        | LdapError::OpSend { .. }
        | LdapError::ResultRecv { .. }
        | LdapError::IdScrubSend { .. }
        | LdapError::MiscSend { .. } => DirectoryError::new(ResultCode::SERVER_DOWN, err.to_string()),
        LdapError::FilterParsing => DirectoryError::new(ResultCode::FILTER_ERROR, err.to_string()),
        other => DirectoryError::new(ResultCode::LOCAL_ERROR, other.to_string()),
    }
}
