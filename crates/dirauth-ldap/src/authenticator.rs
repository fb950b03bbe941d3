//! Authentication orchestration
//!
//! Handles:
//! - Request validation and domain derivation
//! - Server discovery through [`DomainDiscovery`]
//! - The bind/search/bind handshake against each discovered server in order
//! - Per-server retries with exponential backoff on transient failures
//!
//! Authentication-category failures (unknown user, bad credentials, account
//! state) end the whole call: they are never retried and never cause another
//! server to be tried. Every other directory failure, client-side ones
//! included, is retried on the same server before moving on.

use std::sync::Arc;

use dirauth_core::config::LdapSettings;
use dirauth_core::{AuthRequest, AuthResponse, ErrorCode};
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::address::ServerAddress;
use crate::diagnostic::{describe, ResultCode};
use crate::directory::{DirectoryConnection, DirectoryConnector};
use crate::discovery::DomainDiscovery;
use crate::error::{DirectoryError, DirectoryResult};
use crate::filter::build_user_filter;
use crate::names::{AUTH_OUTCOMES_TOTAL, SERVER_ATTEMPTS_TOTAL};
use crate::retry::{backoff_delay, Backoff, RetryPolicy};

/// Outcome of one handshake attempt against one server
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Credentials verified
    Authenticated,
    /// Terminal failure, returned to the caller as is
    Rejected(AuthResponse),
    /// Any other directory failure; retried, then the next server is tried
    Transient(DirectoryError),
}

/// What the handshake observed when no error was raised
#[derive(Debug)]
enum Handshake {
    Verified,
    UserNotFound,
    BindRejected { code: ResultCode, diagnostic: String },
}

/// Verifies username/password pairs against discovered directory servers
pub struct Authenticator {
    discovery: DomainDiscovery,
    connector: Arc<dyn DirectoryConnector>,
    settings: LdapSettings,
    retry: RetryPolicy,
}

impl Authenticator {
    pub fn new(
        discovery: DomainDiscovery,
        connector: Arc<dyn DirectoryConnector>,
        settings: LdapSettings,
    ) -> Self {
        Self {
            discovery,
            connector,
            settings,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn discovery(&self) -> &DomainDiscovery {
        &self.discovery
    }

    /// Authenticate a request. Never fails; every outcome is an [`AuthResponse`].
    pub async fn authenticate(&self, request: &AuthRequest) -> AuthResponse {
        self.authenticate_with_cancel(request, None).await
    }

    /// Like [`Authenticator::authenticate`], but a pending backoff ends with
    /// `interrupted` once `cancel` fires.
    pub async fn authenticate_with_cancel(
        &self,
        request: &AuthRequest,
        cancel: Option<&CancellationToken>,
    ) -> AuthResponse {
        let response = self.run(request, cancel).await;

        let outcome = match response.error {
            Some(code) => code.as_str(),
            None => "authenticated",
        };
        counter!(AUTH_OUTCOMES_TOTAL, "outcome" => outcome).increment(1);

        response
    }

    async fn run(&self, request: &AuthRequest, cancel: Option<&CancellationToken>) -> AuthResponse {
        let (username, password) = match (&request.username, &request.password) {
            (Some(username), Some(password)) => (username.as_str(), password.as_str()),
            _ => {
                return AuthResponse::failure(
                    ErrorCode::InvalidRequest,
                    "username and password required",
                )
            }
        };

        let Some(domain) = request.resolve_domain() else {
            return AuthResponse::failure(ErrorCode::InvalidDomain, "could not determine domain");
        };

        let servers = self.discovery.resolve(&domain).await;
        if servers.is_empty() {
            return AuthResponse::failure(
                ErrorCode::NoServers,
                format!("No LDAP servers discovered for domain: {}", domain),
            );
        }

        for server in servers.iter() {
            debug!("Trying LDAP server: {}", server);

            let address = match server.parse::<ServerAddress>() {
                Ok(address) => address,
                Err(e) => {
                    error!("Skipping unusable LDAP server entry {}: {}", server, e);
                    continue;
                }
            };

            let mut failures = 0u32;
            loop {
                counter!(SERVER_ATTEMPTS_TOTAL).increment(1);

                match self.attempt(&address, username, password).await {
                    AttemptOutcome::Authenticated => {
                        info!(server = %server, "User authenticated");
                        return AuthResponse::ok(server.as_str());
                    }
                    AttemptOutcome::Rejected(response) => return response,
                    AttemptOutcome::Transient(e) => {
                        failures += 1;
                        warn!("LDAP error on {} attempt {}: {}", server, failures, e);

                        if !self.retry.allows_retry(failures) {
                            info!("max retries reached for {}, moving to next server", server);
                            break;
                        }

                        let delay = self.retry.backoff(failures);
                        if backoff_delay(delay, cancel).await == Backoff::Cancelled {
                            return AuthResponse::failure(
                                ErrorCode::Interrupted,
                                "Interrupted during retry backoff",
                            );
                        }
                    }
                }
            }
        }

        AuthResponse::failure(
            ErrorCode::AllUnreachable,
            "All LDAP servers unreachable or failed",
        )
    }

    /// One bind/search/bind handshake, classified for the retry loop
    pub async fn attempt(
        &self,
        address: &ServerAddress,
        username: &str,
        password: &str,
    ) -> AttemptOutcome {
        match self.handshake(address, username, password).await {
            Ok(Handshake::Verified) => AttemptOutcome::Authenticated,
            Ok(Handshake::UserNotFound) => AttemptOutcome::Rejected(AuthResponse::failure(
                ErrorCode::UserNotFound,
                "User not found",
            )),
            Ok(Handshake::BindRejected { code, diagnostic }) => AttemptOutcome::Rejected(
                AuthResponse::failure(ErrorCode::InvalidCredentials, describe(code, &diagnostic)),
            ),
            Err(e) if e.code.is_authentication_failure() => AttemptOutcome::Rejected(
                AuthResponse::failure(ErrorCode::LdapBindFailed, describe(e.code, &e.message)),
            ),
            Err(e) => AttemptOutcome::Transient(e),
        }
    }

    async fn handshake(
        &self,
        address: &ServerAddress,
        username: &str,
        password: &str,
    ) -> DirectoryResult<Handshake> {
        let mut conn = self.connector.connect(address).await?;
        let result = self.search_and_verify(conn.as_mut(), address, username, password).await;
        conn.close().await;
        result
    }

    async fn search_and_verify(
        &self,
        conn: &mut dyn DirectoryConnection,
        address: &ServerAddress,
        username: &str,
        password: &str,
    ) -> DirectoryResult<Handshake> {
        let service_bind = conn
            .simple_bind(&self.settings.service_bind_dn, &self.settings.service_bind_password)
            .await?;
        if !service_bind.is_success() {
            warn!("Service bind failed on {}: {}", address, service_bind.diagnostic);
            return Err(DirectoryError::new(service_bind.code, service_bind.diagnostic));
        }

        let filter = build_user_filter(&self.settings.user_search_filter, username);
        debug!("Searching for user with filter: {}", filter);

        let dns = conn.search_dns(&self.settings.base_dn, &filter).await?;
        let Some(user_dn) = dns.into_iter().next() else {
            return Ok(Handshake::UserNotFound);
        };
        debug!("Found user DN: {}", user_dn);

        let mut user_conn = self.connector.connect(address).await?;
        let user_bind = user_conn.simple_bind(&user_dn, password).await;
        user_conn.close().await;

        let user_bind = user_bind?;
        if user_bind.is_success() {
            Ok(Handshake::Verified)
        } else {
            Ok(Handshake::BindRejected {
                code: user_bind.code,
                diagnostic: user_bind.diagnostic,
            })
        }
    }
}
