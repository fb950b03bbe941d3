//! Directory authentication for Dirauth
//!
//! Discovers the directory servers of a domain through DNS SRV records and
//! verifies credentials against them with a bind/search/bind handshake.

pub mod address;
pub mod authenticator;
pub mod diagnostic;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod names;
pub mod retry;

pub use address::ServerAddress;
pub use authenticator::{AttemptOutcome, Authenticator};
pub use diagnostic::{describe, ResultCode};
pub use directory::{BindResult, DirectoryConnection, DirectoryConnector, Ldap3Connector};
pub use discovery::{DomainDiscovery, HickorySrvResolver, SrvRecord, SrvResolver};
pub use error::{DirectoryError, DirectoryResult, DiscoveryError};
pub use filter::{build_user_filter, escape_filter_value};
pub use retry::{RetryPolicy, MAX_RETRIES_PER_SERVER, BACKOFF_BASE_MILLIS};
