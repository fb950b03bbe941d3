//! Dirauth Core Library
//!
//! Configuration, error and wire types shared by the directory authentication service.

pub mod config;
pub mod error;
pub mod types;

pub use config::DirAuthConfig;
pub use error::{Error, Result};
pub use types::{AuthRequest, AuthResponse, AuthStatus, ErrorCode};

/// Dirauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default LDAP port used when a server address carries none
pub const DEFAULT_LDAP_PORT: u16 = 389;
