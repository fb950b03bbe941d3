//! Directory and discovery error types

use crate::diagnostic::ResultCode;
use thiserror::Error;

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Failure raised by a directory connection.
///
/// Carries the result code reported by the server, or the client-side code
/// (`server down`, `timeout`, `local error`, ...) for failures the client
/// library detected on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DirectoryError {
    pub code: ResultCode,
    pub message: String,
}

impl DirectoryError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failures while resolving directory servers through DNS
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    #[error("DNS lookup for {name} failed: {message}")]
    Lookup { name: String, message: String },
}
