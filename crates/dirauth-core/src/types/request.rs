//! Authentication request

use serde::{Deserialize, Serialize};

/// Credentials submitted for verification.
///
/// Fields are optional on the wire so that a body missing them is reported as
/// `invalid_request` rather than rejected by the JSON extractor.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Directory domain; derived from the username when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl AuthRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Domain for this request: the explicit one, otherwise parsed from the username
    pub fn resolve_domain(&self) -> Option<String> {
        if let Some(domain) = &self.domain {
            return Some(domain.clone());
        }
        self.username.as_deref().and_then(domain_from_username)
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("domain", &self.domain)
            .finish()
    }
}

/// Extract the domain from `user@domain` or `DOMAIN\user`, lowercased.
pub fn domain_from_username(username: &str) -> Option<String> {
    let domain = if let Some((_, rest)) = username.split_once('@') {
        rest.split('@').next().unwrap_or_default()
    } else if let Some((domain, _)) = username.split_once('\\') {
        domain
    } else {
        return None;
    };

    if domain.is_empty() {
        None
    } else {
        Some(domain.to_lowercase())
    }
}
