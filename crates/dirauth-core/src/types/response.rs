//! Authentication response

use serde::{Deserialize, Serialize};

/// HTTP-style status carried in the response body and mirrored on the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthStatus {
    Ok,
    BadRequest,
    Unauthorized,
    InternalServerError,
    ServiceUnavailable,
}

impl AuthStatus {
    pub fn as_u16(&self) -> u16 {
        match self {
            AuthStatus::Ok => 200,
            AuthStatus::BadRequest => 400,
            AuthStatus::Unauthorized => 401,
            AuthStatus::InternalServerError => 500,
            AuthStatus::ServiceUnavailable => 503,
        }
    }
}

/// Machine-readable failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidDomain,
    NoServers,
    UserNotFound,
    InvalidCredentials,
    LdapBindFailed,
    Interrupted,
    AllUnreachable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidDomain => "invalid_domain",
            ErrorCode::NoServers => "no_servers",
            ErrorCode::UserNotFound => "user_not_found",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::LdapBindFailed => "ldap_bind_failed",
            ErrorCode::Interrupted => "interrupted",
            ErrorCode::AllUnreachable => "all_unreachable",
        }
    }

    pub fn status(&self) -> AuthStatus {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::InvalidDomain => AuthStatus::BadRequest,
            ErrorCode::UserNotFound
            | ErrorCode::InvalidCredentials
            | ErrorCode::LdapBindFailed => AuthStatus::Unauthorized,
            ErrorCode::Interrupted => AuthStatus::InternalServerError,
            ErrorCode::NoServers | ErrorCode::AllUnreachable => AuthStatus::ServiceUnavailable,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one authentication call.
///
/// Built only through [`AuthResponse::ok`] and [`AuthResponse::failure`], so either
/// `authenticated` is true or `error` is set, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub status: AuthStatus,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Directory server that verified the credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl AuthResponse {
    pub fn ok(server: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Ok,
            authenticated: true,
            error: None,
            error_message: None,
            server: Some(server.into()),
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status(),
            authenticated: false,
            error: Some(code),
            error_message: Some(message.into()),
            server: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_serialization() {
        let json = serde_json::to_value(AuthResponse::ok("dc1.corp.example:389")).unwrap();

        assert_eq!(json["status"], "OK");
        assert_eq!(json["authenticated"], true);
        assert_eq!(json["server"], "dc1.corp.example:389");
        assert!(json.get("error").is_none());
        assert!(json.get("errorMessage").is_none());
    }

    #[test]
    fn test_failure_serialization() {
        let response = AuthResponse::failure(ErrorCode::UserNotFound, "User not found");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "UNAUTHORIZED");
        assert_eq!(json["authenticated"], false);
        assert_eq!(json["error"], "user_not_found");
        assert_eq!(json["errorMessage"], "User not found");
        assert!(json.get("server").is_none());
    }

    #[test]
    fn test_status_per_code() {
        assert_eq!(ErrorCode::InvalidRequest.status(), AuthStatus::BadRequest);
        assert_eq!(ErrorCode::InvalidDomain.status(), AuthStatus::BadRequest);
        assert_eq!(ErrorCode::NoServers.status(), AuthStatus::ServiceUnavailable);
        assert_eq!(ErrorCode::LdapBindFailed.status(), AuthStatus::Unauthorized);
        assert_eq!(ErrorCode::Interrupted.status(), AuthStatus::InternalServerError);
        assert_eq!(ErrorCode::AllUnreachable.status().as_u16(), 503);
    }

    #[test]
    fn test_error_code_names_match_wire_format() {
        for code in [
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidDomain,
            ErrorCode::NoServers,
            ErrorCode::UserNotFound,
            ErrorCode::InvalidCredentials,
            ErrorCode::LdapBindFailed,
            ErrorCode::Interrupted,
            ErrorCode::AllUnreachable,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
