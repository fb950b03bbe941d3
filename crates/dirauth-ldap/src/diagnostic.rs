//! Result codes and diagnostic translation
//!
//! Directory servers report failures as a numeric result code plus free-form
//! diagnostic text. Active Directory embeds a `data <subcode>` marker in that
//! text which identifies the account condition behind an invalid-credentials
//! result. [`describe`] turns both into stable, caller-facing phrases.

use std::fmt;

/// Numeric LDAP result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const OPERATIONS_ERROR: ResultCode = ResultCode(1);
    pub const PROTOCOL_ERROR: ResultCode = ResultCode(2);
    pub const TIME_LIMIT_EXCEEDED: ResultCode = ResultCode(3);
    pub const NO_SUCH_OBJECT: ResultCode = ResultCode(32);
    pub const INVALID_CREDENTIALS: ResultCode = ResultCode(49);
    pub const INSUFFICIENT_ACCESS_RIGHTS: ResultCode = ResultCode(50);
    pub const BUSY: ResultCode = ResultCode(51);
    pub const UNAVAILABLE: ResultCode = ResultCode(52);
    pub const UNWILLING_TO_PERFORM: ResultCode = ResultCode(53);
    pub const OTHER: ResultCode = ResultCode(80);
    // Client-side codes
    pub const SERVER_DOWN: ResultCode = ResultCode(81);
    pub const LOCAL_ERROR: ResultCode = ResultCode(82);
    pub const TIMEOUT: ResultCode = ResultCode(85);
    pub const FILTER_ERROR: ResultCode = ResultCode(87);
    pub const CONNECT_ERROR: ResultCode = ResultCode(91);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// Codes that describe the identity or its credentials rather than the
    /// infrastructure. These are never retried.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            *self,
            Self::INVALID_CREDENTIALS | Self::INSUFFICIENT_ACCESS_RIGHTS | Self::NO_SUCH_OBJECT
        )
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "success",
            1 => "operations error",
            2 => "protocol error",
            3 => "time limit exceeded",
            32 => "no such object",
            49 => "invalid credentials",
            50 => "insufficient access rights",
            51 => "busy",
            52 => "unavailable",
            53 => "unwilling to perform",
            80 => "other",
            81 => "server down",
            82 => "local error",
            85 => "timeout",
            87 => "filter error",
            91 => "connect error",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

/// Translate a result code and its diagnostic text into a human-readable message
pub fn describe(code: ResultCode, diagnostic: &str) -> String {
    match code {
        ResultCode::INVALID_CREDENTIALS => match active_directory_reason(diagnostic) {
            Some(reason) => format!("Invalid credentials: {}", reason),
            None => "Invalid credentials".to_string(),
        },
        ResultCode::CONNECT_ERROR | ResultCode::SERVER_DOWN => {
            format!("LDAP server unreachable: {}", diagnostic)
        }
        ResultCode::NO_SUCH_OBJECT => "User not found".to_string(),
        _ => format!("{} - {}", code, diagnostic),
    }
}

const AD_SUBCODES: &[(&str, &str)] = &[
    ("data 525", "user not found (525)"),
    ("data 52e", "invalid credentials (52e)"),
    ("data 530", "not permitted to logon at this time (530)"),
    ("data 531", "not permitted to logon at this workstation (531)"),
    ("data 532", "password expired (532)"),
    ("data 533", "account disabled (533)"),
    ("data 701", "account expired (701)"),
    ("data 775", "account locked (775)"),
];

/// Stable phrase for an Active Directory subcode, or the raw text when none matches.
/// `None` only for empty diagnostics.
fn active_directory_reason(diagnostic: &str) -> Option<String> {
    if diagnostic.is_empty() {
        return None;
    }

    let lower = diagnostic.to_lowercase();
    let phrase = AD_SUBCODES
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, phrase)| phrase.to_string());

    Some(phrase.unwrap_or_else(|| diagnostic.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AD_532: &str = "80090308: LdapErr: DSID-0C09044E, comment: AcceptSecurityContext error, data 532, v2580";

    #[test]
    fn test_password_expired() {
        let message = describe(ResultCode::INVALID_CREDENTIALS, AD_532);
        assert_eq!(message, "Invalid credentials: password expired (532)");
    }

    #[test]
    fn test_all_subcodes() {
        let cases = [
            ("data 525", "user not found (525)"),
            ("data 52e", "invalid credentials (52e)"),
            ("DATA 52E", "invalid credentials (52e)"),
            ("data 530", "not permitted to logon at this time (530)"),
            ("data 531", "not permitted to logon at this workstation (531)"),
            ("data 533", "account disabled (533)"),
            ("data 701", "account expired (701)"),
            ("data 775", "account locked (775)"),
        ];
        for (diagnostic, phrase) in cases {
            let message = describe(ResultCode::INVALID_CREDENTIALS, diagnostic);
            assert!(message.ends_with(phrase), "{} -> {}", diagnostic, message);
        }
    }

    #[test]
    fn test_unknown_subcode_falls_back_to_raw_text() {
        assert_eq!(
            describe(ResultCode::INVALID_CREDENTIALS, "data 999, v2580"),
            "Invalid credentials: data 999, v2580"
        );
        assert_eq!(describe(ResultCode::INVALID_CREDENTIALS, ""), "Invalid credentials");
    }

    #[test]
    fn test_unreachable_codes() {
        assert_eq!(
            describe(ResultCode::CONNECT_ERROR, "connection refused"),
            "LDAP server unreachable: connection refused"
        );
        assert_eq!(
            describe(ResultCode::SERVER_DOWN, "reset by peer"),
            "LDAP server unreachable: reset by peer"
        );
    }

    #[test]
    fn test_no_such_object() {
        assert_eq!(describe(ResultCode::NO_SUCH_OBJECT, "0000208D: NameErr"), "User not found");
    }

    #[test]
    fn test_other_codes_include_name_and_text() {
        assert_eq!(
            describe(ResultCode::UNWILLING_TO_PERFORM, "bind disallowed"),
            "53 (unwilling to perform) - bind disallowed"
        );
        assert_eq!(describe(ResultCode(4242), "odd"), "4242 (unknown) - odd");
    }

    #[test]
    fn test_authentication_failure_classification() {
        assert!(ResultCode::INVALID_CREDENTIALS.is_authentication_failure());
        assert!(ResultCode::INSUFFICIENT_ACCESS_RIGHTS.is_authentication_failure());
        assert!(ResultCode::NO_SUCH_OBJECT.is_authentication_failure());
        assert!(!ResultCode::CONNECT_ERROR.is_authentication_failure());
        assert!(!ResultCode::SERVER_DOWN.is_authentication_failure());
        assert!(!ResultCode::TIMEOUT.is_authentication_failure());
        assert!(!ResultCode::BUSY.is_authentication_failure());
    }
}
