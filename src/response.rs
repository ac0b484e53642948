//! Parsers for the service's plaintext response bodies.
//!
//! The authorization service answers with newline-delimited `Key=Value`
//! lines (LF or CRLF). The producer is external and untrusted: extra or
//! unknown lines are ignored, only a missing required line is an error.
//! These parsers run against bodies of otherwise-successful responses;
//! non-2xx statuses are classified by the dispatcher before parsing.

use snafu::prelude::*;

use crate::token::TokenInfo;

/// Errors that may occur when parsing a service response body.
#[derive(Debug, Snafu)]
pub enum ResponseParseError {
    /// The body was not UTF-8 text.
    #[snafu(display("response body is not text"))]
    BodyNotText {
        /// The underlying error.
        source: std::str::Utf8Error,
    },
    /// A required `Key=` line was absent.
    #[snafu(display("response is missing the required `{field}=` line"))]
    MissingField {
        /// The key of the missing line.
        field: &'static str,
    },
}

impl crate::Error for ResponseParseError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extracts the token from a session-token response body.
///
/// Scans for a line of the form `Token=<value>`; the key is case-sensitive,
/// matching the service's output.
///
/// # Errors
///
/// Returns [`ResponseParseError::MissingField`] if no `Token=` line is
/// present, or [`ResponseParseError::BodyNotText`] for a non-UTF-8 body.
pub fn session_token(body: &[u8]) -> Result<&str, ResponseParseError> {
    let text = std::str::from_utf8(body).context(BodyNotTextSnafu)?;
    scan_line(text, "Token").context(MissingFieldSnafu { field: "Token" })
}

/// Parses a token-info response body.
///
/// Requires `Target=`, `Scope=` and `Secure=` lines in any order. The
/// `Secure` value is compared to `"true"` case-insensitively; the key names
/// are not.
///
/// # Errors
///
/// Returns [`ResponseParseError::MissingField`] naming the first absent
/// required line, or [`ResponseParseError::BodyNotText`] for a non-UTF-8
/// body.
pub fn token_info(body: &[u8]) -> Result<TokenInfo, ResponseParseError> {
    let text = std::str::from_utf8(body).context(BodyNotTextSnafu)?;
    let target = scan_line(text, "Target").context(MissingFieldSnafu { field: "Target" })?;
    let scope = scan_line(text, "Scope").context(MissingFieldSnafu { field: "Scope" })?;
    let secure = scan_line(text, "Secure").context(MissingFieldSnafu { field: "Secure" })?;
    Ok(TokenInfo {
        target: target.to_owned(),
        scope: scope.to_owned(),
        secure: secure.eq_ignore_ascii_case("true"),
    })
}

/// Extracts the service's error message from an error response body.
///
/// Error bodies carry an `Error=<message>` line; returns `None` when the
/// body is not text or carries no such line. Purely informational — status
/// classification happens in the dispatcher, not here.
#[must_use]
pub fn error_message(body: &[u8]) -> Option<&str> {
    scan_line(std::str::from_utf8(body).ok()?, "Error")
}

/// Returns the value of the first line starting with `<key>=`.
fn scan_line<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_extracted() {
        let body = b"Token=CMScoaHmDxDM9dqPBA\nExpiration=20061004T20:01:30Z\n";
        assert_eq!(session_token(body).expect("parses"), "CMScoaHmDxDM9dqPBA");
    }

    #[test]
    fn test_session_token_missing_line_fails() {
        let body = b"Error=Token revoked\n";
        assert!(matches!(
            session_token(body),
            Err(ResponseParseError::MissingField { field: "Token" })
        ));
    }

    #[test]
    fn test_session_token_key_is_case_sensitive() {
        assert!(session_token(b"token=abc\n").is_err());
    }

    #[test]
    fn test_token_info_parsed() {
        let body = b"Target=http://www.example.com\n\
Scope=http://www.google.com/calendar/feeds/\n\
Secure=true\n";
        assert_eq!(
            token_info(body).expect("parses"),
            TokenInfo {
                target: "http://www.example.com".to_owned(),
                scope: "http://www.google.com/calendar/feeds/".to_owned(),
                secure: true,
            }
        );
    }

    #[test]
    fn test_token_info_accepts_crlf_and_unknown_lines() {
        let body = b"X-Extra=ignored\r\nTarget=http://www.example.com\r\nSecure=FALSE\r\nScope=http://www.google.com/calendar/feeds/\r\n";
        let info = token_info(body).expect("parses");
        assert_eq!(info.target, "http://www.example.com");
        assert!(!info.secure);
    }

    #[test]
    fn test_token_info_secure_value_case_insensitive() {
        let body = b"Target=t\nScope=s\nSecure=TRUE\n";
        assert!(token_info(body).expect("parses").secure);
    }

    #[test]
    fn test_token_info_missing_secure_fails() {
        let body = b"Target=http://www.example.com\nScope=http://www.google.com/calendar/feeds/\n";
        assert!(matches!(
            token_info(body),
            Err(ResponseParseError::MissingField { field: "Secure" })
        ));
    }

    #[test]
    fn test_error_message_extracted() {
        assert_eq!(
            error_message(b"Error=AuthSub token expired\n"),
            Some("AuthSub token expired")
        );
        assert_eq!(error_message(b"Status=fine\n"), None);
        assert_eq!(error_message(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_non_utf8_body_fails() {
        assert!(matches!(
            token_info(&[0xff, 0xfe, b'T']),
            Err(ResponseParseError::BodyNotText { .. })
        ));
    }
}
