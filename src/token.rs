//! Token value types.

use secrecy::{ExposeSecret, SecretString, zeroize::Zeroize};
use serde::Serialize;

/// An opaque AuthSub token.
///
/// Represents either a single-use or a session-scoped credential; which one
/// is tracked by the owning [`AuthSubSession`](crate::AuthSubSession), not by
/// the value itself. The string is secret-wrapped so it never appears in
/// `Debug` output; it is exposed only when the `Authorization` header is
/// assembled.
#[derive(Debug, Clone)]
pub struct AuthSubToken(pub SecretString);

impl Zeroize for AuthSubToken {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for AuthSubToken {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for AuthSubToken {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<SecretString> for AuthSubToken {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}

impl ExposeSecret<str> for AuthSubToken {
    fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Where a session stands in the token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPhase {
    /// No token held yet.
    Unauthorized,
    /// A single-use token is held and has not been exchanged.
    SingleUse,
    /// A session token is held.
    Session,
    /// The token was revoked; terminal.
    Revoked,
}

/// Information the service reports about a token.
///
/// Produced by [`AuthSubSession::token_info`](crate::AuthSubSession::token_info);
/// a plain read model with no identity beyond the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    /// The target (the registered web application) the token was issued to.
    pub target: String,
    /// The scope URL the token grants access to.
    pub scope: String,
    /// Whether the token requires signed requests.
    pub secure: bool,
}
