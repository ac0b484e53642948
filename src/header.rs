//! `Authorization` header construction.
//!
//! Non-secure tokens travel as a bare `AuthSub token="..."` header. Secure
//! tokens additionally carry the canonical request string and its RSA-SHA1
//! signature, in the fixed field order `token`, `sigalg`, `data`, `sig` that
//! the service's verifier expects.

use std::fmt;

use http::{Method, Uri};
use rand::Rng as _;

use crate::platform::SystemTime;
use crate::signer::{RequestSigner, SignError};

/// The signature algorithm this crate implements.
///
/// The AuthSub specification defines no other.
pub const SIGNATURE_ALGORITHM: &str = "rsa-sha1";

/// The canonical representation of one outgoing request, signed for secure
/// tokens.
///
/// Rendered via [`Display`](fmt::Display) as
/// `"<METHOD> <full_url> <unix_timestamp> <nonce>"`, single spaces, that
/// exact order. Values are ephemeral: a fresh timestamp and nonce are drawn
/// per request and never persisted.
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    /// The HTTP method of the request being signed.
    pub method: Method,
    /// The full request URL.
    pub target: String,
    /// Seconds since the Unix epoch at signing time.
    pub timestamp: u64,
    /// Single-use random value in `[0, 2^64)` preventing signature replay.
    pub nonce: u64,
}

impl CanonicalRequest {
    /// Draws a fresh timestamp and nonce for the given request.
    #[must_use]
    pub fn issue(method: &Method, target: &Uri) -> Self {
        Self {
            method: method.clone(),
            target: target.to_string(),
            timestamp: unix_timestamp(),
            nonce: rand::rng().random(),
        }
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.method, self.target, self.timestamp, self.nonce
        )
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Builds the header value for a non-secure token: `AuthSub token="<token>"`.
///
/// An empty token produces a header with an empty token field; callers are
/// responsible for not issuing such requests.
#[must_use]
pub fn plain_header(token: &str) -> String {
    format!("AuthSub token=\"{token}\"")
}

/// Builds the header value for a secure token.
///
/// The canonical string is signed with the installed key and the header is
/// assembled as `AuthSub token="..." sigalg="..." data="..." sig="..."`.
///
/// # Errors
///
/// Returns [`SignError::MissingKey`] if no private key has been installed,
/// or [`SignError::Signature`] if signing fails.
pub fn secure_header(
    token: &str,
    sigalg: &str,
    signer: &RequestSigner,
    canonical: &CanonicalRequest,
) -> Result<String, SignError> {
    let data = canonical.to_string();
    let sig = signer.sign(data.as_bytes())?;
    Ok(format!(
        "AuthSub token=\"{token}\" sigalg=\"{sigalg}\" data=\"{data}\" sig=\"{sig}\""
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::test_keys::TEST_KEY_PKCS8;

    const TOKEN: &str = "CMScoaHmDxC80Y2pAg";

    fn fixed_canonical() -> CanonicalRequest {
        CanonicalRequest {
            method: Method::GET,
            target: "http://www.google.com/calendar/feeds/default/private/full".to_owned(),
            timestamp: 1_204_942_501,
            nonce: 100_000_000_000_000,
        }
    }

    #[test]
    fn test_canonical_string_format() {
        assert_eq!(
            fixed_canonical().to_string(),
            "GET http://www.google.com/calendar/feeds/default/private/full 1204942501 100000000000000"
        );
    }

    #[test]
    fn test_issue_renders_the_request_target() {
        let uri: Uri = "https://www.google.com/calendar/feeds".parse().expect("valid uri");
        let canonical = CanonicalRequest::issue(&Method::POST, &uri);
        let rendered = canonical.to_string();
        assert!(rendered.starts_with("POST https://www.google.com/calendar/feeds "));
        assert_eq!(rendered.split(' ').count(), 4);
    }

    #[test]
    fn test_plain_header_exact() {
        assert_eq!(
            plain_header(TOKEN),
            "AuthSub token=\"CMScoaHmDxC80Y2pAg\""
        );
    }

    #[test]
    fn test_plain_header_allows_empty_token() {
        assert_eq!(plain_header(""), "AuthSub token=\"\"");
    }

    #[test]
    fn test_secure_header_signature_matches_independent_signing() {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        use rsa::pkcs8::DecodePrivateKey as _;
        use rsa::signature::{SignatureEncoding as _, Signer as _};

        let signer = RequestSigner::new();
        signer.install(TEST_KEY_PKCS8).expect("key installs");

        let canonical = fixed_canonical();
        let data = canonical.to_string();
        let header =
            secure_header(TOKEN, SIGNATURE_ALGORITHM, &signer, &canonical).expect("header builds");

        let key =
            rsa::RsaPrivateKey::from_pkcs8_pem(TEST_KEY_PKCS8).expect("valid test key");
        let signing_key = rsa::pkcs1v15::SigningKey::<sha1::Sha1>::new(key);
        let expected_sig =
            STANDARD.encode(signing_key.try_sign(data.as_bytes()).expect("signs").to_bytes());

        assert_eq!(
            header,
            format!(
                "AuthSub token=\"{TOKEN}\" sigalg=\"rsa-sha1\" data=\"{data}\" sig=\"{expected_sig}\""
            )
        );
    }

    #[test]
    fn test_secure_header_without_key_fails() {
        let result = secure_header(TOKEN, SIGNATURE_ALGORITHM, &RequestSigner::new(), &fixed_canonical());
        assert!(matches!(result, Err(SignError::MissingKey)));
    }
}
