//! Validated service URLs.
//!
//! [`EndpointUrl`] is a newtype over [`Uri`] used for the authorization
//! service endpoints; it can be constructed from common string and URL types
//! via [`IntoEndpointUrl`]. [`is_full_url`] is the gate applied to
//! caller-supplied `next` and `scope` URLs before a request URL is built.

use std::convert::Infallible;

use http::{Uri, uri::InvalidUri};
use url::Url;

/// Returns true if the given string is a full URL.
///
/// A URL is full iff it parses and carries a scheme, a host, and a non-empty
/// path. `"www.google.com/calendar/feeds"` parses as a bare path and is
/// therefore not full.
#[must_use]
pub fn is_full_url(url: &str) -> bool {
    match url.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_some() && uri.host().is_some() && !uri.path().is_empty(),
        Err(_) => false,
    }
}

/// A validated endpoint URL.
///
/// This is a newtype over [`Uri`] which can be constructed from common
/// string and URL types via [`IntoEndpointUrl`]. Once constructed, it can be
/// freely cloned and passed around without re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrl(Uri);

impl EndpointUrl {
    /// Returns the inner [`Uri`].
    #[must_use]
    pub fn as_uri(&self) -> &Uri {
        &self.0
    }

    /// Consumes the [`EndpointUrl`] and returns the inner [`Uri`].
    #[must_use]
    pub fn into_uri(self) -> Uri {
        self.0
    }
}

impl From<Uri> for EndpointUrl {
    fn from(value: Uri) -> Self {
        Self(value)
    }
}

/// Conversion trait for types that can be turned into an [`EndpointUrl`].
pub trait IntoEndpointUrl {
    /// The error type returned if the conversion fails.
    type Error;

    /// Attempts to convert this value into an [`EndpointUrl`].
    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error>;
}

impl IntoEndpointUrl for EndpointUrl {
    type Error = Infallible;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        Ok(self)
    }
}

impl IntoEndpointUrl for Uri {
    type Error = Infallible;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        Ok(EndpointUrl(self))
    }
}

impl IntoEndpointUrl for Url {
    type Error = InvalidUri;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        self.as_str().parse::<Uri>().map(EndpointUrl)
    }
}

impl IntoEndpointUrl for &str {
    type Error = InvalidUri;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        self.parse::<Uri>().map(EndpointUrl)
    }
}

impl IntoEndpointUrl for String {
    type Error = InvalidUri;

    fn into_endpoint_url(self) -> Result<EndpointUrl, Self::Error> {
        self.parse::<Uri>().map(EndpointUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_accepted() {
        assert!(is_full_url("http://www.example.com/next"));
        assert!(is_full_url("https://www.google.com/calendar/feeds"));
    }

    #[test]
    fn test_url_without_scheme_rejected() {
        assert!(!is_full_url("www.google.com/calendar/feeds"));
        assert!(!is_full_url("www.schedy.com"));
    }

    #[test]
    fn test_unparsable_url_rejected() {
        assert!(!is_full_url(""));
        assert!(!is_full_url("http://exa mple.com/"));
    }

    #[test]
    fn test_into_endpoint_url_from_str() {
        let endpoint = "https://www.google.com/accounts/AuthSubRequest"
            .into_endpoint_url()
            .expect("valid url");
        assert_eq!(endpoint.as_uri().path(), "/accounts/AuthSubRequest");
    }
}
