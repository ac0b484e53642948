//! Authorization service endpoints.
//!
//! The four fixed endpoints of the AuthSub service, preconfigured for
//! Google's production hosts and overridable for test doubles or
//! self-hosted deployments.

use bon::Builder;
use http::Uri;

use crate::endpoint_url::{EndpointUrl, IntoEndpointUrl};

/// Hostname of Google's production authorization service.
pub const GOOGLE_HOST: &str = "www.google.com";

/// Path of the endpoint a user is redirected to when requesting a token.
pub const REQUEST_TOKEN_PATH: &str = "/accounts/AuthSubRequest";

/// Path of the endpoint exchanging a single-use token for a session token.
pub const SESSION_TOKEN_PATH: &str = "/accounts/AuthSubSessionToken";

/// Path of the endpoint revoking a token.
pub const REVOKE_TOKEN_PATH: &str = "/accounts/AuthSubRevokeToken";

/// Path of the endpoint reporting a token's target, scope and security.
pub const TOKEN_INFO_PATH: &str = "/accounts/AuthSubTokenInfo";

fn google_endpoint(path: &'static str) -> EndpointUrl {
    Uri::builder()
        .scheme("https")
        .authority(GOOGLE_HOST)
        .path_and_query(path)
        // The components are literal and known-good.
        .build()
        .expect("default endpoint components form a valid URI")
        .into()
}

/// The set of service endpoints a session talks to.
///
/// `ServiceEndpoints::default()` points at Google's production service over
/// https; the builder overrides individual endpoints.
#[derive(Debug, Clone, Builder)]
#[builder(state_mod(name = "builder"))]
pub struct ServiceEndpoints {
    /// The token-request endpoint users are redirected to.
    #[builder(default = google_endpoint(REQUEST_TOKEN_PATH), setters(name = "request_url"))]
    request: EndpointUrl,

    /// The session-token exchange endpoint.
    #[builder(default = google_endpoint(SESSION_TOKEN_PATH), setters(name = "session_token_url"))]
    session_token: EndpointUrl,

    /// The revocation endpoint.
    #[builder(default = google_endpoint(REVOKE_TOKEN_PATH), setters(name = "revoke_url"))]
    revoke: EndpointUrl,

    /// The token-info endpoint.
    #[builder(default = google_endpoint(TOKEN_INFO_PATH), setters(name = "token_info_url"))]
    token_info: EndpointUrl,
}

impl ServiceEndpoints {
    /// The token-request endpoint.
    #[must_use]
    pub fn request(&self) -> &EndpointUrl {
        &self.request
    }

    /// The session-token exchange endpoint.
    #[must_use]
    pub fn session_token(&self) -> &EndpointUrl {
        &self.session_token
    }

    /// The revocation endpoint.
    #[must_use]
    pub fn revoke(&self) -> &EndpointUrl {
        &self.revoke
    }

    /// The token-info endpoint.
    #[must_use]
    pub fn token_info(&self) -> &EndpointUrl {
        &self.token_info
    }
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<S: builder::State> ServiceEndpointsBuilder<S> {
    /// Sets the token-request endpoint.
    ///
    /// Accepts any type that implements [`IntoEndpointUrl`], including
    /// `&str`, [`String`], [`Url`](url::Url), [`Uri`](http::Uri), and
    /// [`EndpointUrl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed as a valid URI.
    pub fn request_endpoint<U: IntoEndpointUrl>(
        self,
        url: U,
    ) -> Result<ServiceEndpointsBuilder<builder::SetRequest<S>>, U::Error>
    where
        S::Request: builder::IsUnset,
    {
        Ok(self.request_url(url.into_endpoint_url()?))
    }

    /// Sets the session-token exchange endpoint.
    ///
    /// Accepts any type that implements [`IntoEndpointUrl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed as a valid URI.
    pub fn session_token_endpoint<U: IntoEndpointUrl>(
        self,
        url: U,
    ) -> Result<ServiceEndpointsBuilder<builder::SetSessionToken<S>>, U::Error>
    where
        S::SessionToken: builder::IsUnset,
    {
        Ok(self.session_token_url(url.into_endpoint_url()?))
    }

    /// Sets the revocation endpoint.
    ///
    /// Accepts any type that implements [`IntoEndpointUrl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed as a valid URI.
    pub fn revoke_endpoint<U: IntoEndpointUrl>(
        self,
        url: U,
    ) -> Result<ServiceEndpointsBuilder<builder::SetRevoke<S>>, U::Error>
    where
        S::Revoke: builder::IsUnset,
    {
        Ok(self.revoke_url(url.into_endpoint_url()?))
    }

    /// Sets the token-info endpoint.
    ///
    /// Accepts any type that implements [`IntoEndpointUrl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed as a valid URI.
    pub fn token_info_endpoint<U: IntoEndpointUrl>(
        self,
        url: U,
    ) -> Result<ServiceEndpointsBuilder<builder::SetTokenInfo<S>>, U::Error>
    where
        S::TokenInfo: builder::IsUnset,
    {
        Ok(self.token_info_url(url.into_endpoint_url()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints_target_google() {
        let endpoints = ServiceEndpoints::default();
        assert_eq!(
            endpoints.request().as_uri().to_string(),
            "https://www.google.com/accounts/AuthSubRequest"
        );
        assert_eq!(
            endpoints.session_token().as_uri().to_string(),
            "https://www.google.com/accounts/AuthSubSessionToken"
        );
        assert_eq!(
            endpoints.revoke().as_uri().to_string(),
            "https://www.google.com/accounts/AuthSubRevokeToken"
        );
        assert_eq!(
            endpoints.token_info().as_uri().to_string(),
            "https://www.google.com/accounts/AuthSubTokenInfo"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let endpoints = ServiceEndpoints::builder()
            .session_token_endpoint("https://sandbox.example.com/AuthSubSessionToken")
            .expect("valid url")
            .build();
        assert_eq!(
            endpoints.session_token().as_uri().host(),
            Some("sandbox.example.com")
        );
        // Unset endpoints keep their defaults.
        assert_eq!(endpoints.request().as_uri().host(), Some(GOOGLE_HOST));
    }
}
