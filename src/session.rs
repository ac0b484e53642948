//! The AuthSub session: token state and lifecycle operations.
//!
//! An [`AuthSubSession`] is configured with the caller's `next` and scope
//! URLs, walks a token through
//! `Unauthorized → SingleUse → Session → Revoked`, and performs the
//! authenticated verb calls on the caller's behalf. All network activity
//! goes through a caller-supplied [`HttpClient`].

use bon::Builder;
use http::{Method, Uri};
use secrecy::ExposeSecret;
use serde::Serialize;
use snafu::prelude::*;

use crate::dispatch::{self, DispatchError};
use crate::endpoint_url::{EndpointUrl, is_full_url};
use crate::header::{self, CanonicalRequest, SIGNATURE_ALGORITHM};
use crate::http::{AuthResponse, HttpClient, HttpResponse};
use crate::response::{self, ResponseParseError};
use crate::service::ServiceEndpoints;
use crate::signer::RequestSigner;
use crate::token::{AuthSubToken, TokenInfo, TokenPhase};

/// Errors that may occur when building the authorization request URL.
#[derive(Debug, Snafu)]
pub enum RequestUrlError {
    /// The configured next URL lacks a scheme, host or path.
    #[snafu(display("next url {url:?} is not a full url"))]
    InvalidNextUrl {
        /// The offending URL.
        url: String,
    },
    /// The configured scope URL lacks a scheme, host or path.
    #[snafu(display("scope url {url:?} is not a full url"))]
    InvalidScopeUrl {
        /// The offending URL.
        url: String,
    },
    /// Encoding the query parameters failed.
    #[snafu(display("encoding the request query failed"))]
    EncodeQuery {
        /// The underlying error.
        source: serde_html_form::ser::Error,
    },
}

impl crate::Error for RequestUrlError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors that may occur when extracting a token from a callback URL.
#[derive(Debug, Snafu)]
pub enum ReceiveTokenError {
    /// The callback value did not parse as a URL at all.
    #[snafu(display("callback value is not a url"))]
    InvalidCallbackUrl {
        /// The underlying error.
        source: http::uri::InvalidUri,
    },
}

impl crate::Error for ReceiveTokenError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors that may occur when exchanging a single-use token for a session
/// token.
#[derive(Debug, Snafu)]
pub enum ExchangeError<HttpReqErr: crate::Error + 'static, HttpRespErr: crate::Error + 'static> {
    /// The session does not hold an unexchanged single-use token.
    #[snafu(display("no single-use token to exchange (phase is {phase:?})"))]
    NotExchangeable {
        /// The phase the session was in.
        phase: TokenPhase,
    },
    /// The session-token request failed.
    #[snafu(display("session token request failed"))]
    Exchange {
        /// The underlying error.
        source: DispatchError<HttpReqErr, HttpRespErr>,
    },
    /// The session-token response did not carry a token.
    #[snafu(display("session token response could not be parsed"))]
    ExchangeResponse {
        /// The underlying error.
        source: ResponseParseError,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for ExchangeError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Exchange { source } => source.is_retryable(),
            Self::NotExchangeable { .. } | Self::ExchangeResponse { .. } => false,
        }
    }
}

/// Errors that may occur when querying token information.
#[derive(Debug, Snafu)]
pub enum TokenInfoError<HttpReqErr: crate::Error + 'static, HttpRespErr: crate::Error + 'static> {
    /// The token-info request failed.
    #[snafu(display("token info request failed"))]
    Info {
        /// The underlying error.
        source: DispatchError<HttpReqErr, HttpRespErr>,
    },
    /// The token-info response was missing a required line.
    #[snafu(display("token info response could not be parsed"))]
    InfoResponse {
        /// The underlying error.
        source: ResponseParseError,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for TokenInfoError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Info { source } => source.is_retryable(),
            Self::InfoResponse { .. } => false,
        }
    }
}

// Field order is the query parameter order the service expects.
#[derive(Serialize)]
struct RequestUrlQuery<'a> {
    next: &'a str,
    scope: &'a str,
    session: u8,
    secure: u8,
}

/// An AuthSub client session.
///
/// Created with the builder, mutated in place by
/// [`receive_token`](Self::receive_token),
/// [`request_session_token`](Self::request_session_token) and
/// [`revoke_token`](Self::revoke_token); there is no persistence beyond the
/// value itself.
#[derive(Debug, Clone, Builder)]
#[builder(state_mod(name = "builder"))]
pub struct AuthSubSession {
    /// The URL the service redirects the user back to after sign-in.
    #[builder(into)]
    next_url: String,

    /// The scope URL of the service the token grants access to.
    #[builder(into)]
    scope: String,

    /// Whether the requested token may be exchanged for a session token.
    #[builder(default = false)]
    session: bool,

    /// Whether requests made with the token must be signed.
    #[builder(default = false)]
    secure: bool,

    /// The signature algorithm advertised in secure headers.
    ///
    /// The protocol defines only `rsa-sha1`; the field exists so a changed
    /// service-side default does not require a new library release.
    #[builder(into, default = SIGNATURE_ALGORITHM.to_owned())]
    sigalg: String,

    /// The service endpoints to talk to. Defaults to Google's production
    /// service.
    #[builder(default)]
    endpoints: ServiceEndpoints,

    /// The signing-key handle consulted for secure requests. Pass a shared
    /// handle to let several sessions use one registered key.
    #[builder(default)]
    signer: RequestSigner,

    #[builder(skip)]
    token: Option<AuthSubToken>,

    #[builder(skip)]
    upgraded: bool,

    #[builder(skip)]
    revoked: bool,
}

impl AuthSubSession {
    /// Builds the URL to redirect the user to when requesting a token.
    ///
    /// The query carries `next`, `scope`, `session` and `secure` in that
    /// order, percent-encoded. This is a pure function of the session
    /// configuration: no network activity, safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`RequestUrlError::InvalidNextUrl`] or
    /// [`RequestUrlError::InvalidScopeUrl`] if the respective URL lacks a
    /// scheme, host or path.
    pub fn request_url(&self) -> Result<Uri, RequestUrlError> {
        if !is_full_url(&self.next_url) {
            return InvalidNextUrlSnafu { url: &self.next_url }.fail();
        }
        if !is_full_url(&self.scope) {
            return InvalidScopeUrlSnafu { url: &self.scope }.fail();
        }
        let query = serde_html_form::to_string(RequestUrlQuery {
            next: &self.next_url,
            scope: &self.scope,
            session: u8::from(self.session),
            secure: u8::from(self.secure),
        })
        .context(EncodeQuerySnafu)?;
        Ok(append_query(self.endpoints.request(), &query))
    }

    /// Extracts the single-use token from the callback URL the service
    /// redirected the user back to.
    ///
    /// The query is scanned for a `token` parameter, key compared
    /// case-insensitively, value taken verbatim; the last occurrence wins.
    /// A callback without a token parameter leaves the current token
    /// untouched, so a malformed redirect cannot clobber working state.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveTokenError::InvalidCallbackUrl`] if the value is not
    /// a URL at all.
    pub fn receive_token(&mut self, callback_url: &str) -> Result<(), ReceiveTokenError> {
        let callback: Uri = callback_url.parse().context(InvalidCallbackUrlSnafu)?;
        if let Some(value) = token_from_query(callback.query().unwrap_or("")) {
            self.token = Some(AuthSubToken::from(value));
            self.upgraded = false;
            self.revoked = false;
            tracing::debug!("received single-use token from callback");
        }
        Ok(())
    }

    /// Exchanges the held single-use token for a session token.
    ///
    /// On success the session token replaces the single-use token and the
    /// phase moves to [`TokenPhase::Session`]. On any failure the prior
    /// token state is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::NotExchangeable`] unless an unexchanged
    /// single-use token is held, [`ExchangeError::Exchange`] if the request
    /// fails, or [`ExchangeError::ExchangeResponse`] if the response carries
    /// no `Token=` line.
    pub async fn request_session_token<C: HttpClient>(
        &mut self,
        http_client: &C,
    ) -> Result<(), ExchangeError<C::Error, <C::Response as HttpResponse>::Error>> {
        let phase = self.phase();
        if phase != TokenPhase::SingleUse {
            return NotExchangeableSnafu { phase }.fail();
        }
        let response = self
            .request_endpoint(http_client, Method::GET, self.endpoints.session_token())
            .await
            .context(ExchangeSnafu)?;
        let token = response::session_token(&response.body).context(ExchangeResponseSnafu)?;
        self.token = Some(AuthSubToken::from(token));
        self.upgraded = true;
        tracing::debug!("exchanged single-use token for a session token");
        Ok(())
    }

    /// Revokes the held token, single-use or session.
    ///
    /// Returns `true` on a successful revocation and `false` on any error,
    /// transport failures included; it never raises. This asymmetry with the
    /// other operations is deliberate and kept for compatibility: revocation
    /// is a best-effort cleanup call.
    pub async fn revoke_token<C: HttpClient>(&mut self, http_client: &C) -> bool {
        match self
            .request_endpoint(http_client, Method::GET, self.endpoints.revoke())
            .await
        {
            Ok(_) => {
                self.revoked = true;
                tracing::debug!("token revoked");
                true
            }
            Err(error) => {
                tracing::debug!(%error, "token revocation failed");
                false
            }
        }
    }

    /// Queries the service for the held token's target, scope and security.
    ///
    /// # Errors
    ///
    /// Returns [`TokenInfoError::Info`] if the request fails, or
    /// [`TokenInfoError::InfoResponse`] if any of the three required lines
    /// is absent.
    pub async fn token_info<C: HttpClient>(
        &self,
        http_client: &C,
    ) -> Result<TokenInfo, TokenInfoError<C::Error, <C::Response as HttpResponse>::Error>> {
        let response = self
            .request_endpoint(http_client, Method::GET, self.endpoints.token_info())
            .await
            .context(InfoSnafu)?;
        response::token_info(&response.body).context(InfoResponseSnafu)
    }

    /// Performs an authenticated GET against the given URL or scope-relative
    /// path.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unresolvable targets, signing
    /// failures, transport failures, and non-2xx responses.
    pub async fn get<C: HttpClient>(
        &self,
        http_client: &C,
        target: &str,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        self.request(http_client, Method::GET, target).await
    }

    /// Performs an authenticated POST against the given URL or
    /// scope-relative path.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unresolvable targets, signing
    /// failures, transport failures, and non-2xx responses.
    pub async fn post<C: HttpClient>(
        &self,
        http_client: &C,
        target: &str,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        self.request(http_client, Method::POST, target).await
    }

    /// Performs an authenticated PUT against the given URL or scope-relative
    /// path.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unresolvable targets, signing
    /// failures, transport failures, and non-2xx responses.
    pub async fn put<C: HttpClient>(
        &self,
        http_client: &C,
        target: &str,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        self.request(http_client, Method::PUT, target).await
    }

    /// Performs an authenticated DELETE against the given URL or
    /// scope-relative path.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unresolvable targets, signing
    /// failures, transport failures, and non-2xx responses.
    pub async fn delete<C: HttpClient>(
        &self,
        http_client: &C,
        target: &str,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        self.request(http_client, Method::DELETE, target).await
    }

    /// Performs an authenticated request with an arbitrary verb.
    ///
    /// A target that does not already contain the scope string gains the
    /// scope as a prefix; see [`dispatch::resolve_target`].
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unresolvable targets, signing
    /// failures, transport failures, and non-2xx responses.
    pub async fn request<C: HttpClient>(
        &self,
        http_client: &C,
        method: Method,
        target: &str,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        let uri = dispatch::resolve_target(&self.scope, target)?;
        self.request_uri(http_client, method, uri).await
    }

    async fn request_endpoint<C: HttpClient>(
        &self,
        http_client: &C,
        method: Method,
        endpoint: &EndpointUrl,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        self.request_uri(http_client, method, endpoint.as_uri().clone())
            .await
    }

    async fn request_uri<C: HttpClient>(
        &self,
        http_client: &C,
        method: Method,
        uri: Uri,
    ) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
        let token = self.token.as_ref().map_or("", |token| token.expose_secret());
        let authorization = if self.secure {
            let canonical = CanonicalRequest::issue(&method, &uri);
            header::secure_header(token, &self.sigalg, &self.signer, &canonical)
                .context(dispatch::SignSnafu)?
        } else {
            header::plain_header(token)
        };
        dispatch::execute(http_client, method, uri, authorization).await
    }

    /// The held token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&AuthSubToken> {
        self.token.as_ref()
    }

    /// Injects a single-use token directly, e.g. one delivered as a request
    /// parameter by a web framework.
    pub fn set_token(&mut self, token: impl Into<AuthSubToken>) {
        self.token = Some(token.into());
        self.upgraded = false;
        self.revoked = false;
    }

    /// Injects an already-exchanged session token, e.g. one restored from
    /// the caller's own storage.
    pub fn set_session_token(&mut self, token: impl Into<AuthSubToken>) {
        self.token = Some(token.into());
        self.upgraded = true;
        self.revoked = false;
    }

    /// Where the session stands in the token lifecycle.
    #[must_use]
    pub fn phase(&self) -> TokenPhase {
        if self.revoked {
            TokenPhase::Revoked
        } else if self.token.is_none() {
            TokenPhase::Unauthorized
        } else if self.upgraded {
            TokenPhase::Session
        } else {
            TokenPhase::SingleUse
        }
    }

    /// The configured next URL.
    #[must_use]
    pub fn next_url(&self) -> &str {
        &self.next_url
    }

    /// Replaces the next URL used by subsequent [`request_url`](Self::request_url) calls.
    pub fn set_next_url(&mut self, next_url: impl Into<String>) {
        self.next_url = next_url.into();
    }

    /// The configured scope URL.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Replaces the scope URL.
    pub fn set_scope(&mut self, scope: impl Into<String>) {
        self.scope = scope.into();
    }

    /// Whether the requested token may be exchanged for a session token.
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.session
    }

    /// Sets the session flag for subsequent request URLs.
    pub fn set_session(&mut self, session: bool) {
        self.session = session;
    }

    /// Whether requests made with the token must be signed.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Sets the secure flag. A signing key must be installed before the next
    /// authenticated request when enabling this.
    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    /// The signature algorithm advertised in secure headers.
    #[must_use]
    pub fn sigalg(&self) -> &str {
        &self.sigalg
    }

    /// The configured service endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    /// The signing-key handle. Install the private key here before issuing
    /// secure requests.
    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }
}

fn append_query(endpoint: &EndpointUrl, query: &str) -> Uri {
    let separator = if endpoint.as_uri().query().is_some() {
        '&'
    } else {
        '?'
    };
    let uri_string = format!("{}{separator}{query}", endpoint.as_uri());
    // The base URI is already valid and we're only appending a query string
    // produced by serde_html_form, which only emits valid query characters.
    uri_string
        .parse()
        .expect("appending a query string to a valid URI should produce a valid URI")
}

/// Last `token=` pair wins, mirroring the service's own tolerance for
/// repeated parameters.
fn token_from_query(query: &str) -> Option<&str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| key.eq_ignore_ascii_case("token"))
        .map(|(_, value)| value)
        .next_back()
}
