//! Authenticated request dispatch.
//!
//! Resolves the request target, attaches the `Authorization` header, hands
//! the request to the transport, and classifies the response: 2xx bodies are
//! returned for the caller to parse, anything else fails with
//! [`DispatchError::RemoteAuth`]. Transport failures pass through as their
//! own variants so callers can distinguish a refused connection from a
//! rejected token.

use std::borrow::Cow;

use bytes::Bytes;
use http::uri::InvalidUri;
use http::{HeaderValue, Method, Request, StatusCode, Uri, header};
use snafu::prelude::*;

use crate::http::{AuthResponse, HttpClient, HttpResponse};
use crate::signer::SignError;

/// A request target that did not form a URL after scope resolution.
#[derive(Debug, Snafu)]
#[snafu(display("request target {target:?} is not a valid url"))]
pub struct InvalidTargetError {
    /// The resolved target string.
    target: String,
    /// The underlying error.
    source: InvalidUri,
}

impl crate::Error for InvalidTargetError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors that may occur when dispatching an authenticated request.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DispatchError<HttpReqErr: crate::Error + 'static, HttpRespErr: crate::Error + 'static> {
    /// The target could not be resolved to a URL.
    #[snafu(transparent)]
    Target {
        /// The underlying error.
        source: InvalidTargetError,
    },
    /// Signing the canonical request failed.
    #[snafu(display("could not sign the canonical request"))]
    Sign {
        /// The underlying error.
        source: SignError,
    },
    /// The assembled header value contained invalid characters.
    #[snafu(display("the authorization header value is not valid"))]
    BadHeader {
        /// The underlying error.
        source: header::InvalidHeaderValue,
    },
    /// The transport failed to execute the request.
    Request {
        /// The underlying error.
        source: HttpReqErr,
    },
    /// The transport failed while reading the response body.
    ResponseBody {
        /// The underlying error.
        source: HttpRespErr,
    },
    /// The service answered with a non-2xx status.
    #[snafu(display("authorization service returned {status}"))]
    RemoteAuth {
        /// The response status.
        status: StatusCode,
        /// The raw response body.
        body: Bytes,
    },
}

impl<HttpReqErr: crate::Error, HttpRespErr: crate::Error> crate::Error
    for DispatchError<HttpReqErr, HttpRespErr>
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::Request { source } => source.is_retryable(),
            Self::ResponseBody { source } => source.is_retryable(),
            Self::RemoteAuth { status, .. } => status.is_server_error(),
            Self::Target { .. } | Self::Sign { .. } | Self::BadHeader { .. } => false,
        }
    }
}

/// Resolves a caller-supplied target against the session scope.
///
/// An input that already contains the scope string anywhere is used as-is;
/// otherwise the scope is prepended by plain string concatenation. This
/// replicates the substring-containment behavior data-feed URLs in the wild
/// rely on; it is deliberately not a structured URL join.
///
/// # Errors
///
/// Returns [`InvalidTargetError`] if the resolved string does not parse as a
/// URI.
pub fn resolve_target(scope: &str, target: &str) -> Result<Uri, InvalidTargetError> {
    let full: Cow<'_, str> = if target.contains(scope) {
        Cow::Borrowed(target)
    } else {
        Cow::Owned(format!("{scope}{target}"))
    };
    full.as_ref()
        .parse::<Uri>()
        .context(InvalidTargetSnafu { target: full.as_ref() })
}

/// Executes one authenticated request and classifies the response.
pub(crate) async fn execute<C: HttpClient>(
    http_client: &C,
    method: Method,
    uri: Uri,
    authorization: String,
) -> Result<AuthResponse, DispatchError<C::Error, <C::Response as HttpResponse>::Error>> {
    let (mut parts, ()) = Request::new(()).into_parts();
    parts.method = method;
    parts.uri = uri;
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&authorization).context(BadHeaderSnafu)?,
    );
    let request = Request::from_parts(parts, Bytes::new());

    let response = http_client.execute(request).await.context(RequestSnafu)?;
    let status = response.status();
    let headers = response.headers();
    let body = response.body().await.context(ResponseBodySnafu)?;

    if status.is_success() {
        tracing::trace!(%status, "authsub request completed");
        Ok(AuthResponse {
            status,
            headers,
            body,
        })
    } else {
        tracing::debug!(
            %status,
            error = crate::response::error_message(&body).unwrap_or_default(),
            "authsub request rejected"
        );
        RemoteAuthSnafu { status, body }.fail()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http::HeaderMap;

    use super::*;

    const SCOPE: &str = "http://www.google.com/calendar/feeds";

    #[test]
    fn test_bare_path_gains_scope_prefix() {
        let uri = resolve_target(SCOPE, "/default/private/full").expect("resolves");
        assert_eq!(
            uri.to_string(),
            "http://www.google.com/calendar/feeds/default/private/full"
        );
    }

    #[test]
    fn test_target_containing_scope_is_untouched() {
        let uri = resolve_target(SCOPE, "http://www.google.com/calendar/feeds/default").expect("resolves");
        assert_eq!(uri.to_string(), "http://www.google.com/calendar/feeds/default");
    }

    #[test]
    fn test_containment_is_textual_not_prefix() {
        // The scope occurring anywhere in the input suppresses prefixing.
        let uri = resolve_target(SCOPE, "http://proxy.example.com/?feed=http://www.google.com/calendar/feeds")
            .expect("resolves");
        assert_eq!(uri.host(), Some("proxy.example.com"));
    }

    #[test]
    fn test_unresolvable_target_fails() {
        let result = resolve_target(SCOPE, "http://exa mple.com/feed");
        assert!(result.is_err());
    }

    struct FixedTransport {
        status: StatusCode,
        body: &'static [u8],
    }

    struct FixedResponse {
        status: StatusCode,
        body: Bytes,
    }

    impl HttpResponse for FixedResponse {
        type Error = Infallible;

        fn status(&self) -> StatusCode {
            self.status
        }

        fn headers(&self) -> HeaderMap {
            HeaderMap::new()
        }

        async fn body(self) -> Result<Bytes, Self::Error> {
            Ok(self.body)
        }
    }

    impl HttpClient for FixedTransport {
        type Error = Infallible;
        type Response = FixedResponse;

        async fn execute(&self, _request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
            Ok(FixedResponse {
                status: self.status,
                body: Bytes::from_static(self.body),
            })
        }
    }

    #[tokio::test]
    async fn test_success_passes_body_through() {
        let transport = FixedTransport {
            status: StatusCode::OK,
            body: b"Token=CMScoaHmDxDM9dqPBA\n",
        };
        let response = execute(
            &transport,
            Method::GET,
            "https://www.google.com/accounts/AuthSubSessionToken".parse().expect("valid uri"),
            "AuthSub token=\"abc\"".to_owned(),
        )
        .await
        .expect("2xx is returned as-is");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"Token=CMScoaHmDxDM9dqPBA\n");
    }

    #[tokio::test]
    async fn test_non_2xx_classified_as_remote_auth() {
        let transport = FixedTransport {
            status: StatusCode::UNAUTHORIZED,
            body: b"Error=AuthSub token expired\n",
        };
        let result = execute(
            &transport,
            Method::GET,
            "https://www.google.com/accounts/AuthSubTokenInfo".parse().expect("valid uri"),
            "AuthSub token=\"abc\"".to_owned(),
        )
        .await;
        let error = result.expect_err("non-2xx must be classified as an error");
        assert!(matches!(
            &error,
            DispatchError::RemoteAuth { status, .. } if *status == StatusCode::UNAUTHORIZED
        ));
        if let DispatchError::RemoteAuth { body, .. } = error {
            assert_eq!(&body[..], b"Error=AuthSub token expired\n");
        }
    }
}
