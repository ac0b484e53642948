//! HTTP client and response abstractions.
//!
//! This module defines traits that decouple the library from any specific
//! HTTP implementation. Users provide their own [`HttpClient`] (e.g. backed
//! by `reqwest`, `hyper`, or a WASM-compatible client) and the library
//! operates against these traits. The client is expected to speak TLS when
//! the request URI's scheme is `https`; the library itself never opens
//! sockets.

#[cfg(feature = "http-client-reqwest")]
mod reqwest;

use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};

use crate::platform::{MaybeSend, MaybeSendSync};

/// Defines the common interface for HTTP requests.
pub trait HttpClient: MaybeSendSync {
    /// The error type returned by the client for a failed request.
    type Error: crate::Error;

    /// The associated response type returned by this HTTP client.
    type Response: HttpResponse;

    /// Executes an HTTP request and returns an owned response.
    ///
    /// The body is provided as [`Bytes`]; AuthSub service calls carry an
    /// empty body, data calls pass the caller's payload through untouched.
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + MaybeSend;
}

/// Defines the common interface for HTTP responses.
pub trait HttpResponse: MaybeSendSync {
    /// The error type when getting the response body.
    type Error: crate::Error;

    /// Returns the HTTP status code of the response.
    fn status(&self) -> StatusCode;

    /// Returns the response's HTTP headers.
    fn headers(&self) -> HeaderMap;

    /// Consumes the response and asynchronously returns its body as [`Bytes`].
    fn body(self) -> impl Future<Output = Result<Bytes, Self::Error>> + MaybeSend;
}

/// A fully read response from the authorization service.
///
/// Produced by the dispatcher once the status has been classified as
/// successful; the parts are read-only from the library's point of view.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// The response status code. Always 2xx; other statuses surface as
    /// [`DispatchError::RemoteAuth`](crate::dispatch::DispatchError::RemoteAuth).
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body.
    pub body: Bytes,
}
