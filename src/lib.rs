//! Implements a client library for the AuthSub web authorization protocol.

#![forbid(unsafe_code)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod dispatch;
mod endpoint_url;
mod error;
pub mod header;
pub mod http;
pub mod platform;
pub mod prelude;
pub mod response;
pub mod service;
pub mod session;
pub mod signer;
pub mod token;

pub use endpoint_url::{EndpointUrl, IntoEndpointUrl, is_full_url};
pub use error::{BoxedError, Error};
pub use session::AuthSubSession;
pub use signer::{PrivateKeySource, RequestSigner};
pub use token::{AuthSubToken, TokenInfo, TokenPhase};

/// Documentation
pub mod _documentation {
    #[doc = include_str!("../README.md")]
    mod readme {}
    #[doc = include_str!("../CHANGELOG.md")]
    pub mod changelog {}
}

/// Re-export of parts of the `secrecy` crate.
pub mod secrecy {
    pub use ::secrecy::{ExposeSecret, SecretBox, SecretString};
}

pub use bytes::Bytes;
