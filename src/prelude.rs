//! Imports for syntax extensions.

pub use crate::IntoEndpointUrl as _;
pub use crate::http::{HttpClient as _, HttpResponse as _};
pub use crate::secrecy::ExposeSecret as _;
