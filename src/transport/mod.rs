//! Network access.
//!
//! This module defines the [`Transport`] trait, the one capability the
//! download loop needs from the network: perform an authenticated GET and
//! hand back the response body as a stream.  The production implementation
//! is [`HttpTransport`]; tests plug in an in-memory fake.
//!
//! ## Implementing a transport
//!
//! ```ignore
//! struct MyTransport { /* client, credentials */ }
//!
//! impl Transport for MyTransport {
//!     fn open(&self, url: &Url) -> Result<Box<dyn Read + Send>, TransportError> {
//!         // Send the request; fail on a non-2xx status.
//!         // Return the body without reading it into memory.
//!         todo!()
//!     }
//! }
//! ```

mod http;

pub use http::HttpTransport;

use std::io::Read;

use reqwest::Url;

use crate::error::TransportError;

/// Something that can fetch a URL.
///
/// The download loop calls [`open()`](Transport::open) from several worker
/// threads at once, so implementations must be [`Send`] and [`Sync`].
pub trait Transport: Send + Sync {
    /// Issue exactly one authenticated GET for `url`.
    ///
    /// Returns once the response headers are in.  A non-success status must
    /// be reported as [`TransportError::Status`], not as a body.
    fn open(&self, url: &Url) -> Result<Box<dyn Read + Send>, TransportError>;
}
