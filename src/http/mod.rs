//! Transport abstractions.
//!
//! This module defines traits that decouple the adapter from any specific
//! HTTP implementation. Users provide their own [`Transport`] (e.g. backed
//! by `reqwest` or `hyper`) and the adapter operates against these traits.
//! A [`Transport`] for reqwest's `Client` ships behind the
//! `transport-reqwest` feature.

#[cfg(feature = "transport-reqwest")]
mod reqwest;

use bytes::Bytes;
use http::{Request, StatusCode};

#[cfg(feature = "transport-reqwest")]
pub use self::reqwest::ReqwestTransportError;

/// Defines the common interface for dispatching HTTP requests.
///
/// Dispatch failures carry the transport's own error type. When the target
/// endpoint refuses the connection or cannot be reached, the error's display
/// message must begin with `no connection could be made` (any case) and name
/// the endpoint in parentheses when it is known; the adapter recognizes that
/// shape and surfaces it as a connection failure distinct from other
/// transport errors, which pass through unchanged.
pub trait Transport: Send + Sync {
    /// The error type returned by the transport for a failed dispatch.
    type Error: crate::Error;

    /// The associated response type returned by this transport.
    type Response: TransportResponse;

    /// Dispatches an HTTP request and returns an owned response.
    ///
    /// The request carries its body as [`Bytes`]; an absent body is empty
    /// bytes. The returned future resolves to the response once its status
    /// and headers have arrived; the body is read separately.
    fn send(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send;
}

/// Defines the common interface for HTTP responses.
pub trait TransportResponse: Send {
    /// The error type when reading the response body.
    type Error: crate::Error;

    /// Returns the HTTP status code of the response.
    fn status(&self) -> StatusCode;

    /// Consumes the response and asynchronously returns its body as
    /// [`Bytes`].
    fn body(self) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}
