//! Per-call options, the call error taxonomy, and failure translation.
//!
//! Every call produces exactly one outcome: a decoded success value or one
//! [`CallError`] naming the stage that failed. Failed HTTP responses are
//! translated with a fixed precedence: a body matching the caller's error
//! shape may be replaced by a caller-supplied override, a body that parses
//! but does not match stays opaque and never reaches the override, and an
//! undecodable body is an empty-body failure.

use std::fmt;

use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::Value;
use snafu::Snafu;

use crate::{
    BoxedError,
    body::DecodedBody,
    header::Header,
    http::{Transport, TransportResponse},
};

/// HTTP verb for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub(crate) fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        })
    }
}

/// One request about to be dispatched. Built per call, never reused.
pub(crate) struct RequestDescriptor<'a> {
    pub(crate) verb: Verb,
    pub(crate) path: &'a str,
    pub(crate) payload: Option<Bytes>,
}

/// A caller-supplied mapping from a decoded error body to a replacement
/// error. Returning `None` keeps the default error.
pub type ErrorOverride<E> = Box<dyn Fn(&E) -> Option<BoxedError> + Send + Sync>;

/// Options applied to a single call.
///
/// `headers` overlay the adapter's defaults for this call only, replacing
/// same-named defaults (exact name match) and vanishing once the call
/// returns. The error override runs only when a failed response's body
/// decodes as `E`.
pub struct CallOptions<E> {
    pub(crate) headers: Vec<Header>,
    pub(crate) error_override: Option<ErrorOverride<E>>,
}

impl<E> CallOptions<E> {
    /// Empty options: no scoped headers, no override.
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            error_override: None,
        }
    }

    /// Adds one scoped header.
    #[must_use]
    pub fn header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Adds scoped headers in order.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Installs the error override for this call.
    #[must_use]
    pub fn error_override(
        mut self,
        f: impl Fn(&E) -> Option<BoxedError> + Send + Sync + 'static,
    ) -> Self {
        self.error_override = Some(Box::new(f));
        self
    }
}

impl<E> Default for CallOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for CallOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("headers", &self.headers)
            .field("error_override", &self.error_override.is_some())
            .finish()
    }
}

/// Result of a call issued through [`ApiClient`](crate::ApiClient).
pub type CallResult<S, E, C> = Result<
    S,
    CallError<E, <C as Transport>::Error, <<C as Transport>::Response as TransportResponse>::Error>,
>;

/// Errors that can occur when executing a call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CallError<E: fmt::Debug, ReqErr: crate::Error, RespErr: crate::Error> {
    /// The target endpoint refused the connection or could not be reached.
    #[snafu(display("No connection could be made to the target endpoint ({endpoint})"))]
    ConnectionRefused {
        /// The endpoint as reported by the transport, or `-` when unknown.
        endpoint: String,
    },
    /// The transport failed in a way this layer does not interpret.
    #[snafu(display("Failed to make HTTP request"))]
    Transport {
        /// The transport's own error, unchanged.
        source: ReqErr,
    },
    /// There was an error when reading the response body.
    #[snafu(display("Failed to read response body"))]
    ReadBody {
        /// The underlying error when reading the response body.
        source: RespErr,
    },
    /// The request payload could not be serialized as JSON.
    #[snafu(display("Failed to serialize request payload"))]
    SerializePayload {
        /// The underlying serialization error.
        source: serde_json::Error,
    },
    /// The request path does not form a valid URI against the base URL.
    #[snafu(display("Request path does not form a valid URI"))]
    InvalidPath {
        /// The underlying URI construction error.
        source: http::Error,
    },
    /// A header does not fit the wire format.
    #[snafu(display("Provided header was invalid"))]
    InvalidHeader {
        /// The underlying header conversion error.
        source: http::Error,
    },
    /// A response body was expected but none could be decoded.
    #[snafu(display("Response body was empty or undecodable: status={status}, body={body:?}"))]
    EmptyBody {
        /// The status code of the response.
        status: StatusCode,
        /// Lossy rendering of the raw body.
        body: String,
    },
    /// The request failed and its error body decoded as `E`.
    #[snafu(display("Request failed with status {status}: {body:?}"))]
    ErrorResponse {
        /// The status code of the response.
        status: StatusCode,
        /// The decoded error body.
        body: E,
    },
    /// The request failed with an error body that did not match `E`.
    #[snafu(display("Request failed with status {status} and an unrecognized error body: {body}"))]
    OpaqueErrorResponse {
        /// The status code of the response.
        status: StatusCode,
        /// The error body as parsed JSON.
        body: Value,
    },
    /// The caller's error override replaced the default error.
    #[snafu(transparent)]
    Overridden {
        /// The error chosen by the override.
        source: BoxedError,
    },
}

impl<E, ReqErr, RespErr> crate::Error for CallError<E, ReqErr, RespErr>
where
    E: fmt::Debug + Send + Sync + 'static,
    ReqErr: crate::Error,
    RespErr: crate::Error,
{
    fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionRefused { .. } => true,
            Self::Transport { source } => source.is_retryable(),
            Self::ReadBody { source } => source.is_retryable(),
            Self::SerializePayload { .. }
            | Self::InvalidPath { .. }
            | Self::InvalidHeader { .. } => false,
            Self::EmptyBody { status, .. }
            | Self::ErrorResponse { status, .. }
            | Self::OpaqueErrorResponse { status, .. } => status.is_server_error(),
            Self::Overridden { source } => source.is_retryable(),
        }
    }
}

/// Chooses the error for a failed response.
///
/// Precedence: an undecodable body is an empty-body failure; a body that
/// parses but does not match `E` is surfaced opaquely without consulting
/// the override; a body matching `E` goes to the override first and falls
/// back to the default error when the override is absent or declines.
pub(crate) fn translate<E, ReqErr, RespErr>(
    status: StatusCode,
    decoded: DecodedBody<E>,
    error_override: Option<&ErrorOverride<E>>,
) -> CallError<E, ReqErr, RespErr>
where
    E: fmt::Debug,
    ReqErr: crate::Error,
    RespErr: crate::Error,
{
    match decoded {
        DecodedBody::Empty { text } => CallError::EmptyBody { status, body: text },
        DecodedBody::Mismatched(value) => CallError::OpaqueErrorResponse {
            status,
            body: value,
        },
        DecodedBody::Decoded(body) => {
            if let Some(chosen) = error_override.and_then(|f| f(&body)) {
                return CallError::Overridden { source: chosen };
            }
            CallError::ErrorResponse { status, body }
        }
    }
}
