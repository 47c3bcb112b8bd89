use std::sync::LazyLock;

use bytes::Bytes;
use http::{Request, StatusCode};
use snafu::Snafu;

use super::{Transport, TransportResponse};

/// Errors from the bundled reqwest transport.
///
/// Connection-refused failures are rendered in the message shape the
/// adapter's classifier recognizes, naming the request URI's authority;
/// everything else displays exactly as reqwest renders it.
#[derive(Debug, Snafu)]
pub enum ReqwestTransportError {
    /// The endpoint refused the connection or could not be reached.
    #[snafu(display("{}", refused_message(endpoint.as_deref())))]
    Refused {
        /// The authority of the request URI, when the URI had one.
        endpoint: Option<String>,
        /// The underlying reqwest error.
        source: reqwest::Error,
    },
    /// Any other reqwest failure.
    #[snafu(transparent)]
    Other {
        /// The underlying reqwest error.
        source: reqwest::Error,
    },
}

impl crate::Error for ReqwestTransportError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Refused { .. } => true,
            Self::Other { source } => source.is_retryable(),
        }
    }
}

fn refused_message(endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => {
            format!("No connection could be made because the target endpoint refused it ({endpoint})")
        }
        None => "No connection could be made because the target endpoint refused it".to_owned(),
    }
}

fn wrap_send_error(source: reqwest::Error, endpoint: Option<String>) -> ReqwestTransportError {
    if source.is_connect() {
        ReqwestTransportError::Refused { endpoint, source }
    } else {
        ReqwestTransportError::Other { source }
    }
}

impl Transport for reqwest::Client {
    type Error = ReqwestTransportError;
    type Response = reqwest::Response;

    /// Dispatches an `http::Request` by converting it into a
    /// `reqwest::Request` and sending it.
    async fn send(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        let endpoint = request.uri().authority().map(ToString::to_string);
        let (parts, body) = request.into_parts();
        let reqwest_request = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .build()
            .map_err(|source| wrap_send_error(source, endpoint.clone()))?;

        reqwest::Client::execute(self, reqwest_request)
            .await
            .map_err(|source| wrap_send_error(source, endpoint))
    }
}

impl Transport for LazyLock<reqwest::Client> {
    type Error = ReqwestTransportError;
    type Response = reqwest::Response;

    async fn send(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        <reqwest::Client as Transport>::send(self, request).await
    }
}

impl TransportResponse for reqwest::Response {
    type Error = reqwest::Error;

    /// Returns the HTTP status code of the `reqwest::Response`.
    fn status(&self) -> StatusCode {
        self.status()
    }

    /// Consumes the `reqwest::Response` and reads the full body.
    async fn body(self) -> Result<Bytes, Self::Error> {
        self.bytes().await
    }
}

impl crate::Error for reqwest::Error {
    fn is_retryable(&self) -> bool {
        self.is_connect()
    }
}
