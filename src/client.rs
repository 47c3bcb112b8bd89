//! The call adapter and its request pipeline.
//!
//! [`ApiClient`] owns a base URL, a set of default headers, and a transport.
//! Every call runs the same pipeline: scoped headers overlay a call-local
//! copy of the defaults, the request is built and dispatched, transport
//! failures are classified, and the response body is decoded and translated
//! into the typed outcome. A failed call never poisons the adapter; it can
//! be reused immediately.

use std::fmt;

use bon::Builder;
use bytes::Bytes;
use http::{HeaderValue, Request, StatusCode, header::CONTENT_TYPE};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt as _;

use crate::{
    BaseUrl, IntoBaseUrl,
    body::{DecodedBody, decode},
    call::{
        CallOptions, CallResult, ConnectionRefusedSnafu, EmptyBodySnafu, InvalidHeaderSnafu,
        InvalidPathSnafu, ReadBodySnafu, RequestDescriptor, SerializePayloadSnafu, TransportSnafu,
        Verb, translate,
    },
    connect::refused_endpoint,
    header::{Header, HeaderScope, HeaderSet},
    http::{Transport, TransportResponse},
};

/// A typed HTTP call adapter over a pluggable transport.
///
/// The adapter resolves per-call paths against its base URL, sends its
/// default headers with every call, serializes payloads as JSON, and turns
/// every outcome into either a decoded success value or one [`CallError`]
/// (see [`CallResult`]). Success and error body shapes are chosen per call
/// via type parameters; `serde_json::Value` works as a catch-all error
/// shape when no dedicated one exists.
///
/// Calls borrow the adapter immutably, so one instance can serve many
/// concurrent calls; headers scoped to a call never affect another.
///
/// [`CallError`]: crate::CallError
#[derive(Debug, Clone, Builder)]
#[builder(state_mod(name = "builder"))]
pub struct ApiClient<C: Transport> {
    /// The base URL every call path is resolved against.
    #[builder(setters(name = "base_url_value"))]
    base_url: BaseUrl,

    /// Headers sent with every call for the adapter's lifetime.
    #[builder(default, with = |headers: impl IntoIterator<Item = Header>| headers.into_iter().collect())]
    default_headers: HeaderSet,

    /// The transport requests are dispatched through.
    transport: C,
}

impl<C: Transport, S: builder::State> ApiClientBuilder<C, S> {
    /// Sets the base URL.
    ///
    /// Accepts any type that implements [`IntoBaseUrl`], including `&str`,
    /// [`String`], [`Url`](url::Url), [`Uri`](http::Uri), and [`BaseUrl`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed as a valid URI or is
    /// not absolute.
    pub fn base_url<U: IntoBaseUrl>(
        self,
        url: U,
    ) -> Result<ApiClientBuilder<C, builder::SetBaseUrl<S>>, U::Error>
    where
        S::BaseUrl: builder::IsUnset,
    {
        Ok(self.base_url_value(url.into_base_url()?))
    }
}

impl<C: Transport> ApiClient<C> {
    /// The base URL calls are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// The headers sent with every call.
    #[must_use]
    pub fn default_headers(&self) -> &HeaderSet {
        &self.default_headers
    }

    /// Issues a GET and decodes the response body as `S`.
    ///
    /// # Errors
    ///
    /// See [`CallError`](crate::CallError) for the failure taxonomy: refused
    /// connections, other transport failures, empty or mismatched bodies,
    /// and failed statuses with their decoded error bodies.
    pub async fn get<S, E>(&self, path: &str, options: CallOptions<E>) -> CallResult<S, E, C>
    where
        S: DeserializeOwned,
        E: DeserializeOwned + fmt::Debug,
    {
        self.execute(
            RequestDescriptor {
                verb: Verb::Get,
                path,
                payload: None,
            },
            options,
        )
        .await
    }

    /// Issues a POST with a JSON payload and decodes the response body as `S`.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus payload serialization failures.
    pub async fn post<S, E, P>(
        &self,
        path: &str,
        payload: &P,
        options: CallOptions<E>,
    ) -> CallResult<S, E, C>
    where
        S: DeserializeOwned,
        E: DeserializeOwned + fmt::Debug,
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(payload).context(SerializePayloadSnafu)?;
        self.execute(
            RequestDescriptor {
                verb: Verb::Post,
                path,
                payload: Some(payload.into()),
            },
            options,
        )
        .await
    }

    /// Issues a PUT, with the JSON payload omitted entirely when `None`.
    ///
    /// # Errors
    ///
    /// As [`post`](Self::post).
    pub async fn put<S, E, P>(
        &self,
        path: &str,
        payload: Option<&P>,
        options: CallOptions<E>,
    ) -> CallResult<S, E, C>
    where
        S: DeserializeOwned,
        E: DeserializeOwned + fmt::Debug,
        P: Serialize + ?Sized,
    {
        let payload: Option<Bytes> = match payload {
            Some(payload) => Some(
                serde_json::to_vec(payload)
                    .context(SerializePayloadSnafu)?
                    .into(),
            ),
            None => None,
        };
        self.execute(
            RequestDescriptor {
                verb: Verb::Put,
                path,
                payload,
            },
            options,
        )
        .await
    }

    /// Issues a DELETE and decodes the response body as `S`.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub async fn delete<S, E>(&self, path: &str, options: CallOptions<E>) -> CallResult<S, E, C>
    where
        S: DeserializeOwned,
        E: DeserializeOwned + fmt::Debug,
    {
        self.execute(
            RequestDescriptor {
                verb: Verb::Delete,
                path,
                payload: None,
            },
            options,
        )
        .await
    }

    /// Issues a POST and ignores the success body, so empty 2xx responses
    /// succeed. Failed responses translate exactly as in [`post`](Self::post).
    ///
    /// # Errors
    ///
    /// As [`post`](Self::post), minus success-body decoding failures.
    pub async fn post_unit<E, P>(
        &self,
        path: &str,
        payload: &P,
        options: CallOptions<E>,
    ) -> CallResult<(), E, C>
    where
        E: DeserializeOwned + fmt::Debug,
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(payload).context(SerializePayloadSnafu)?;
        self.execute_unit(
            RequestDescriptor {
                verb: Verb::Post,
                path,
                payload: Some(payload.into()),
            },
            options,
        )
        .await
    }

    /// Issues a PUT and ignores the success body.
    ///
    /// # Errors
    ///
    /// As [`put`](Self::put), minus success-body decoding failures.
    pub async fn put_unit<E, P>(
        &self,
        path: &str,
        payload: Option<&P>,
        options: CallOptions<E>,
    ) -> CallResult<(), E, C>
    where
        E: DeserializeOwned + fmt::Debug,
        P: Serialize + ?Sized,
    {
        let payload: Option<Bytes> = match payload {
            Some(payload) => Some(
                serde_json::to_vec(payload)
                    .context(SerializePayloadSnafu)?
                    .into(),
            ),
            None => None,
        };
        self.execute_unit(
            RequestDescriptor {
                verb: Verb::Put,
                path,
                payload,
            },
            options,
        )
        .await
    }

    /// Issues a DELETE and ignores the success body.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), minus success-body decoding failures.
    pub async fn delete_unit<E>(&self, path: &str, options: CallOptions<E>) -> CallResult<(), E, C>
    where
        E: DeserializeOwned + fmt::Debug,
    {
        self.execute_unit(
            RequestDescriptor {
                verb: Verb::Delete,
                path,
                payload: None,
            },
            options,
        )
        .await
    }

    async fn execute<S, E>(
        &self,
        descriptor: RequestDescriptor<'_>,
        options: CallOptions<E>,
    ) -> CallResult<S, E, C>
    where
        S: DeserializeOwned,
        E: DeserializeOwned + fmt::Debug,
    {
        let CallOptions {
            headers,
            error_override,
        } = options;
        let (status, body) = self.dispatch(descriptor, &headers).await?;

        if status.is_success() {
            match decode::<S>(&body) {
                DecodedBody::Decoded(value) => Ok(value),
                DecodedBody::Mismatched(value) => EmptyBodySnafu {
                    status,
                    body: value.to_string(),
                }
                .fail(),
                DecodedBody::Empty { text } => EmptyBodySnafu { status, body: text }.fail(),
            }
        } else {
            Err(translate(status, decode::<E>(&body), error_override.as_ref()))
        }
    }

    async fn execute_unit<E>(
        &self,
        descriptor: RequestDescriptor<'_>,
        options: CallOptions<E>,
    ) -> CallResult<(), E, C>
    where
        E: DeserializeOwned + fmt::Debug,
    {
        let CallOptions {
            headers,
            error_override,
        } = options;
        let (status, body) = self.dispatch(descriptor, &headers).await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(translate(status, decode::<E>(&body), error_override.as_ref()))
        }
    }

    async fn dispatch<E: fmt::Debug>(
        &self,
        descriptor: RequestDescriptor<'_>,
        scoped: &[Header],
    ) -> CallResult<(StatusCode, Bytes), E, C> {
        let RequestDescriptor {
            verb,
            path,
            payload,
        } = descriptor;
        let uri = self.base_url.join(path).context(InvalidPathSnafu)?;

        let mut effective = self.default_headers.clone();
        let scope = HeaderScope::apply(&mut effective, scoped);
        let header_map = scope.headers().to_header_map().context(InvalidHeaderSnafu)?;

        let (mut parts, ()) = Request::new(()).into_parts();
        parts.method = verb.method();
        parts.uri = uri;
        parts.headers = header_map;
        if payload.is_some() {
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let request = Request::from_parts(parts, payload.unwrap_or_default());

        debug!("dispatching {verb} {}", request.uri());
        let outcome = self.transport.send(request).await;
        // Scoped headers are released as soon as dispatch resolves; the
        // guard's Drop covers the earlier error returns.
        drop(scope);

        let response = match outcome {
            Ok(response) => response,
            Err(source) => {
                if let Some(endpoint) = refused_endpoint(&source.to_string()) {
                    debug!("connection refused by {endpoint}");
                    return ConnectionRefusedSnafu { endpoint }.fail();
                }
                return Err(source).context(TransportSnafu);
            }
        };

        let status = response.status();
        let body = response.body().await.context(ReadBodySnafu)?;
        debug!("received {status} with {} body bytes", body.len());

        Ok((status, body))
    }
}
