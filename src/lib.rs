//! Implements a typed HTTP call adapter.

#![forbid(unsafe_code)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod base_url;
mod body;
mod call;
mod client;
mod connect;
mod error;
mod header;
pub mod http;

pub use base_url::{BaseUrl, IntoBaseUrl, InvalidBaseUrl};
pub use call::{CallError, CallOptions, CallResult, ErrorOverride};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{BoxedError, Error};
pub use header::{EmptyHeaderName, Header, HeaderScope, HeaderSet};

/// Documentation
pub mod _documentation {
    #[doc = include_str!("../README.md")]
    mod readme {}
    #[doc = include_str!("../CHANGELOG.md")]
    pub mod changelog {}
}

pub use bytes::Bytes;
