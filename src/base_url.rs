//! A validated base URL.
//!
//! [`BaseUrl`] is a newtype over [`Uri`] that guarantees the URL has been
//! validated as absolute. It can be constructed from common string and URL
//! types via [`IntoBaseUrl`], and knows how to join per-call request paths
//! onto its own path.

use std::convert::Infallible;

use http::{Uri, uri::InvalidUri};
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use url::Url;

/// The candidate base URL was rejected.
#[derive(Debug, Snafu)]
pub enum InvalidBaseUrl {
    /// The candidate does not parse as a URI.
    #[snafu(transparent)]
    Malformed {
        /// The underlying parse error.
        source: InvalidUri,
    },
    /// The candidate parses but carries no scheme or no authority.
    #[snafu(display("Base URL is not absolute: {uri}"))]
    NotAbsolute {
        /// The rejected URI.
        uri: Uri,
    },
}

/// A validated base URL.
///
/// This is a newtype over [`Uri`] which can be constructed from common
/// string and URL types via [`IntoBaseUrl`]. Once constructed, it can be
/// freely cloned without re-validation. The URL is always absolute (scheme
/// and authority present); relative candidates such as `/api` are rejected
/// at construction rather than failing later, on the first call. Per-call
/// paths are resolved against it with [`BaseUrl::join`] semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Uri);

impl Serialize for BaseUrl {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.into_base_url().map_err(serde::de::Error::custom)
    }
}

impl BaseUrl {
    /// Validates a URI as an absolute base URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBaseUrl::NotAbsolute`] if `uri` lacks a scheme or
    /// an authority.
    pub fn new(uri: Uri) -> Result<Self, InvalidBaseUrl> {
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(InvalidBaseUrl::NotAbsolute { uri });
        }
        Ok(Self(uri))
    }

    /// Returns the inner [`Uri`].
    #[must_use]
    pub fn as_uri(&self) -> &Uri {
        &self.0
    }

    /// Consumes the [`BaseUrl`] and returns the inner [`Uri`].
    #[must_use]
    pub fn into_uri(self) -> Uri {
        self.0
    }

    /// Joins a request path onto the base URL's path.
    ///
    /// A single `/` between the two is normalized (a trailing slash on the
    /// base and a leading slash on the path both collapse), and a query
    /// string carried by `path` is preserved. Any query on the base URL
    /// itself is discarded.
    pub(crate) fn join(&self, path: &str) -> Result<Uri, http::Error> {
        let base_path = self.0.path();
        let cleaned_base = base_path.strip_suffix('/').unwrap_or(base_path);
        let cleaned_path = path.strip_prefix('/').unwrap_or(path);

        let joined = if cleaned_path.is_empty() {
            cleaned_base.to_owned()
        } else {
            format!("{cleaned_base}/{cleaned_path}")
        };
        let joined = if joined.is_empty() {
            "/".to_owned()
        } else {
            joined
        };

        let mut parts = self.0.clone().into_parts();
        parts.path_and_query = Some(joined.try_into()?);
        Ok(Uri::from_parts(parts)?)
    }
}

/// Conversion trait for types that can be turned into a [`BaseUrl`].
pub trait IntoBaseUrl {
    /// The error type returned if the conversion fails.
    type Error;

    /// Attempts to convert this value into a [`BaseUrl`].
    fn into_base_url(self) -> Result<BaseUrl, Self::Error>;
}

impl IntoBaseUrl for BaseUrl {
    type Error = Infallible;

    fn into_base_url(self) -> Result<BaseUrl, Self::Error> {
        Ok(self)
    }
}

impl IntoBaseUrl for Uri {
    type Error = InvalidBaseUrl;

    fn into_base_url(self) -> Result<BaseUrl, Self::Error> {
        BaseUrl::new(self)
    }
}

impl IntoBaseUrl for Url {
    type Error = InvalidBaseUrl;

    fn into_base_url(self) -> Result<BaseUrl, Self::Error> {
        BaseUrl::new(self.as_str().parse::<Uri>()?)
    }
}

impl IntoBaseUrl for &str {
    type Error = InvalidBaseUrl;

    fn into_base_url(self) -> Result<BaseUrl, Self::Error> {
        BaseUrl::new(self.parse::<Uri>()?)
    }
}

impl IntoBaseUrl for String {
    type Error = InvalidBaseUrl;

    fn into_base_url(self) -> Result<BaseUrl, Self::Error> {
        BaseUrl::new(self.parse::<Uri>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> BaseUrl {
        s.into_base_url().unwrap()
    }

    #[test]
    fn test_join_plain() {
        let url = base("http://localhost:7049");
        assert_eq!(
            url.join("/health").unwrap().to_string(),
            "http://localhost:7049/health"
        );
        assert_eq!(
            url.join("health").unwrap().to_string(),
            "http://localhost:7049/health"
        );
    }

    #[test]
    fn test_join_normalizes_slashes() {
        let url = base("http://example.org/api/");
        assert_eq!(
            url.join("/v1/users").unwrap().to_string(),
            "http://example.org/api/v1/users"
        );
        assert_eq!(
            url.join("v1/users").unwrap().to_string(),
            "http://example.org/api/v1/users"
        );
    }

    #[test]
    fn test_join_empty_path_keeps_base() {
        let url = base("http://example.org/api");
        assert_eq!(
            url.join("").unwrap().to_string(),
            "http://example.org/api"
        );
    }

    #[test]
    fn test_join_preserves_query() {
        let url = base("http://example.org");
        assert_eq!(
            url.join("/search?q=alpha&limit=2").unwrap().to_string(),
            "http://example.org/search?q=alpha&limit=2"
        );
    }

    #[test]
    fn test_join_rejects_invalid_path() {
        let url = base("http://example.org");
        assert!(url.join("/with space").is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            "http://example.org/a".into_base_url().ok(),
            Some(base("http://example.org/a"))
        );
        assert_eq!(
            Url::parse("http://example.org/a")
                .unwrap()
                .into_base_url()
                .ok(),
            Some(base("http://example.org/a"))
        );
        assert!("http://exa mple.org".into_base_url().is_err());
    }

    #[test]
    fn test_rejects_non_absolute_candidates() {
        let err = "/api".into_base_url().unwrap_err();
        assert!(matches!(err, InvalidBaseUrl::NotAbsolute { uri } if uri == "/api"));

        let err = "example.org".into_base_url().unwrap_err();
        assert!(matches!(err, InvalidBaseUrl::NotAbsolute { uri } if uri == "example.org"));

        let err = Uri::from_static("/api").into_base_url().unwrap_err();
        assert!(matches!(err, InvalidBaseUrl::NotAbsolute { .. }));

        assert!(serde_json::from_str::<BaseUrl>("\"/api\"").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let url = base("http://example.org/api");
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"http://example.org/api\"");
        let back: BaseUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
    }
}
