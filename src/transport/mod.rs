//! HTTP transport seam for authenticated downloads.
//!
//! The lifecycle controller issues exactly one GET per accepted click through
//! the [`Transport`] trait. [`HttpTransport`] is the reqwest-backed
//! implementation; tests and embedders may supply their own.
//!
//! # Example
//!
//! ```no_run
//! use auth_href::transport::{HttpTransport, Transport};
//! use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new()?;
//! let mut headers = HeaderMap::new();
//! headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
//! let response = transport.get("https://example.com/report.pdf", &headers).await?;
//! println!("{} bytes", response.body.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

pub use client::HttpTransport;
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::TransportError;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;

/// Fetches a resource with the given request headers.
///
/// # Object Safety
///
/// Uses `async_trait` so the controller can hold an `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET request and returns the full binary body.
    async fn get(&self, url: &str, headers: &HeaderMap)
    -> Result<FetchedResponse, TransportError>;
}

/// A completed response, body fully buffered.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as delivered by the transport.
    pub headers: ResponseHeaders,
    /// Response body.
    pub body: Bytes,
}

impl FetchedResponse {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: ResponseHeaders::default(),
            body: body.into(),
        }
    }

    /// Adds a header, keeping the name exactly as given.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type of the body, from `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}

/// Response headers with case-insensitive lookup.
///
/// Names are stored as delivered; transports do not agree on casing, so
/// lookups never rely on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    /// Appends a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared ASCII case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Number of stored headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no headers are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl From<&HeaderMap> for ResponseHeaders {
    /// Converts reqwest headers. Raw UTF-8 values (servers often send
    /// `filename="résumé.pdf"` unencoded) are kept; invalid bytes become U+FFFD.
    fn from(headers: &HeaderMap) -> Self {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}
