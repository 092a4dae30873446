//! reqwest-backed [`Transport`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::TransportError;
use super::{FetchedResponse, ResponseHeaders, Transport};
use crate::user_agent;

/// HTTP transport with connection pooling.
///
/// Create once and share; cloning is cheap.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|source| TransportError::Client { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, headers), fields(url = %url))]
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<FetchedResponse, TransportError> {
        Url::parse(url).map_err(|_| TransportError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http_status(url, status.as_u16()));
        }

        let response_headers = ResponseHeaders::from(response.headers());
        let body = read_body(response, url).await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(FetchedResponse {
            status: status.as_u16(),
            headers: response_headers,
            body: body.freeze(),
        })
    }
}

/// Buffers the response body, chunk by chunk.
async fn read_body(response: reqwest::Response, url: &str) -> Result<BytesMut, TransportError> {
    let mut body = BytesMut::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::from_reqwest(url, e))?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
