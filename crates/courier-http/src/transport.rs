//! Transport seam between the lifecycle engine and the network.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};

use crate::error::TransportError;
use crate::headers::{names, Headers};
use crate::request::{Method, WireRequest};

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Some(Duration::from_secs(30)),
            pool_max_idle_per_host: 10,
        }
    }
}

/// A response whose body is still arriving.
///
/// The body stream ends at end-of-body. An `Err` item means the exchange
/// failed mid-transfer.
pub struct Exchange {
    pub status: u16,
    pub headers: Headers,
    pub body: BoxStream<'static, Result<Bytes, TransportError>>,
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends a [`WireRequest`] and yields the response as it arrives.
///
/// Transports must not follow redirects or undo content encoding; the
/// engine does both.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, request: WireRequest) -> Result<Exchange, TransportError>;
}

/// Build a reqwest client suited to the engine: no redirects, no automatic
/// decompression.
pub fn build_client(config: &TransportConfig) -> Result<Client, TransportError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(Policy::none())
        .no_gzip()
        .no_deflate();

    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(TransportError::ClientBuild)
}

/// [`Transport`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Create a transport with default config.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&TransportConfig::default())
    }

    /// Create a transport with custom config.
    pub fn with_config(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            inner: build_client(config)?,
        })
    }

    /// Wrap an existing client. It should not follow redirects.
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn open(&self, request: WireRequest) -> Result<Exchange, TransportError> {
        let WireRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.inner.request(to_reqwest_method(method), url);
        for (name, value) in headers.iter() {
            // Derived from the body by hyper.
            if name.eq_ignore_ascii_case(names::CONTENT_LENGTH) {
                continue;
            }
            builder = builder.header(name, value);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        tracing::trace!(status, "response head received");
        let body = response.bytes_stream().map_err(TransportError::from).boxed();
        Ok(Exchange { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.pool_max_idle_per_host, 10);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(&TransportConfig::default()).is_ok());
        let config = TransportConfig {
            request_timeout: None,
            ..TransportConfig::default()
        };
        assert!(ReqwestTransport::with_config(&config).is_ok());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest_method(Method::Head), reqwest::Method::HEAD);
    }
}
