//! Client and the request lifecycle engine.

use std::future::Future;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use courier_common_log::spans::{self, Timer};
use futures_util::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;
use url::Url;

use crate::decode;
use crate::error::{HttpError, TransportError};
use crate::event::{self, Event};
use crate::handle::RequestHandle;
use crate::headers::{names, Headers};
use crate::parser::{self, ParseOutcome, ParserRegistry};
use crate::redirect;
use crate::request::{Decoding, Method, ParserChoice, RequestBody, RequestOptions, WireRequest};
use crate::response::{Body, Response};
use crate::transport::{ReqwestTransport, Transport, TransportConfig};

/// Client-wide defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relative request URLs are resolved against this.
    pub base_url: Option<Url>,
    /// Sent with every request; request headers win.
    pub headers: Headers,
    pub user_agent: String,
    pub follow_redirects: bool,
    pub max_redirects: Option<u32>,
    pub decoding: Decoding,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: Headers::new(),
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            follow_redirects: true,
            max_redirects: None,
            decoding: Decoding::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    /// `Accept: */*` and `User-Agent`, overlaid with configured headers.
    pub fn default_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert(names::ACCEPT, "*/*");
        headers.insert(names::USER_AGENT, self.user_agent.as_str());
        headers.merge(&self.headers);
        headers
    }
}

/// Issues requests and runs their lifecycles.
///
/// Cloning is cheap; clones share the transport and parser registry.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    parsers: Arc<ParserRegistry>,
    config: Arc<ClientConfig>,
    defaults: Arc<Headers>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("parsers", &self.parsers)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client with default config over reqwest.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom config over reqwest.
    pub fn with_config(config: ClientConfig) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::with_config(&config.transport)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport, with a fresh parser registry.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let defaults = Arc::new(config.default_headers());
        Self {
            transport,
            parsers: Arc::new(ParserRegistry::new()),
            config: Arc::new(config),
            defaults,
        }
    }

    /// Use `parsers` instead of this client's registry.
    pub fn with_parsers(mut self, parsers: Arc<ParserRegistry>) -> Self {
        self.parsers = parsers;
        self
    }

    /// The shared parser registry. Registrations affect every client that
    /// shares it.
    pub fn parsers(&self) -> &Arc<ParserRegistry> {
        &self.parsers
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Options for `method` on `url` carrying this client's defaults.
    pub fn request(&self, method: Method, url: &str) -> RequestOptions {
        let url = match &self.config.base_url {
            Some(base) if Url::parse(url).is_err() => base
                .join(url)
                .map(String::from)
                .unwrap_or_else(|_| url.to_string()),
            _ => url.to_string(),
        };
        let mut options = RequestOptions::new(method, url)
            .decoding(self.config.decoding)
            .follow_redirects(self.config.follow_redirects);
        options.max_redirects = self.config.max_redirects;
        options
    }

    /// Start a request.
    ///
    /// Configuration errors are returned here and never reach the handle.
    /// Otherwise the lifecycle runs on a spawned task and reports through
    /// the returned handle. Must be called within a tokio runtime.
    pub fn execute(&self, options: RequestOptions) -> Result<RequestHandle, HttpError> {
        let wire = options.build(&self.defaults)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (abort_tx, abort_rx) = watch::channel(false);

        let span = spans::request_span(options.method.as_str(), wire.url.as_str());
        let lifecycle = Lifecycle {
            transport: Arc::clone(&self.transport),
            parsers: Arc::clone(&self.parsers),
            defaults: Arc::clone(&self.defaults),
            abort: abort_rx,
            events: events_tx,
        };
        tokio::spawn(lifecycle.run(options, wire).instrument(span));

        Ok(RequestHandle::new(events_rx, Arc::new(abort_tx)))
    }

    pub fn get(&self, url: &str) -> Result<RequestHandle, HttpError> {
        self.execute(self.request(Method::Get, url))
    }

    pub fn post(&self, url: &str, body: impl Into<RequestBody>) -> Result<RequestHandle, HttpError> {
        self.execute(self.request(Method::Post, url).body(body))
    }

    pub fn put(&self, url: &str, body: impl Into<RequestBody>) -> Result<RequestHandle, HttpError> {
        self.execute(self.request(Method::Put, url).body(body))
    }

    pub fn patch(&self, url: &str, body: impl Into<RequestBody>) -> Result<RequestHandle, HttpError> {
        self.execute(self.request(Method::Patch, url).body(body))
    }

    pub fn del(&self, url: &str) -> Result<RequestHandle, HttpError> {
        self.execute(self.request(Method::Delete, url))
    }

    pub fn head(&self, url: &str) -> Result<RequestHandle, HttpError> {
        self.execute(self.request(Method::Head, url))
    }

    /// POST `data` serialized as JSON.
    pub fn post_json<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<RequestHandle, HttpError> {
        self.json(Method::Post, url, data)
    }

    /// PUT `data` serialized as JSON.
    pub fn put_json<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<RequestHandle, HttpError> {
        self.json(Method::Put, url, data)
    }

    /// PATCH `data` serialized as JSON.
    pub fn patch_json<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<RequestHandle, HttpError> {
        self.json(Method::Patch, url, data)
    }

    fn json<T: Serialize + ?Sized>(&self, method: Method, url: &str, data: &T) -> Result<RequestHandle, HttpError> {
        let value = serde_json::to_value(data).map_err(HttpError::JsonEncode)?;
        self.execute(self.request(method, url).json(value))
    }
}

/// One logical request: its attempts, their redirects and the final events.
struct Lifecycle {
    transport: Arc<dyn Transport>,
    parsers: Arc<ParserRegistry>,
    defaults: Arc<Headers>,
    abort: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<Event>,
}

/// A received response, sealed at end-of-body.
struct Sealed {
    status: u16,
    headers: Headers,
    url: Url,
    raw: Bytes,
}

impl Lifecycle {
    async fn run(mut self, options: RequestOptions, wire: WireRequest) {
        let timer = Timer::start("request");
        let events = match self.drive(options, wire).await {
            Ok(response) => {
                let span = tracing::Span::current();
                span.record("status", response.status);
                span.record("redirects", response.redirects);
                tracing::info!(status = response.status, "request completed");
                event::response_events(response)
            }
            Err(e) => {
                spans::record_error(&e);
                tracing::warn!(error = %e, "request failed");
                event::error_events(e)
            }
        };
        timer.finish();

        for event in events {
            if self.events.send(event).is_err() {
                tracing::debug!("request handle dropped before completion");
                break;
            }
        }
    }

    /// The attempt loop. Only the last attempt produces a response.
    async fn drive(&mut self, mut options: RequestOptions, wire: WireRequest) -> Result<Response, HttpError> {
        let mut next_wire = Some(wire);
        let mut depth = 0u32;

        loop {
            let wire = match next_wire.take() {
                Some(wire) => wire,
                None => options.build(&self.defaults)?,
            };
            let attempt = spans::attempt_span(depth, wire.url.as_str());
            let sealed = self.attempt(wire).instrument(attempt).await?;

            if let Some(location) = redirect::location(sealed.status, &sealed.headers) {
                if redirect::should_follow(&options, depth) {
                    tracing::info!(status = sealed.status, location, depth, "following redirect");
                    options = redirect::next_options(&options, &sealed.url, location)?;
                    depth += 1;
                    continue;
                }
                tracing::debug!(status = sealed.status, depth, "not following redirect");
            }

            return self.finish(&options, sealed, depth).await;
        }
    }

    /// SENT and RECEIVING: open the exchange and collect the body.
    async fn attempt(&mut self, wire: WireRequest) -> Result<Sealed, HttpError> {
        let url = wire.url.clone();
        let head_only = wire.method == Method::Head;
        tracing::debug!(method = %wire.method, "sending request");

        let transport = Arc::clone(&self.transport);
        let exchange = self.cancellable(transport.open(wire)).await??;
        tracing::debug!(status = exchange.status, "response head received");

        let raw = if head_only {
            Bytes::new()
        } else {
            self.receive(exchange.body).await?
        };

        Ok(Sealed {
            status: exchange.status,
            headers: exchange.headers,
            url,
            raw,
        })
    }

    async fn receive(
        &mut self,
        mut body: BoxStream<'static, Result<Bytes, TransportError>>,
    ) -> Result<Bytes, HttpError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.cancellable(body.next()).await? {
            let chunk = chunk?;
            tracing::trace!(len = chunk.len(), "chunk received");
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    /// DECODING, PARSING and CLASSIFIED for the final attempt.
    async fn finish(&mut self, options: &RequestOptions, sealed: Sealed, redirects: u32) -> Result<Response, HttpError> {
        let decoded = decode::decode(&sealed.raw, &sealed.headers, options.decoding)?;

        let chosen = match options.parser {
            ParserChoice::Auto => sealed
                .headers
                .get(names::CONTENT_TYPE)
                .and_then(|content_type| self.parsers.resolve(content_type)),
            choice => parser::builtin(choice),
        };

        // Parsers see the projection, so a base64 or binary mode reaches them encoded.
        let (body, parse_error) = match self.cancellable(parser::run(chosen, decoded.as_bytes())).await? {
            ParseOutcome::Parsed(value) => (Body::Parsed(value), None),
            ParseOutcome::Unmatched => (Body::Raw(decoded.clone()), None),
            ParseOutcome::Failed(e) => {
                tracing::warn!(error = %e, "failed to parse response body");
                (Body::Raw(decoded.clone()), Some(e.to_string()))
            }
        };

        Ok(Response {
            status: sealed.status,
            headers: sealed.headers,
            url: sealed.url,
            redirects,
            raw: sealed.raw,
            decoded,
            body,
            parse_error,
        })
    }

    /// Race `fut` against the abort signal. A dropped handle counts as an
    /// abort.
    async fn cancellable<F: Future>(&mut self, fut: F) -> Result<F::Output, HttpError> {
        if *self.abort.borrow() {
            return Err(HttpError::Aborted);
        }
        let abort = &mut self.abort;
        tokio::select! {
            biased;
            _ = wait_for_abort(abort) => Err(HttpError::Aborted),
            out = fut => Ok(out),
        }
    }
}

async fn wait_for_abort(abort: &mut watch::Receiver<bool>) {
    loop {
        if abort.changed().await.is_err() || *abort.borrow() {
            return;
        }
    }
}
