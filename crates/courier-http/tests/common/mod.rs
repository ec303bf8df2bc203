//! In-memory transports for lifecycle tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use courier_http::{
    Client, ClientConfig, Event, Exchange, Headers, Method, Transport, TransportError, WireRequest,
};
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::sync::Notify;

pub const HOST: &str = "http://localhost:9000";

/// A scripted response.
pub struct Reply {
    pub status: u16,
    pub headers: Headers,
    pub chunks: Vec<Result<Bytes, TransportError>>,
    /// Never end the body after the scripted chunks.
    pub stall: bool,
}

impl Reply {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            chunks: Vec::new(),
            stall: false,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn chunk(mut self, data: impl Into<Bytes>) -> Self {
        self.chunks.push(Ok(data.into()));
        self
    }

    pub fn fail(mut self, error: TransportError) -> Self {
        self.chunks.push(Err(error));
        self
    }

    pub fn stall(mut self) -> Self {
        self.stall = true;
        self
    }
}

type Handler = dyn Fn(&WireRequest) -> Result<Reply, TransportError> + Send + Sync;

/// Transport answering every request through a handler, recording what it
/// was asked.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    pub requests: Mutex<Vec<WireRequest>>,
    pub opened: Notify,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&WireRequest) -> Result<Reply, TransportError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            opened: Notify::new(),
        })
    }

    pub fn echo() -> Arc<Self> {
        Self::new(echo)
    }

    pub fn redirects() -> Arc<Self> {
        Self::new(redirects)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(WireRequest::request_target).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, request: WireRequest) -> Result<Exchange, TransportError> {
        self.requests.lock().push(request.clone());
        let reply = (self.handler)(&request);
        self.opened.notify_one();
        let reply = reply?;

        let chunks = stream::iter(reply.chunks);
        let body = if reply.stall {
            chunks.chain(stream::pending()).boxed()
        } else {
            chunks.boxed()
        };
        Ok(Exchange {
            status: reply.status,
            headers: reply.headers,
            body,
        })
    }
}

/// Echo server: the response body is the request as seen on the wire.
///
/// `x-status-code` picks the status; `x-connection-abort: true` drops the
/// connection.
pub fn echo(request: &WireRequest) -> Result<Reply, TransportError> {
    if request.headers.get("x-connection-abort") == Some("true") {
        return Err(TransportError::ConnectionClosed);
    }
    let status = request
        .headers
        .get("x-status-code")
        .and_then(|s| s.parse().ok())
        .unwrap_or(200);
    let reply = Reply::new(status)
        .header("Content-Type", "text/plain")
        .header("Request-Method", &request.method.as_str().to_ascii_lowercase());
    if request.method == Method::Head {
        return Ok(reply);
    }
    Ok(reply.chunk(request.to_http1()))
}

/// Redirect server: `/` redirects to `/redirected`, or into a numbered
/// chain of `x-redirects` hops ending with the hop count as the body.
pub fn redirects(request: &WireRequest) -> Result<Reply, TransportError> {
    let path = request.url.path();
    let max = request.headers.get("x-redirects").and_then(|v| v.parse::<u32>().ok());
    if path == "/redirected" {
        return Ok(Reply::new(200).header("Content-Type", "text/plain").chunk("redirected"));
    }
    if path == "/" {
        let next = if max.is_some() { "1" } else { "redirected" };
        return Ok(Reply::new(301)
            .header("Location", &format!("{HOST}/{next}"))
            .chunk("redirect"));
    }
    let count: u32 = path.trim_start_matches('/').parse().unwrap_or(0);
    let status = if count < max.unwrap_or(0) { 301 } else { 200 };
    Ok(Reply::new(status)
        .header("Location", &format!("{HOST}/{}", count + 1))
        .chunk(count.to_string()))
}

pub fn client(transport: Arc<ScriptedTransport>) -> Client {
    Client::with_transport(ClientConfig::default(), transport)
}

pub fn names(events: &[Event]) -> Vec<String> {
    events.iter().map(Event::name).collect()
}

/// Text of a completed response's delivered body.
pub fn text(event: &Event) -> String {
    match event {
        Event::Complete(Ok(response)) => response
            .body
            .as_text()
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(response.decoded.as_bytes()).into_owned()),
        other => panic!("expected a completed response, got {other:?}"),
    }
}
