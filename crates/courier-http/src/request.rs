//! Request options and the resolved wire request.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::body;
use crate::error::HttpError;
use crate::headers::{names, Headers};

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    /// Upper-case wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    /// Parse from string, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" | "DEL" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the response body is represented after decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decoding {
    /// UTF-8 text.
    #[default]
    Utf8,
    /// Raw bytes, verbatim.
    Buffer,
    /// One char per byte, no charset interpretation.
    Binary,
    /// Standard base64 text of the bytes.
    Base64,
}

impl Decoding {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "utf8" | "utf-8" => Some(Self::Utf8),
            "buffer" => Some(Self::Buffer),
            "binary" | "latin1" => Some(Self::Binary),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }
}

/// Which content parser a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserChoice {
    /// Pick a parser from the shared registry by content-type.
    #[default]
    Auto,
    Json,
    Xml,
    Yaml,
    /// Never parse; deliver the decoded body.
    None,
}

/// A file carried in a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FilePart {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// One value of a form body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    /// A scalar rendered to its string form. Arrays and objects are rejected.
    Value(serde_json::Value),
    /// A file part; only valid for multipart bodies.
    File(FilePart),
}

impl From<serde_json::Value> for FormField {
    fn from(value: serde_json::Value) -> Self {
        FormField::Value(value)
    }
}

impl From<FilePart> for FormField {
    fn from(file: FilePart) -> Self {
        FormField::File(file)
    }
}

macro_rules! form_field_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FormField {
            fn from(value: $ty) -> Self {
                FormField::Value(serde_json::Value::from(value))
            }
        })*
    };
}

form_field_from!(&str, String, bool, i32, i64, u32, u64, f64);

/// Request body payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as-is.
    Text(String),
    /// Sent as-is.
    Bytes(Bytes),
    /// Form-encoded, or multipart when [`RequestOptions::multipart`] is set.
    Form(Vec<(String, FormField)>),
    /// JSON-encoded with `Content-Type: application/json`.
    Json(serde_json::Value),
}

impl RequestBody {
    /// Build a form body from key/value pairs, keeping their order.
    pub fn form<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FormField>,
    {
        RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes.into())
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

/// Everything a caller can say about one logical request.
///
/// Options are never mutated once an attempt starts; redirects derive a new
/// value through [`crate::redirect::next_options`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub url: String,
    /// Merged into the URL query string, after any existing pairs.
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Explicit headers; these win over computed ones.
    pub headers: Headers,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sent as a bearer token when no basic credentials are present.
    pub access_token: Option<String>,
    pub multipart: bool,
    pub decoding: Decoding,
    pub follow_redirects: bool,
    /// `None` follows without limit.
    pub max_redirects: Option<u32>,
    pub parser: ParserChoice,
}

impl RequestOptions {
    /// Create options for `method` on `url` with default settings.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            headers: Headers::new(),
            username: None,
            password: None,
            access_token: None,
            multipart: false,
            decoding: Decoding::default(),
            follow_redirects: true,
            max_redirects: None,
            parser: ParserChoice::default(),
        }
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a form body.
    pub fn form<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FormField>,
    {
        self.body(RequestBody::form(fields))
    }

    /// Set a JSON body.
    pub fn json(self, value: serde_json::Value) -> Self {
        self.body(RequestBody::Json(value))
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add basic authorization.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Add bearer token authorization.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    pub fn decoding(mut self, decoding: Decoding) -> Self {
        self.decoding = decoding;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn max_redirects(mut self, limit: u32) -> Self {
        self.max_redirects = Some(limit);
        self
    }

    pub fn parser(mut self, parser: ParserChoice) -> Self {
        self.parser = parser;
        self
    }

    /// Credentials from explicit options, else from the URL userinfo.
    pub fn credentials(&self, url: &Url) -> Option<(String, String)> {
        if let Some(username) = &self.username {
            return Some((username.clone(), self.password.clone().unwrap_or_default()));
        }
        if !url.username().is_empty() {
            return Some((
                url.username().to_string(),
                url.password().unwrap_or_default().to_string(),
            ));
        }
        None
    }

    /// Resolve these options into the request handed to the transport.
    ///
    /// `defaults` are applied first, then computed headers
    /// (authorization, content type and length), then explicit headers.
    pub fn build(&self, defaults: &Headers) -> Result<WireRequest, HttpError> {
        let mut url = Url::parse(&self.url).map_err(|source| HttpError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }

        let credentials = self.credentials(&url);
        let _ = url.set_username("");
        let _ = url.set_password(None);

        let encoded = self
            .body
            .as_ref()
            .map(|b| body::encode(b, self.multipart))
            .transpose()?;

        let mut headers = defaults.clone();
        if let Some((username, password)) = credentials {
            headers.insert(names::AUTHORIZATION, basic_auth_value(&username, &password));
        } else if let Some(token) = &self.access_token {
            headers.insert(names::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(encoded) = &encoded {
            if let Some(content_type) = &encoded.content_type {
                headers.insert(names::CONTENT_TYPE, content_type.as_str());
            }
            headers.insert(names::CONTENT_LENGTH, encoded.content_length().to_string());
        }
        headers.merge(&self.headers);
        if matches!(self.body, Some(RequestBody::Json(_))) {
            headers.insert(names::CONTENT_TYPE, names::CONTENT_TYPE_JSON);
        }

        Ok(WireRequest {
            method: self.method,
            url,
            headers,
            body: encoded.map(|e| e.bytes).unwrap_or_default(),
        })
    }
}

/// `Basic <base64(user:pass)>`.
pub fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// A fully resolved request, ready for a transport.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Bytes,
}

impl WireRequest {
    /// Path plus query, as sent on the request line.
    pub fn request_target(&self) -> String {
        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    /// `host[:port]` for the `Host` header.
    pub fn authority(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Serialize as an HTTP/1.1 request: request line, header block, body.
    pub fn to_http1(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256 + self.body.len());
        out.extend_from_slice(self.method.as_str().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.request_target().as_bytes());
        out.extend_from_slice(b" HTTP/1.1\r\n");
        if !self.headers.contains(names::HOST) {
            out.extend_from_slice(format!("{}: {}\r\n", names::HOST, self.authority()).as_bytes());
        }
        out.extend_from_slice(self.headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}
