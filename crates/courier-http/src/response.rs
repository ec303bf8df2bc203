//! Completed response types.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::decode::Decoded;
use crate::event::StatusClass;
use crate::headers::{names, Headers};

/// The delivered body: a parsed value, or the decoded body when no parser
/// applied or parsing failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Parsed(Value),
    Raw(Decoded),
}

impl Body {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Body::Parsed(value) => Some(value),
            Body::Raw(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Raw(decoded) => decoded.as_text(),
            Body::Parsed(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Raw(decoded) => Some(decoded.as_bytes()),
            Body::Parsed(_) => None,
        }
    }
}

/// The final response of a request lifecycle.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    /// URL of the attempt that produced this response.
    pub url: Url,
    /// Number of redirects followed before this response.
    pub redirects: u32,
    /// Body bytes as received, before decompression.
    pub raw: Bytes,
    pub decoded: Decoded,
    pub body: Body,
    /// Set when a parser was chosen but rejected the body.
    pub parse_error: Option<String>,
}

impl Response {
    /// `2XX` responses complete successfully.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn status_class(&self) -> Option<StatusClass> {
        StatusClass::from_status(self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(names::CONTENT_TYPE)
    }

    /// Deserialize the body as `T`.
    ///
    /// Uses the parsed value when there is one, else reads the decoded body
    /// as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ResponseError> {
        let result = match &self.body {
            Body::Parsed(value) => serde_json::from_value(value.clone()),
            Body::Raw(decoded) => serde_json::from_slice(decoded.as_bytes()),
        };
        result.map_err(|source| ResponseError::Parse {
            status: self.status,
            body: String::from_utf8_lossy(self.decoded.as_bytes()).into_owned(),
            source,
        })
    }
}

/// Response deserialization errors.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("failed to parse JSON (status {status}): {source}")]
    Parse {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}
