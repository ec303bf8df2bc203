//! HTTP errors.

use thiserror::Error;

/// Errors raised while building, sending or decoding a request.
///
/// Configuration errors ([`HttpError::InvalidUrl`],
/// [`HttpError::UnencodableBody`], [`HttpError::JsonEncode`]) are returned
/// synchronously from [`crate::Client::execute`]. Everything else is
/// delivered as an `error` event followed by `complete`.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request body cannot be encoded: {reason}")]
    UnencodableBody { reason: String },

    #[error("failed to encode JSON body: {0}")]
    JsonEncode(#[source] serde_json::Error),

    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("request aborted")]
    Aborted,

    #[error("failed to decompress {encoding} body: {source}")]
    Decompression {
        encoding: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid redirect location {location:?}: {source}")]
    InvalidRedirect {
        location: String,
        #[source]
        source: url::ParseError,
    },
}

impl HttpError {
    /// Whether this error is raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HttpError::InvalidUrl { .. } | HttpError::UnencodableBody { .. } | HttpError::JsonEncode(_)
        )
    }

    pub(crate) fn unencodable(reason: impl Into<String>) -> Self {
        HttpError::UnencodableBody {
            reason: reason.into(),
        }
    }
}

/// Errors raised by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed before the response completed")]
    ConnectionClosed,

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e)
        }
    }
}
