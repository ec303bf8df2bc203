//! Request lifecycle engine for Courier.
//!
//! A [`Client`] turns one logical call into a managed lifecycle: the
//! request is built from [`RequestOptions`], sent over a [`Transport`],
//! decoded, parsed by a content parser chosen from the response MIME type,
//! optionally redirected, and finally reported as an ordered sequence of
//! [`Event`]s on a [`RequestHandle`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), courier_http::HttpError> {
//! use courier_http::{Client, Method};
//!
//! let client = Client::new()?;
//! let options = client.request(Method::Get, "http://localhost:9000/").query("q", "balls");
//! let response = client.execute(options)?.complete().await;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod client;
pub mod decode;
pub mod error;
pub mod event;
pub mod handle;
pub mod headers;
pub mod parser;
pub mod redirect;
pub mod request;
pub mod response;
pub mod transport;

pub use body::EncodedBody;
pub use client::{Client, ClientConfig};
pub use decode::Decoded;
pub use error::{HttpError, TransportError};
pub use event::{Event, Outcome, StatusClass};
pub use handle::{AbortHandle, RequestHandle};
pub use headers::Headers;
pub use parser::{ContentParser, MimePattern, ParseError, ParserRegistry};
pub use request::{
    Decoding, FilePart, FormField, Method, ParserChoice, RequestBody, RequestOptions, WireRequest,
};
pub use response::{Body, Response, ResponseError};
pub use transport::{Exchange, ReqwestTransport, Transport, TransportConfig};
