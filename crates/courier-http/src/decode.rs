//! Response decoding: content-encoding reversal and decoding-mode projection.
//!
//! This stage is a pure byte/charset transform. It never looks at the
//! content type; parsing happens afterwards.

use std::io::Read;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

use crate::error::HttpError;
use crate::headers::{names, Headers};
use crate::request::Decoding;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text(String),
    Bytes(Bytes),
}

impl Decoded {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Decoded::Text(text) => Some(text.as_str()),
            Decoded::Bytes(_) => None,
        }
    }

    /// The underlying bytes (UTF-8 for text).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Decoded::Text(text) => text.as_bytes(),
            Decoded::Bytes(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decompress `raw` according to `Content-Encoding`, then project it.
pub fn decode(raw: &Bytes, headers: &Headers, mode: Decoding) -> Result<Decoded, HttpError> {
    let bytes = decompress(raw, headers)?;
    Ok(project(&bytes, mode))
}

/// Undo `gzip` or `deflate` content encoding. Other encodings pass through.
pub fn decompress(raw: &Bytes, headers: &Headers) -> Result<Bytes, HttpError> {
    let Some(encoding) = headers.get(names::CONTENT_ENCODING) else {
        return Ok(raw.clone());
    };
    let encoding = encoding.trim().to_ascii_lowercase();
    if raw.is_empty() {
        return Ok(raw.clone());
    }

    let result = match encoding.as_str() {
        "gzip" | "x-gzip" => read_all(GzDecoder::new(raw.as_ref())),
        // Servers disagree on whether deflate means zlib-wrapped or raw.
        "deflate" => read_all(ZlibDecoder::new(raw.as_ref()))
            .or_else(|_| read_all(DeflateDecoder::new(raw.as_ref()))),
        other => {
            tracing::debug!(encoding = %other, "passing through unsupported content encoding");
            return Ok(raw.clone());
        }
    };

    result
        .map(Bytes::from)
        .map_err(|source| HttpError::Decompression { encoding, source })
}

/// Represent `bytes` in the requested decoding mode.
pub fn project(bytes: &Bytes, mode: Decoding) -> Decoded {
    match mode {
        Decoding::Buffer => Decoded::Bytes(bytes.clone()),
        Decoding::Binary => Decoded::Text(bytes.iter().map(|&b| char::from(b)).collect()),
        Decoding::Base64 => Decoded::Text(STANDARD.encode(bytes)),
        Decoding::Utf8 => Decoded::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn read_all<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
