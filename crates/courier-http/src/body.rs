//! Request body codecs.
//!
//! Text and bytes pass through untouched. Form bodies become
//! `application/x-www-form-urlencoded`, or `multipart/form-data` when the
//! request asks for multipart. JSON bodies are serialized with
//! `application/json`.

use bytes::{BufMut, Bytes, BytesMut};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::Value;

use crate::error::HttpError;
use crate::headers::names;
use crate::request::{FilePart, FormField, RequestBody};

/// A serialized request body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    /// `None` leaves the content type to the caller.
    pub content_type: Option<String>,
}

impl EncodedBody {
    /// Exact byte length of the body.
    pub fn content_length(&self) -> usize {
        self.bytes.len()
    }
}

/// Serialize `body`.
///
/// Fails with [`HttpError::UnencodableBody`] when a form field holds an
/// array or object, or when a file part is used without multipart.
pub fn encode(body: &RequestBody, multipart: bool) -> Result<EncodedBody, HttpError> {
    match body {
        RequestBody::Text(text) => Ok(EncodedBody {
            bytes: Bytes::copy_from_slice(text.as_bytes()),
            content_type: None,
        }),
        RequestBody::Bytes(bytes) => Ok(EncodedBody {
            bytes: bytes.clone(),
            content_type: None,
        }),
        RequestBody::Form(fields) if multipart => {
            let boundary = generate_boundary();
            Ok(EncodedBody {
                bytes: encode_multipart(fields, &boundary)?,
                content_type: Some(format!("{}; boundary={boundary}", names::CONTENT_TYPE_MULTIPART)),
            })
        }
        RequestBody::Form(fields) => Ok(EncodedBody {
            bytes: encode_form(fields)?.into(),
            content_type: Some(names::CONTENT_TYPE_FORM.to_string()),
        }),
        RequestBody::Json(value) => encode_json(value),
    }
}

/// Serialize any value as JSON.
pub fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<EncodedBody, HttpError> {
    let bytes = serde_json::to_vec(value).map_err(HttpError::JsonEncode)?;
    Ok(EncodedBody {
        bytes: bytes.into(),
        content_type: Some(names::CONTENT_TYPE_JSON.to_string()),
    })
}

/// `key=value` pairs, percent-encoded and joined with `&`.
pub fn encode_form(fields: &[(String, FormField)]) -> Result<String, HttpError> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, field) in fields {
        match field {
            FormField::Value(value) => {
                serializer.append_pair(name, &scalar_to_string(name, value)?);
            }
            FormField::File(file) => {
                return Err(HttpError::unencodable(format!(
                    "file {:?} in field {name:?} requires a multipart body",
                    file.filename
                )));
            }
        }
    }
    Ok(serializer.finish())
}

/// `multipart/form-data` parts separated by `boundary`.
pub fn encode_multipart(fields: &[(String, FormField)], boundary: &str) -> Result<Bytes, HttpError> {
    let mut out = BytesMut::new();
    for (name, field) in fields {
        out.put_slice(format!("--{boundary}\r\n").as_bytes());
        match field {
            FormField::Value(value) => {
                check_part_header("field name", name, "\"\r\n")?;
                let text = scalar_to_string(name, value)?;
                out.put_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                out.put_slice(text.as_bytes());
            }
            FormField::File(FilePart {
                filename,
                content_type,
                data,
            }) => {
                check_part_header("field name", name, "\"\r\n")?;
                check_part_header("filename", filename, "\"\r\n")?;
                check_part_header("content type", content_type, "\r\n")?;
                out.put_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                out.put_slice(data);
            }
        }
        out.put_slice(b"\r\n");
    }
    out.put_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok(out.freeze())
}

/// Part headers are written verbatim, so none of `forbidden` may appear.
fn check_part_header(what: &str, value: &str, forbidden: &str) -> Result<(), HttpError> {
    if value.contains(|c| forbidden.contains(c)) {
        return Err(HttpError::unencodable(format!(
            "multipart {what} {value:?} contains a quote or line break"
        )));
    }
    Ok(())
}

/// Random multipart boundary.
pub fn generate_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("courier-{token}")
}

fn scalar_to_string(name: &str, value: &Value) -> Result<String, HttpError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(_) | Value::Object(_) => Err(HttpError::unencodable(format!(
            "form field {name:?} holds a nested value"
        ))),
    }
}
