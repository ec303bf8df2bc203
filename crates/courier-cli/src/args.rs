//! Custom value parsers for CLI arguments.

use courier_http::{Decoding, Method};

/// Parse a request method, ignoring case.
pub fn parse_method(s: &str) -> Result<Method, String> {
    Method::parse(s).ok_or_else(|| format!("unknown method: {s} (expected get, post, put, patch, delete or head)"))
}

/// Parse a key=value pair
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value pair: {s}"))?;
    if key.is_empty() {
        return Err(format!("missing key in: {s}"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse a `Name: value` header
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid header, expected \"Name: value\": {s}"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name: {name:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse `user:password` credentials; the password may contain colons.
pub fn parse_credentials(s: &str) -> Result<(String, String), String> {
    let (user, password) = s.split_once(':').unwrap_or((s, ""));
    if user.is_empty() {
        return Err("missing user name".to_string());
    }
    Ok((user.to_string(), password.to_string()))
}

/// Parse a response decoding mode.
pub fn parse_decoding(s: &str) -> Result<Decoding, String> {
    Decoding::parse(s).ok_or_else(|| format!("unknown decoding: {s} (expected utf8, buffer, binary or base64)"))
}

/// Parse a JSON document.
pub fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}
