//! Output formatting for responses and lifecycle events.

use std::io::Write;

use courier_http::{Body, Decoded, Event, Response};
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Types that can be written in either output format
pub trait FormattedOutput {
    fn format_text(&self) -> String;
    fn format_json(&self) -> Value;
}

/// Write `value` followed by a newline.
pub fn write_output<T, W>(format: OutputFormat, value: &T, mut writer: W) -> Result<(), CliError>
where
    T: FormattedOutput + ?Sized,
    W: Write,
{
    let output = match format {
        OutputFormat::Text => value.format_text(),
        OutputFormat::Json => value.format_json().to_string(),
    };
    writeln!(writer, "{output}")?;
    Ok(())
}

/// The final body of a response.
pub struct BodyOutput<'a>(pub &'a Response);

impl FormattedOutput for BodyOutput<'_> {
    fn format_text(&self) -> String {
        match &self.0.body {
            Body::Parsed(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            Body::Raw(Decoded::Text(text)) => text.clone(),
            Body::Raw(Decoded::Bytes(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    fn format_json(&self) -> Value {
        let response = self.0;
        let headers: serde_json::Map<String, Value> = response
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();

        json!({
            "status": response.status,
            "url": response.url.as_str(),
            "redirects": response.redirects,
            "headers": headers,
            "body": body_value(&response.body),
            "parse_error": response.parse_error,
        })
    }
}

/// One lifecycle event.
pub struct EventOutput<'a>(pub &'a Event);

impl FormattedOutput for EventOutput<'_> {
    fn format_text(&self) -> String {
        let name = self.0.name();
        match self.0 {
            Event::Status(_) | Event::StatusClass(..) => name,
            Event::Success(response) | Event::Fail(response) => {
                format!("{name} {} {}", response.status, response.url)
            }
            Event::Error(error) => format!("{name}: {error}"),
            Event::Complete(Ok(response)) => {
                format!("{name} {} after {} redirect(s)", response.status, response.redirects)
            }
            Event::Complete(Err(error)) => format!("{name} with error: {error}"),
        }
    }

    fn format_json(&self) -> Value {
        let name = self.0.name();
        match self.0 {
            Event::Status(response)
            | Event::StatusClass(_, response)
            | Event::Success(response)
            | Event::Fail(response) => json!({
                "event": name,
                "status": response.status,
                "url": response.url.as_str(),
            }),
            Event::Error(error) => json!({ "event": name, "error": error.to_string() }),
            Event::Complete(Ok(response)) => json!({
                "event": name,
                "status": response.status,
                "redirects": response.redirects,
                "body": body_value(&response.body),
            }),
            Event::Complete(Err(error)) => json!({ "event": name, "error": error.to_string() }),
        }
    }
}

fn body_value(body: &Body) -> Value {
    match body {
        Body::Parsed(value) => value.clone(),
        Body::Raw(Decoded::Text(text)) => Value::from(text.as_str()),
        Body::Raw(Decoded::Bytes(bytes)) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
    }
}
