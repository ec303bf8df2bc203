//! XML to `serde_json::Value` conversion.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use super::ParseError;

const ATTRIBUTES_KEY: &str = "@";
const TEXT_KEY: &str = "#";

#[derive(Default)]
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut frame = Frame {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Frame::default()
        };
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?;
            attributes.insert(key, Value::String(value.into_owned()));
        }
        if !attributes.is_empty() {
            frame.children.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        }
        Ok(frame)
    }

    /// Text-only elements collapse to a string.
    fn into_value(mut self) -> (String, Value) {
        let value = if self.children.is_empty() {
            Value::String(self.text)
        } else {
            if !self.text.is_empty() {
                self.children.insert(TEXT_KEY.to_string(), Value::String(self.text));
            }
            Value::Object(self.children)
        };
        (self.name, value)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// Convert an XML document into nested maps.
///
/// The root element is dropped and its contents returned. Elements holding
/// only text become strings, repeated element names become arrays,
/// attributes are collected under `"@"` and text mixed with child elements
/// under `"#"`.
pub fn xml_to_value(input: &str) -> Result<Value, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.into_value();
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None => return Ok(value),
                }
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unexpected closing tag".to_string()))?;
                let (name, value) = frame.into_value();
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None => return Ok(value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(ParseError::Xml(if stack.is_empty() {
        "document has no root element".to_string()
    } else {
        "unexpected end of document".to_string()
    }))
}

fn xml_error(e: quick_xml::Error) -> ParseError {
    ParseError::Xml(e.to_string())
}
