//! Content parsers and the MIME-driven parser registry.
//!
//! The registry holds an ordered list of `(pattern, parser)` entries. A
//! lookup strips MIME parameters and walks candidate types from most to
//! least specific: `application/vnd.github.beta.raw+json` tries
//! `application/vnd.github.beta.raw+json`, `application/vnd.github.beta+json`,
//! `application/vnd.github+json`, `application/vnd+json` and finally
//! `application/json`. For each candidate the entries are tried in
//! registration order and the first match wins.
//!
//! Registries are shared by reference (`Arc<ParserRegistry>`); a
//! registration is visible to every later lookup on every client holding
//! the same registry.

mod xml;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::request::ParserChoice;

pub use xml::xml_to_value;

/// Errors raised by a content parser.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(String),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Custom(String),
}

impl ParseError {
    /// Error with a free-form message, for custom parsers.
    pub fn custom(message: impl Into<String>) -> Self {
        ParseError::Custom(message.into())
    }
}

/// Turns response bytes into a structured value.
///
/// Completion may be immediate or asynchronous. Plain functions and
/// closures of type `Fn(&[u8]) -> Result<Value, ParseError>` implement this
/// trait.
#[async_trait]
pub trait ContentParser: Send + Sync {
    async fn parse(&self, body: &[u8]) -> Result<Value, ParseError>;
}

#[async_trait]
impl<F> ContentParser for F
where
    F: Fn(&[u8]) -> Result<Value, ParseError> + Send + Sync,
{
    async fn parse(&self, body: &[u8]) -> Result<Value, ParseError> {
        (self)(body)
    }
}

/// Strict JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

#[async_trait]
impl ContentParser for JsonParser {
    async fn parse(&self, body: &[u8]) -> Result<Value, ParseError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// XML decoded into nested maps; see [`xml_to_value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlParser;

#[async_trait]
impl ContentParser for XmlParser {
    async fn parse(&self, body: &[u8]) -> Result<Value, ParseError> {
        xml_to_value(&String::from_utf8_lossy(body))
    }
}

/// YAML decoded into nested maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

#[async_trait]
impl ContentParser for YamlParser {
    async fn parse(&self, body: &[u8]) -> Result<Value, ParseError> {
        Ok(serde_yaml::from_slice(body)?)
    }
}

/// The built-in parser for a fixed choice; `None` for `auto` and `none`.
pub fn builtin(choice: ParserChoice) -> Option<Arc<dyn ContentParser>> {
    match choice {
        ParserChoice::Json => Some(Arc::new(JsonParser)),
        ParserChoice::Xml => Some(Arc::new(XmlParser)),
        ParserChoice::Yaml => Some(Arc::new(YamlParser)),
        ParserChoice::Auto | ParserChoice::None => None,
    }
}

/// Matches a MIME type (lowercase, parameters stripped).
#[derive(Clone)]
pub enum MimePattern {
    Exact(String),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl MimePattern {
    pub fn exact(mime: impl AsRef<str>) -> Self {
        MimePattern::Exact(mime.as_ref().trim().to_ascii_lowercase())
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        MimePattern::Predicate(Arc::new(f))
    }

    pub fn matches(&self, mime: &str) -> bool {
        match self {
            MimePattern::Exact(pattern) => pattern == mime,
            MimePattern::Predicate(f) => f(mime),
        }
    }
}

impl fmt::Debug for MimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimePattern::Exact(pattern) => f.debug_tuple("Exact").field(pattern).finish(),
            MimePattern::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for MimePattern {
    fn from(mime: &str) -> Self {
        MimePattern::exact(mime)
    }
}

impl From<String> for MimePattern {
    fn from(mime: String) -> Self {
        MimePattern::exact(mime)
    }
}

struct ParserEntry {
    pattern: MimePattern,
    parser: Arc<dyn ContentParser>,
}

/// Ordered `(pattern, parser)` registry used by the `auto` parser.
pub struct ParserRegistry {
    entries: RwLock<Vec<ParserEntry>>,
}

impl ParserRegistry {
    /// Registry preloaded with the JSON, XML and YAML parsers.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register("application/json", JsonParser);
        registry.register("application/xml", XmlParser);
        registry.register("text/xml", XmlParser);
        registry.register("application/yaml", YamlParser);
        registry.register("application/x-yaml", YamlParser);
        registry.register("text/yaml", YamlParser);
        registry.register("text/x-yaml", YamlParser);
        registry
    }

    /// Registry with no entries.
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register `parser` for `pattern`.
    ///
    /// An exact pattern that is already registered is replaced in place;
    /// anything else is appended.
    pub fn register<P>(&self, pattern: impl Into<MimePattern>, parser: P)
    where
        P: ContentParser + 'static,
    {
        self.register_arc(pattern, Arc::new(parser));
    }

    pub fn register_arc(&self, pattern: impl Into<MimePattern>, parser: Arc<dyn ContentParser>) {
        let pattern = pattern.into();
        let mut entries = self.entries.write();
        if let MimePattern::Exact(mime) = &pattern {
            let existing = entries
                .iter_mut()
                .find(|e| matches!(&e.pattern, MimePattern::Exact(m) if m == mime));
            if let Some(entry) = existing {
                tracing::debug!(mime = %mime, "replacing content parser");
                entry.parser = parser;
                return;
            }
        }
        tracing::debug!(pattern = ?pattern, "registering content parser");
        entries.push(ParserEntry { pattern, parser });
    }

    /// Parser for `content_type`, if any entry matches.
    pub fn resolve(&self, content_type: &str) -> Option<Arc<dyn ContentParser>> {
        let candidates = mime_candidates(content_type);
        let entries = self.entries.read();
        candidates.iter().find_map(|candidate| {
            entries
                .iter()
                .find(|e| e.pattern.matches(candidate))
                .map(|e| Arc::clone(&e.parser))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<_> = self.entries.read().iter().map(|e| e.pattern.clone()).collect();
        f.debug_struct("ParserRegistry").field("patterns", &patterns).finish()
    }
}

/// MIME types to try for `content_type`, most specific first.
pub fn mime_candidates(content_type: &str) -> Vec<String> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![mime.clone()];
    if let Some((top, sub)) = mime.split_once('/') {
        if let Some((prefix, suffix)) = sub.rsplit_once('+') {
            let mut segments: Vec<&str> = prefix.split('.').collect();
            while segments.len() > 1 {
                segments.pop();
                candidates.push(format!("{top}/{}+{suffix}", segments.join(".")));
            }
            candidates.push(format!("{top}/{suffix}"));
        }
    }
    candidates.dedup();
    candidates
}

/// Result of the parsing stage.
#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(Value),
    /// No parser applies; the decoded body is delivered unchanged.
    Unmatched,
    /// The parser failed; the decoded body is delivered unchanged.
    Failed(ParseError),
}

/// Run `parser` over `body`, if there is one.
pub async fn run(parser: Option<Arc<dyn ContentParser>>, body: &[u8]) -> ParseOutcome {
    match parser {
        None => ParseOutcome::Unmatched,
        Some(parser) => match parser.parse(body).await {
            Ok(value) => ParseOutcome::Parsed(value),
            Err(e) => ParseOutcome::Failed(e),
        },
    }
}
