//! Ordered, case-preserving header lists.

use std::fmt;

/// Well-known header names and MIME types.
pub mod names {
    pub const ACCEPT: &str = "Accept";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const HOST: &str = "Host";
    pub const LOCATION: &str = "Location";
    pub const USER_AGENT: &str = "User-Agent";

    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
    pub const CONTENT_TYPE_MULTIPART: &str = "multipart/form-data";
}

/// A header list that keeps names exactly as supplied.
///
/// Lookups are ASCII case-insensitive; [`Headers::insert`] replaces any
/// existing value for the same name in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name`, replacing every existing value for it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(index) => {
                self.entries[index] = (name.clone(), value);
                let mut seen = 0;
                self.entries.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Add a value without touching existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove every value for `name`, returning the first one.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        first
    }

    /// Overlay `other` onto `self`; values from `other` win.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut headers = Headers::new();
        headers.insert("Accept", "*/*");
        headers.insert("X-One", "1");
        headers.append("x-one", "2");
        headers.insert("x-ONE", "3");

        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries, vec![("Accept", "*/*"), ("x-ONE", "3")]);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut computed = Headers::new();
        computed.insert("Content-Type", "application/x-www-form-urlencoded");
        computed.insert("Content-Length", "7");

        let explicit: Headers = [("content-type", "application/json")].into_iter().collect();
        computed.merge(&explicit);

        assert_eq!(computed.get("Content-Type"), Some("application/json"));
        assert_eq!(computed.get("content-length"), Some("7"));
        assert_eq!(computed.len(), 2);
    }

    #[test]
    fn test_remove_and_get_all() {
        let mut headers: Headers = [("Set-Cookie", "a=1"), ("set-cookie", "b=2")]
            .into_iter()
            .collect();
        assert_eq!(headers.get_all("SET-COOKIE").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
        assert_eq!(headers.remove("set-cookie").as_deref(), Some("a=1"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_display_uses_wire_format() {
        let headers: Headers = [("Host", "localhost"), ("Accept", "*/*")].into_iter().collect();
        assert_eq!(headers.to_string(), "Host: localhost\r\nAccept: */*\r\n");
    }
}
