//! Attribute lists attached to words and milestones.
//!
//! USFM 3 writes attributes after a `|`:
//!
//! ```text
//! \zaln-s |x-strong="H0430" x-lemma="אֱלֹהִים" x-occurrence="1" x-content="אֱלֹהִ֑ים"\*
//! \w God|x-occurrence="1" x-occurrences="1"\w*
//! ```
//!
//! Keys lose their `x-` prefix so callers can ask for `content` or `strong`
//! without caring which convention the file used.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Attribute name used for a bare value without `key=`.
pub const DEFAULT_ATTRIBUTE: &str = "lemma";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

/// The attribute text could not be read as `key="value"` pairs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed attribute list {0:?}")]
pub struct AttributeError(pub String);

fn pair_regex() -> &'static Regex {
    static PAIR_REGEX: OnceLock<Regex> = OnceLock::new();
    PAIR_REGEX.get_or_init(|| {
        Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*"([^"]*)""#).expect("Invalid attribute regex")
    })
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text between `|` and the closing marker.
    pub fn parse(raw: &str) -> Result<Self, AttributeError> {
        let raw = raw.trim();
        let mut attributes = Self::new();
        if raw.is_empty() {
            return Ok(attributes);
        }

        if !raw.contains('=') {
            attributes.insert(DEFAULT_ATTRIBUTE, raw);
            return Ok(attributes);
        }

        let mut consumed = 0;
        for captures in pair_regex().captures_iter(raw) {
            let (Some(whole), Some(key), Some(value)) = (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            if !raw[consumed..whole.start()].trim().is_empty() {
                return Err(AttributeError(raw.to_string()));
            }
            attributes.insert(key.as_str(), value.as_str());
            consumed = whole.end();
        }

        if !raw[consumed..].trim().is_empty() {
            return Err(AttributeError(raw.to_string()));
        }

        Ok(attributes)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        let key = key.strip_prefix("x-").unwrap_or(key);
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}
