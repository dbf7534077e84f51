//! Selector dispatch — named CSS patterns to ordered lists of matched text.
//!
//! All patterns are evaluated in one pre-order walk of the document, so each
//! name's list is in document order whether a page has one selector or twenty.

use std::collections::BTreeMap;
use std::fmt;

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;

/// Reserved key holding the whole document when no selectors are given.
pub const RAW_KEY: &str = "__raw__";

/// Invalid selector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("invalid CSS pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("selector name {0:?} is reserved")]
    ReservedName(String),
}

/// What a pattern captures from each matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Concatenated text content with whitespace runs collapsed and the ends
    /// trimmed, so the captured string is not byte-identical to the page text.
    Text,
    /// Value of the named attribute (`""` when absent).
    Attr(String),
}

/// A compiled query pattern: `css` or `css@attribute`.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    selector: Selector,
    capture: Capture,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let (css, capture) = split_capture(raw);
        let selector = Selector::parse(css).map_err(|e| SelectorError::InvalidPattern {
            pattern: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            selector,
            capture,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.selector.matches(element)
    }

    fn extract(&self, element: &ElementRef<'_>) -> String {
        match &self.capture {
            Capture::Text => collapse_ws(&element.text().collect::<String>()),
            Capture::Attr(name) => element.value().attr(name).unwrap_or_default().to_string(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Pattern {
    type Error = SelectorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Pattern::parse(&raw)
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Split a trailing `@attr` off a pattern. An `@` inside `[...]` belongs to the CSS.
fn split_capture(raw: &str) -> (&str, Capture) {
    if let Some((css, attr)) = raw.rsplit_once('@') {
        let is_attr_name = !attr.is_empty()
            && attr
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
        let brackets_closed = css.matches('[').count() == css.matches(']').count();
        if is_attr_name && brackets_closed && !css.trim().is_empty() {
            return (css.trim_end(), Capture::Attr(attr.to_string()));
        }
    }
    (raw, Capture::Text)
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Field name → query pattern. Names are unique; iteration is by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorSet(BTreeMap<String, Pattern>);

impl SelectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, pattern)` pairs, compiling each pattern.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, pattern) in pairs {
            set.insert(name, pattern.as_ref())?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: &str) -> Result<(), SelectorError> {
        let name = name.into();
        if name == RAW_KEY {
            return Err(SelectorError::ReservedName(name));
        }
        self.0.insert(name, Pattern::parse(pattern)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Field name → matched text values in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult(BTreeMap<String, Vec<String>>);

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// The whole document under [`RAW_KEY`].
    pub fn raw(source: &str) -> Self {
        let mut result = Self::new();
        result.insert(RAW_KEY, vec![source.to_string()]);
        result
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.0.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, name: &str, value: String) {
        if let Some(values) = self.0.get_mut(name) {
            values.push(value);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for ExtractionResult {
    fn from_iter<T: IntoIterator<Item = (K, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Evaluate every selector against `doc`.
///
/// Every declared name is present in the result, possibly with an empty list.
/// With no selectors, the result is the raw document under [`RAW_KEY`].
pub fn dispatch(doc: &Document, selectors: &SelectorSet) -> ExtractionResult {
    if selectors.is_empty() {
        return ExtractionResult::raw(doc.source());
    }

    let mut result: ExtractionResult = selectors.names().map(|n| (n, Vec::new())).collect();

    for node in doc.html().root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        for (name, pattern) in selectors.iter() {
            if pattern.matches(&element) {
                result.push(name, pattern.extract(&element));
            }
        }
    }

    tracing::trace!(
        url = doc.url(),
        selectors = selectors.len(),
        matched = result.iter().map(|(_, v)| v.len()).sum::<usize>(),
        "dispatched selectors"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1>Site</h1>
          <table>
            <tr><td class="label">Profit Margin</td><td class="value">18.4%</td></tr>
            <tr><td class="label">Revenue</td><td class="value"> 1.2<span>B</span> </td></tr>
          </table>
          <ul>
            <li class="stream-item"><h3>First   headline</h3><a class="thumb" href="/a"><img src="a.png"></a></li>
            <li class="stream-item"><h3>Second</h3><a class="thumb" href="/b"><img></a></li>
          </ul>
        </body></html>
    "#;

    fn doc() -> Document {
        Document::parse("https://example.test/quote", PAGE)
    }

    #[test]
    fn matches_in_document_order() {
        let selectors = SelectorSet::from_pairs([("v", "td.value"), ("l", "td.label")]).unwrap();
        let out = dispatch(&doc(), &selectors);
        assert_eq!(out.get("v").unwrap(), ["18.4%", "1.2B"]);
        assert_eq!(out.get("l").unwrap(), ["Profit Margin", "Revenue"]);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let selectors = SelectorSet::from_pairs([("t", "li.stream-item h3")]).unwrap();
        let out = dispatch(&doc(), &selectors);
        assert_eq!(out.get("t").unwrap(), ["First headline", "Second"]);
    }

    #[test]
    fn text_capture_drops_line_breaks_and_nested_spacing() {
        let page = Document::parse(
            "https://example.test/m",
            "<p class=\"m\">  a\n   <b> b </b>\tc  </p>",
        );
        let selectors = SelectorSet::from_pairs([("m", "p.m")]).unwrap();
        let out = dispatch(&page, &selectors);
        assert_eq!(out.get("m").unwrap(), ["a b c"]);
    }

    #[test]
    fn attribute_capture_keeps_positions() {
        let selectors = SelectorSet::from_pairs([("img", "li.stream-item a.thumb img@src")]).unwrap();
        let out = dispatch(&doc(), &selectors);
        assert_eq!(out.get("img").unwrap(), ["a.png", ""]);
    }

    #[test]
    fn unmatched_selector_is_present_and_empty() {
        let selectors = SelectorSet::from_pairs([("none", "div.missing")]).unwrap();
        let out = dispatch(&doc(), &selectors);
        assert_eq!(out.get("none"), Some(&[][..]));
    }

    #[test]
    fn empty_selector_set_returns_raw_document() {
        let out = dispatch(&doc(), &SelectorSet::new());
        assert_eq!(out.get(RAW_KEY).unwrap(), [PAGE.to_string()]);
        assert_eq!(out.names().count(), 1);
    }

    #[test]
    fn dispatch_is_idempotent() {
        let selectors =
            SelectorSet::from_pairs([("v", "td.value"), ("h", "h1, h3"), ("a", "a@href")]).unwrap();
        let d = doc();
        assert_eq!(dispatch(&d, &selectors), dispatch(&d, &selectors));
    }

    #[test]
    fn attribute_selector_with_at_sign_stays_css() {
        let p = Pattern::parse(r#"a[href="mailto:x@y.z"]"#).unwrap();
        assert_eq!(p.capture(), &Capture::Text);
        let p = Pattern::parse("a.thumb@href").unwrap();
        assert_eq!(p.capture(), &Capture::Attr("href".into()));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = SelectorSet::from_pairs([("bad", "td[")]).unwrap_err();
        assert!(matches!(err, SelectorError::InvalidPattern { .. }));
    }

    #[test]
    fn raw_key_is_reserved() {
        let err = SelectorSet::from_pairs([(RAW_KEY, "td")]).unwrap_err();
        assert_eq!(err, SelectorError::ReservedName(RAW_KEY.into()));
    }
}
