//! Decoding of list-valued recipe fields (`ingredients`, `steps`).
//!
//! Upstream storage is inconsistent about how these columns are encoded. A
//! row may carry a native list, a JSON array string (`["a", "b"]`), a quoted
//! literal list string (`['a', 'b']`), or a bare delimited string (`a, b`).
//! Decoding tries JSON first, then the literal-list grammar, then falls back
//! to splitting on a delimiter with quote and bracket stripping.
//!
//! Decoding never fails: malformed input degrades to whatever the fallback
//! split produces, and missing or blank input yields an empty list.

use serde::{Deserialize, Serialize};

/// Default delimiter for the split fallback.
pub const DEFAULT_DELIMITER: char = ',';

/// A list-valued field as it arrives from upstream storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    /// Already a list of strings.
    Items(Vec<String>),
    /// A string encoding of a list.
    Encoded(String),
}

impl ListField {
    /// Decodes the field with the default delimiter.
    #[must_use]
    pub fn decode(&self) -> Vec<String> {
        self.decode_with(DEFAULT_DELIMITER)
    }

    /// Decodes the field, splitting on `delimiter` if structured parsing fails.
    #[must_use]
    pub fn decode_with(&self, delimiter: char) -> Vec<String> {
        match self {
            Self::Items(items) => clean_items(items.iter().map(String::as_str)),
            Self::Encoded(raw) => parse_list_field_with(Some(raw), delimiter),
        }
    }

    /// Returns the field as searchable text.
    ///
    /// Encoded strings are returned verbatim; native lists are joined with
    /// `", "`.
    #[must_use]
    pub fn raw_text(&self) -> String {
        match self {
            Self::Items(items) => items.join(", "),
            Self::Encoded(raw) => raw.clone(),
        }
    }
}

impl From<&str> for ListField {
    fn from(raw: &str) -> Self {
        Self::Encoded(raw.to_string())
    }
}

impl From<String> for ListField {
    fn from(raw: String) -> Self {
        Self::Encoded(raw)
    }
}

impl From<Vec<String>> for ListField {
    fn from(items: Vec<String>) -> Self {
        Self::Items(items)
    }
}

impl From<Vec<&str>> for ListField {
    fn from(items: Vec<&str>) -> Self {
        Self::Items(items.into_iter().map(str::to_string).collect())
    }
}

/// Decodes a possibly-absent list string using the default delimiter.
///
/// ```
/// use recipe_core::list_field::parse_list_field;
///
/// assert_eq!(parse_list_field(Some(r#"["a","b"]"#)), vec!["a", "b"]);
/// assert_eq!(parse_list_field(Some("['a','b']")), vec!["a", "b"]);
/// assert_eq!(parse_list_field(Some("a,b")), vec!["a", "b"]);
/// assert!(parse_list_field(None).is_empty());
/// assert!(parse_list_field(Some("   ")).is_empty());
/// ```
#[must_use]
pub fn parse_list_field(raw: Option<&str>) -> Vec<String> {
    parse_list_field_with(raw, DEFAULT_DELIMITER)
}

/// Decodes a possibly-absent list string, splitting on `delimiter` as the
/// last resort.
#[must_use]
pub fn parse_list_field_with(raw: Option<&str>, delimiter: char) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Some(items) = parse_json_list(trimmed) {
            return items;
        }
        if let Some(items) = parse_literal_list(trimmed) {
            return items;
        }
        tracing::trace!(raw = trimmed, "list field fell back to delimiter split");
    }

    trimmed
        .split(delimiter)
        .map(|item| {
            item.trim()
                .trim_matches(|c| matches!(c, '[' | ']' | '\''))
                .trim_matches('"')
                .trim()
        })
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_items<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_json_list(raw: &str) -> Option<Vec<String>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    let rendered: Vec<String> = values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();
    Some(clean_items(rendered.iter().map(String::as_str)))
}

/// Parses a literal list such as `['a', "b", 3, None]`.
///
/// Accepts single- or double-quoted strings with backslash escapes and bare
/// scalar tokens (numbers, `None`, `True`, `False`). Anything else, including
/// nested lists, is rejected.
fn parse_literal_list(raw: &str) -> Option<Vec<String>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&next) = chars.peek() else {
            break;
        };

        let item = match next {
            '\'' | '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next()? {
                        '\\' => value.push(unescape(chars.next()?)),
                        c if c == next => break,
                        c => value.push(c),
                    }
                }
                value
            }
            ',' | '[' | ']' => return None,
            _ => {
                let mut token = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    token.push(c);
                }
                let token = token.trim_end().to_string();
                if !is_literal_scalar(&token) {
                    return None;
                }
                token
            }
        };
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return None,
        }
    }

    Some(clean_items(items.iter().map(String::as_str)))
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

fn is_literal_scalar(token: &str) -> bool {
    matches!(token, "None" | "True" | "False") || token.parse::<f64>().is_ok()
}
