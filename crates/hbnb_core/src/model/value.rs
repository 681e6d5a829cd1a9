//! Typed attribute values and the ordered attribute bag carried by records.
//!
//! # Responsibility
//! - Represent the four attribute value shapes (string, integer, float,
//!   string list) as one tagged enum.
//! - Convert raw command text into a schema-declared type.
//! - Render values the way the console prints them (Python literal style).
//!
//! # Invariants
//! - Integer and float values keep their variant through serialization:
//!   `5` is never read back as `5.0` or `"5"`.
//! - `AttributeMap` keeps insertion order; overwriting a key keeps its slot.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Declared semantic type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Str,
    Int,
    Float,
    StrList,
}

impl AttrType {
    /// Zero value used when a record is created without an explicit value.
    pub fn default_value(self) -> AttrValue {
        match self {
            Self::Str => AttrValue::Str(String::new()),
            Self::Int => AttrValue::Int(0),
            Self::Float => AttrValue::Float(0.0),
            Self::StrList => AttrValue::StrList(Vec::new()),
        }
    }
}

/// One attribute value.
///
/// Serialized untagged so the store file holds plain JSON scalars/arrays.
/// Variant order matters for decoding: integers must be tried before floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    StrList(Vec<String>),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::Str(_) => AttrType::Str,
            Self::Int(_) => AttrType::Int,
            Self::Float(_) => AttrType::Float,
            Self::StrList(_) => AttrType::StrList,
        }
    }

    /// Converts raw command text into `target`.
    ///
    /// Text that does not parse as the target type is kept verbatim as a
    /// string so a later update can correct it.
    pub fn coerce_text(target: AttrType, text: &str) -> AttrValue {
        let trimmed = text.trim();
        match target {
            AttrType::Str => AttrValue::Str(text.to_string()),
            AttrType::Int => trimmed
                .parse::<i64>()
                .map(AttrValue::Int)
                .unwrap_or_else(|_| AttrValue::Str(text.to_string())),
            // JSON cannot hold NaN or infinities as numbers.
            AttrType::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(AttrValue::Float)
                .unwrap_or_else(|| AttrValue::Str(text.to_string())),
            AttrType::StrList => parse_list_text(trimmed)
                .map(AttrValue::StrList)
                .unwrap_or_else(|| AttrValue::Str(text.to_string())),
        }
    }

    /// Converts an already-typed value into `target`.
    ///
    /// Matching variants pass through, integers widen to floats, and
    /// everything else goes through the textual form of the value.
    pub fn coerce(target: AttrType, value: AttrValue) -> AttrValue {
        match (target, value) {
            (AttrType::Float, AttrValue::Int(number)) => AttrValue::Float(number as f64),
            (target, value) if value.attr_type() == target => value,
            (target, value) => {
                let text = value.as_text();
                match Self::coerce_text(target, &text) {
                    AttrValue::Str(_) if target != AttrType::Str => value,
                    coerced => coerced,
                }
            }
        }
    }

    /// Plain textual form without quoting.
    pub fn as_text(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => py_float_repr(*value),
            Self::StrList(items) => py_list_repr(items),
        }
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(value) => f.write_str(&py_str_repr(value)),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&py_float_repr(*value)),
            Self::StrList(items) => f.write_str(&py_list_repr(items)),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        Self::StrList(value)
    }
}

/// Insertion-ordered attribute name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Inserts or overwrites `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) -> Option<AttrValue> {
        let name = name.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((name, value));
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl FromIterator<(String, AttrValue)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Renders a string as a Python `repr()` literal.
pub fn py_str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut rendered = String::with_capacity(value.len() + 2);
    rendered.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => rendered.push_str("\\\\"),
            '\n' => rendered.push_str("\\n"),
            '\r' => rendered.push_str("\\r"),
            '\t' => rendered.push_str("\\t"),
            c if c == quote => {
                rendered.push('\\');
                rendered.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                rendered.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => rendered.push(c),
        }
    }
    rendered.push(quote);
    rendered
}

/// Renders a float the way Python's `repr()` does.
pub fn py_float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Debug switches to exponent notation at the same thresholds as Python,
    // only the exponent spelling differs (`1e16` vs `1e+16`, `1e-7` vs `1e-07`).
    let debug = format!("{value:?}");
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => debug,
    }
}

fn py_list_repr(items: &[String]) -> String {
    let rendered = items
        .iter()
        .map(|item| py_str_repr(item))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{rendered}]")
}

/// Parses `['a', "b"]` style text into a string list.
fn parse_list_text(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let unquoted = strip_matching_quotes(item);
            Some(unquoted.to_string())
        })
        .collect()
}

/// Strips one pair of matching leading/trailing single or double quotes.
pub fn strip_matching_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
