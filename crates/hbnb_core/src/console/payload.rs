//! Structured update payload parser.
//!
//! Accepts a brace-delimited mapping literal such as
//! `{'first_name': "Betty", 'age': 89, 'ratio': 0.5, 'tags': ['a', 'b']}`.
//!
//! # Invariants
//! - Keys keep their literal order; a repeated key keeps its last value.
//! - Scalars keep their literal type: quoted text is a string, digits are
//!   an integer, digits with a fraction or exponent are a float.
//! - Any other bare token (`True`, `None`, ...) is kept as raw text.

use crate::model::value::AttrValue;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadError {
    pub offset: usize,
    pub message: &'static str,
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl Error for PayloadError {}

pub type PayloadEntries = Vec<(String, AttrValue)>;

/// Parses a structured payload into ordered key/value pairs.
pub fn parse_payload(text: &str) -> Result<PayloadEntries, PayloadError> {
    let mut parser = Parser { text, pos: 0 };
    let entries = parser.mapping()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("unexpected text after closing brace"));
    }
    Ok(entries)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char, message: &'static str) -> Result<(), PayloadError> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: &'static str) -> PayloadError {
        PayloadError {
            offset: self.pos,
            message,
        }
    }

    fn mapping(&mut self) -> Result<PayloadEntries, PayloadError> {
        self.expect('{', "payload must start with `{`")?;
        let mut entries: PayloadEntries = Vec::new();

        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(entries);
                }
                None => return Err(self.error("unterminated payload")),
                _ => {}
            }

            let key = self.key()?;
            self.expect(':', "expected `:` after key")?;
            self.skip_ws();
            let value = self.value()?;
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, slot)) => *slot = value,
                None => entries.push((key, value)),
            }

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error("expected `,` or `}` after value")),
            }
        }
    }

    fn key(&mut self) -> Result<String, PayloadError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.quoted(quote)
            }
            _ => {
                let bare = self.bare(&[':', ',', '}'])?;
                Ok(bare.to_string())
            }
        }
    }

    fn value(&mut self) -> Result<AttrValue, PayloadError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                Ok(AttrValue::Str(self.quoted(quote)?))
            }
            Some('[') => {
                self.bump();
                Ok(AttrValue::StrList(self.list()?))
            }
            Some('{') => Err(self.error("nested mappings are not supported")),
            _ => {
                let bare = self.bare(&[',', '}'])?;
                Ok(bare_scalar(bare))
            }
        }
    }

    fn list(&mut self) -> Result<Vec<String>, PayloadError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(items);
                }
                Some(quote @ ('"' | '\'')) => {
                    self.bump();
                    items.push(self.quoted(quote)?);
                }
                Some('[') | Some('{') => {
                    return Err(self.error("nested collections are not supported"))
                }
                None => return Err(self.error("unterminated list")),
                _ => items.push(self.bare(&[',', ']'])?.to_string()),
            }

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                _ => return Err(self.error("expected `,` or `]` in list")),
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, PayloadError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(escaped @ ('\\' | '\'' | '"')) => value.push(escaped),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn bare(&mut self, stops: &[char]) -> Result<&'a str, PayloadError> {
        let start = self.pos;
        while self.peek().is_some_and(|ch| !stops.contains(&ch)) {
            self.bump();
        }
        let bare = self.text[start..self.pos].trim();
        if bare.is_empty() {
            return Err(PayloadError {
                offset: start,
                message: "expected a key or value",
            });
        }
        Ok(bare)
    }
}

fn bare_scalar(text: &str) -> AttrValue {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
        // Out-of-range integers stay text rather than turning into floats.
        return text
            .parse::<i64>()
            .map(AttrValue::Int)
            .unwrap_or_else(|_| AttrValue::Str(text.to_string()));
    }
    // Rust also parses `inf`/`nan`; a Python literal would need digits.
    if text.chars().any(|ch| ch.is_ascii_digit()) {
        if let Some(number) = text.parse::<f64>().ok().filter(|n| n.is_finite()) {
            return AttrValue::Float(number);
        }
    }
    AttrValue::Str(text.to_string())
}
