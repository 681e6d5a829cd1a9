//! Dotted-call syntax rewriting.
//!
//! # Responsibility
//! - Rewrite `<Kind>.<verb>(<args>)` lines into canonical `<verb> <Kind> <args>`
//!   text so one dispatcher path serves both syntaxes.
//!
//! # Invariants
//! - Rules are tried in order; the first match wins. The structured-payload
//!   update rule precedes the single-attribute update rule.
//! - Lines no rule recognizes pass through unchanged.
//! - Rewriting never fails: malformed arguments become empty or missing
//!   fields and the dispatcher reports the precise usage error.

use crate::model::value::strip_matching_quotes;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// One recognizer/rewrite pair.
pub struct RewriteRule {
    pub name: &'static str,
    pattern: &'static Lazy<Regex>,
    rewrite: fn(&Captures<'_>) -> String,
}

impl RewriteRule {
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Rewritten text when `line` matches this rule.
    pub fn apply(&self, line: &str) -> Option<String> {
        self.pattern
            .captures(line)
            .map(|captures| (self.rewrite)(&captures))
    }
}

static ALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w*)\.all\(\s*\)\s*$").expect("valid all regex"));
static COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w*)\.count\(\s*\)\s*$").expect("valid count regex"));
static SHOW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w*)\.show\((.*)\)\s*$").expect("valid show regex"));
static DESTROY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w*)\.destroy\((.*)\)\s*$").expect("valid destroy regex"));
static UPDATE_PAYLOAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w*)\.update\(\s*([^,{]*?)\s*,\s*(\{.*\})\s*\)\s*$")
        .expect("valid update payload regex")
});
static UPDATE_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w*)\.update\((.*)\)\s*$").expect("valid update regex"));

/// Dotted-call rules in match order.
pub static RULES: [RewriteRule; 6] = [
    RewriteRule {
        name: "all",
        pattern: &ALL_RE,
        rewrite: rewrite_all,
    },
    RewriteRule {
        name: "count",
        pattern: &COUNT_RE,
        rewrite: rewrite_count,
    },
    RewriteRule {
        name: "show",
        pattern: &SHOW_RE,
        rewrite: rewrite_show,
    },
    RewriteRule {
        name: "destroy",
        pattern: &DESTROY_RE,
        rewrite: rewrite_destroy,
    },
    RewriteRule {
        name: "update_payload",
        pattern: &UPDATE_PAYLOAD_RE,
        rewrite: rewrite_update_payload,
    },
    RewriteRule {
        name: "update_attribute",
        pattern: &UPDATE_ATTR_RE,
        rewrite: rewrite_update_attribute,
    },
];

/// Rewrites a dotted call into canonical verb form, or returns the line as is.
pub fn normalize(line: &str) -> Cow<'_, str> {
    for rule in &RULES {
        if let Some(rewritten) = rule.apply(line) {
            debug!("event=normalize module=console rule={}", rule.name);
            return Cow::Owned(rewritten);
        }
    }
    Cow::Borrowed(line)
}

fn kind<'h>(captures: &Captures<'h>) -> &'h str {
    captures.get(1).map_or("", |m| m.as_str())
}

fn rewrite_all(captures: &Captures<'_>) -> String {
    join_command("all", kind(captures), &[])
}

fn rewrite_count(captures: &Captures<'_>) -> String {
    join_command("count", kind(captures), &[])
}

fn rewrite_show(captures: &Captures<'_>) -> String {
    let args = split_call_args(captures.get(2).map_or("", |m| m.as_str()));
    join_command("show", kind(captures), &args[..args.len().min(1)])
}

fn rewrite_destroy(captures: &Captures<'_>) -> String {
    let args = split_call_args(captures.get(2).map_or("", |m| m.as_str()));
    join_command("destroy", kind(captures), &args[..args.len().min(1)])
}

fn rewrite_update_payload(captures: &Captures<'_>) -> String {
    let id = strip_matching_quotes(captures.get(2).map_or("", |m| m.as_str()).trim());
    let payload = captures.get(3).map_or("", |m| m.as_str());
    let mut command = join_command("update", kind(captures), &[id.to_string()]);
    if id.is_empty() {
        command.push_str(" \"\"");
    }
    command.push(' ');
    command.push_str(payload);
    command
}

fn rewrite_update_attribute(captures: &Captures<'_>) -> String {
    let args = split_call_args(captures.get(2).map_or("", |m| m.as_str()));
    join_command("update", kind(captures), &args[..args.len().min(3)])
}

/// Joins verb, kind and arguments, quoting arguments the tokenizer would
/// otherwise split or drop. Trailing empty arguments are omitted so the
/// dispatcher sees them as missing.
fn join_command(verb: &str, kind: &str, args: &[String]) -> String {
    let used = args
        .iter()
        .rposition(|arg| !arg.is_empty())
        .map_or(0, |last| last + 1);

    let mut command = verb.to_string();
    if !kind.is_empty() || used > 0 {
        command.push(' ');
        command.push_str(if kind.is_empty() { "\"\"" } else { kind });
    }
    for arg in &args[..used] {
        command.push(' ');
        command.push_str(&quote_arg(arg));
    }
    command
}

fn quote_arg(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg.starts_with('{')
        || arg
            .chars()
            .any(|ch| ch.is_whitespace() || ch == '"' || ch == '\'');
    if !needs_quotes {
        return arg.to_string();
    }
    if arg.contains('"') {
        format!("'{arg}'")
    } else {
        format!("\"{arg}\"")
    }
}

/// Splits call arguments on commas outside quotes, trimming each and
/// stripping one pair of matching quotes.
fn split_call_args(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in raw.chars() {
        match (quote, ch) {
            (None, ',') => args.push(std::mem::take(&mut current)),
            (None, '"' | '\'') => {
                quote = Some(ch);
                current.push(ch);
            }
            (Some(open), c) if c == open => {
                quote = None;
                current.push(c);
            }
            (_, c) => current.push(c),
        }
    }
    args.push(current);

    args.into_iter()
        .map(|arg| strip_matching_quotes(arg.trim()).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize, split_call_args, RULES};

    #[test]
    fn rewrites_all_and_count() {
        assert_eq!(normalize("User.all()"), "all User");
        assert_eq!(normalize("City.count()"), "count City");
        assert_eq!(normalize(".all()"), "all");
    }

    #[test]
    fn rewrites_show_and_destroy_stripping_quotes() {
        assert_eq!(normalize(r#"User.show("1234-abcd")"#), "show User 1234-abcd");
        assert_eq!(normalize("User.show('1234')"), "show User 1234");
        assert_eq!(normalize("User.destroy(1234)"), "destroy User 1234");
        assert_eq!(normalize("User.show()"), "show User");
    }

    #[test]
    fn rewrites_single_attribute_update() {
        assert_eq!(
            normalize(r#"User.update("38f22813", "first_name", "Betty")"#),
            "update User 38f22813 first_name Betty"
        );
        assert_eq!(
            normalize(r#"User.update("38f22813", "first_name", "Betty Sue")"#),
            r#"update User 38f22813 first_name "Betty Sue""#
        );
        assert_eq!(
            normalize(r#"User.update("38f22813", "first_name")"#),
            "update User 38f22813 first_name"
        );
        assert_eq!(
            normalize(r#"User.update("", "first_name", "x")"#),
            r#"update User "" first_name x"#
        );
    }

    #[test]
    fn payload_update_keeps_braces_verbatim() {
        assert_eq!(
            normalize(r#"User.update("38f22813", {'first_name': "John", "age": 89})"#),
            r#"update User 38f22813 {'first_name': "John", "age": 89}"#
        );
        assert_eq!(normalize("User.update('1', {})"), "update User 1 {}");
    }

    #[test]
    fn payload_rule_wins_over_attribute_rule() {
        let line = r#"Place.update("p1", {'max_guest': 4})"#;
        let matching = RULES
            .iter()
            .filter(|rule| rule.matches(line))
            .map(|rule| rule.name)
            .collect::<Vec<_>>();
        assert_eq!(matching, vec!["update_payload", "update_attribute"]);
        assert_eq!(normalize(line), "update Place p1 {'max_guest': 4}");
    }

    #[test]
    fn unrecognized_lines_pass_through() {
        assert_eq!(normalize("show User 1234"), "show User 1234");
        assert_eq!(normalize("User.fly()"), "User.fly()");
        assert_eq!(normalize("User.show(1234"), "User.show(1234");
    }

    #[test]
    fn split_call_args_respects_quotes() {
        assert_eq!(
            split_call_args(r#" "a, b" , 'c' ,d "#),
            vec!["a, b".to_string(), "c".to_string(), "d".to_string()]
        );
        assert!(split_call_args("  ").is_empty());
    }
}
