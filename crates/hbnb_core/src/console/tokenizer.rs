//! Argument tokenizer for canonical verb-form commands.
//!
//! # Invariants
//! - Whitespace separates tokens except inside quotes.
//! - Quotes group text and are removed from the token value; `""` yields an
//!   empty token.
//! - A token starting with `{` swallows the rest of the line verbatim, so a
//!   structured payload reaches the dispatcher as one token.

/// Splits a command body into argument tokens.
pub fn tokenize(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = body.char_indices();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '{' if !in_token => {
                tokens.push(body[index..].trim_end().to_string());
                return tokens;
            }
            '"' | '\'' => {
                in_token = true;
                for (_, inner) in chars.by_ref() {
                    if inner == ch {
                        break;
                    }
                    current.push(inner);
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Splits a line into its verb and the untouched remainder.
pub fn split_verb(line: &str) -> (&str, &str) {
    let trimmed = line.trim();
    match trimmed.find(char::is_whitespace) {
        Some(index) => (&trimmed[..index], trimmed[index..].trim_start()),
        None => (trimmed, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::{split_verb, tokenize};

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("  User   1234 name "), vec!["User", "1234", "name"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn quoted_spans_are_single_tokens_without_quotes() {
        assert_eq!(
            tokenize(r#"User 12 first_name "Betty Sue""#),
            vec!["User", "12", "first_name", "Betty Sue"]
        );
        assert_eq!(tokenize("User '12'"), vec!["User", "12"]);
        assert_eq!(tokenize(r#"User "" name"#), vec!["User", "", "name"]);
    }

    #[test]
    fn quotes_inside_a_token_join_with_neighbours() {
        assert_eq!(tokenize(r#"name="Betty Sue""#), vec!["name=Betty Sue"]);
        assert_eq!(tokenize(r#""it's""#), vec!["it's"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(tokenize(r#"User "abc def"#), vec!["User", "abc def"]);
    }

    #[test]
    fn brace_payload_is_one_opaque_token() {
        assert_eq!(
            tokenize("User 12 {'first_name': 'Betty', 'age': 89}  "),
            vec!["User", "12", "{'first_name': 'Betty', 'age': 89}"]
        );
        assert_eq!(tokenize("User 12 {}"), vec!["User", "12", "{}"]);
    }

    #[test]
    fn brace_inside_a_token_is_ordinary_text() {
        assert_eq!(tokenize("a{b} c"), vec!["a{b}", "c"]);
    }

    #[test]
    fn split_verb_separates_first_word() {
        assert_eq!(split_verb("  show User 12 "), ("show", "User 12"));
        assert_eq!(split_verb("quit"), ("quit", ""));
        assert_eq!(split_verb(""), ("", ""));
    }
}
