//! Whitespace- and comment-insensitive source keys.
//!
//! Two sources have the same key exactly when they lex to the same token
//! sequence, which makes the key suitable for caching compiled plugins while
//! the user is only reformatting or editing comments.

use crate::lexer::tokenize;

/// Reduce `source` to its canonical token form.
///
/// Every token's source text is joined by a single space. Lexer error
/// tokens are kept verbatim so that broken sources never collide with valid
/// ones.
#[must_use]
pub fn normalize_key(source: &str) -> String {
    let mut key = String::with_capacity(source.len());
    for (_, span) in tokenize(source) {
        if let Some(text) = span.text(source) {
            if !key.is_empty() {
                key.push(' ');
            }
            key.push_str(text);
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_is_insignificant() {
        assert_eq!(
            normalize_key("type  A{\n\tfn f( ) { }\n}"),
            normalize_key("type A { fn f() { } }")
        );
    }

    #[test]
    fn test_comments_are_insignificant() {
        assert_eq!(
            normalize_key("// header\ntype A { /* body */ }"),
            "type A { }"
        );
    }

    #[test]
    fn test_string_contents_are_significant() {
        assert_ne!(normalize_key(r#"f("a b")"#), normalize_key(r#"f("a  b")"#));
    }

    #[test]
    fn test_blank_source_has_empty_key() {
        assert_eq!(normalize_key("  \n // only a comment\n"), "");
    }
}
