//! Property-based tests for genplay-syntax.
//!
//! Run with: cargo test -p genplay-syntax --test `property_tests`

use genplay_syntax::{format_source, normalize_key, parse};
use proptest::prelude::*;

// ============================================================================
// Arbitrary generators
// ============================================================================

/// Tokens that never merge with their neighbours when whitespace is removed
/// between punctuation and re-added between words.
fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9]{0,6}".prop_map(|s| s),
        (0u32..1000).prop_map(|n| n.to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just(";".to_string()),
        Just(",".to_string()),
        Just("\"text\"".to_string()),
    ]
}

fn arb_whitespace() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just(' '), Just('\t'), Just('\n')], 1..4)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,8}".prop_map(|s| s)
}

// ============================================================================
// Normalized keys
// ============================================================================

proptest! {
    #[test]
    fn key_ignores_whitespace(
        tokens in prop::collection::vec(arb_token(), 0..30),
        spaces in prop::collection::vec(arb_whitespace(), 30),
    ) {
        let plain = tokens.join(" ");
        let mut spaced = String::new();
        for (token, ws) in tokens.iter().zip(spaces.iter()) {
            spaced.push_str(ws);
            spaced.push_str(token);
        }
        prop_assert_eq!(normalize_key(&plain), normalize_key(&spaced));
    }

    #[test]
    fn key_ignores_comments(
        tokens in prop::collection::vec(arb_token(), 1..20),
        comment in "[a-z ]{0,20}",
    ) {
        let plain = tokens.join(" ");
        let commented = format!("// {comment}\n{}\n/* {comment} */", tokens.join(" "));
        prop_assert_eq!(normalize_key(&plain), normalize_key(&commented));
    }
}

// ============================================================================
// Parser and formatter
// ============================================================================

proptest! {
    #[test]
    fn parser_never_panics(source in "[ -~\n]{0,200}") {
        let _ = parse(&source);
    }

    #[test]
    fn formatting_is_stable(
        type_name in arb_name(),
        method in arb_name(),
        values in prop::collection::vec(0i64..10_000, 0..6),
    ) {
        let stmts: String = values
            .iter()
            .map(|v| format!("Console.WriteLine({v} * 2 + {v});"))
            .collect();
        let source = format!("type {type_name} {{ static fn {method}() {{ {stmts} }} }}");
        let once = format_source(&source).expect("generated source parses");
        let twice = format_source(&once).expect("formatted source parses");
        prop_assert_eq!(once, twice);
    }
}
