//! Gen language front end: lexer, parser, formatter and cache keys.
//!
//! This crate turns Gen source text into a [`SourceFile`] syntax tree along
//! with any parse errors. Parsing never stops at the first problem: a broken
//! type declaration is skipped so later declarations still parse.
//!
//! # Pieces
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`lexer`] | Logos token definitions and tokenization |
//! | [`ast`] | Syntax tree types |
//! | [`parse`] | Chumsky token parser with error recovery |
//! | [`format_source`] | Canonical pretty-printer |
//! | [`normalize_key`] | Whitespace/comment-insensitive cache key |
//!
//! # Example
//!
//! ```
//! use genplay_syntax::parse;
//!
//! let source = r#"
//! type Program {
//!     static fn Main() {
//!         Console.WriteLine("Hello");
//!     }
//! }
//! "#;
//!
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//! assert_eq!(result.file.types[0].name.name, "Program");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
mod error;
mod format;
pub mod lexer;
mod normalize;
mod span;
mod token_parser;

pub use ast::SourceFile;
pub use error::{ParseError, ParseErrorKind};
pub use format::{format_source, format_source_file};
pub use normalize::normalize_key;
pub use span::Span;

use genplay_core::{Diagnostic, LineIndex, SourceUnit};

/// Result of parsing a Gen source file.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Successfully parsed type declarations.
    pub file: SourceFile,
    /// Parse errors encountered, ordered by position.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns true if no errors were reported.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse Gen source code.
///
/// Uses a token-based parser (Logos lexer + Chumsky combinators).
pub fn parse(source: &str) -> ParseResult {
    token_parser::parse(source)
}

/// Parse a source unit, returning its tree and located diagnostics.
pub fn parse_unit(unit: &SourceUnit) -> (SourceFile, Vec<Diagnostic>) {
    let result = parse(&unit.text);
    let lines = LineIndex::new(&unit.text);
    let diagnostics = result
        .errors
        .iter()
        .map(|e| e.to_diagnostic(&unit.name, &lines))
        .collect();
    (result.file, diagnostics)
}
