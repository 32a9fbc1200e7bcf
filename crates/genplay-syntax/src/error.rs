//! Parse error types.

use crate::Span;
use genplay_core::{Diagnostic, DiagnosticCode, LineIndex};
use thiserror::Error;

/// A syntax error at a byte span.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Offending bytes.
    pub span: Span,
    /// Where in the grammar the error was found.
    pub context: Option<String>,
    /// How to fix it, appended to the diagnostic message.
    pub hint: Option<String>,
}

impl ParseError {
    /// Error of `kind` at `span`.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            context: None,
            hint: None,
        }
    }

    /// Attach grammar context, shown in parentheses.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach a fix suggestion.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Diagnostic code of the error kind.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        match &self.kind {
            ParseErrorKind::UnexpectedChar(_) => DiagnosticCode::UnexpectedChar,
            ParseErrorKind::UnexpectedEof => DiagnosticCode::UnexpectedEof,
            ParseErrorKind::UnexpectedToken(_) | ParseErrorKind::InvalidLiteral(_) => {
                DiagnosticCode::UnexpectedToken
            }
            ParseErrorKind::UnterminatedString => DiagnosticCode::UnterminatedString,
        }
    }

    /// Located diagnostic for the named file.
    #[must_use]
    pub fn to_diagnostic(&self, file: &str, lines: &LineIndex) -> Diagnostic {
        let message = match &self.hint {
            Some(hint) => format!("{self}; {hint}"),
            None => self.to_string(),
        };
        Diagnostic::from_code(self.code(), message).at(lines.location(file, self.span.start))
    }
}

/// Kinds of syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A character the lexer does not recognise.
    #[error("unexpected character '{0}'")]
    UnexpectedChar(String),
    /// Input ended inside a construct.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A token that does not fit the grammar here.
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    /// A string literal without its closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,
    /// A literal that cannot be represented, such as an overflowing integer.
    #[error("{0}")]
    InvalidLiteral(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_error_text() {
        let err = ParseError::new(ParseErrorKind::UnexpectedEof, Span::new(0, 5));
        assert_eq!(err.to_string(), "unexpected end of input");
        assert_eq!(err.code(), DiagnosticCode::UnexpectedEof);
    }

    #[test]
    fn test_parse_error_with_context() {
        let err = ParseError::new(ParseErrorKind::UnexpectedToken("}".into()), Span::new(3, 4))
            .with_context("in type 'Program'");
        assert_eq!(err.to_string(), "unexpected token '}' (in type 'Program')");
    }

    #[test]
    fn test_to_diagnostic_is_located() {
        let source = "type A {\n  fn x( {\n}";
        let err = ParseError::new(ParseErrorKind::UnexpectedToken("{".into()), Span::new(17, 18))
            .with_hint("expected ')'");
        let diag = err.to_diagnostic("Generator.gen", &LineIndex::new(source));
        assert_eq!(
            diag.to_string(),
            "Generator.gen(2,9): error P0003: unexpected token '{'; expected ')'"
        );
    }
}
