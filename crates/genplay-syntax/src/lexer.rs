//! Lexer for Gen source using Logos.
//!
//! Whitespace is skipped by the generated DFA. Comments are produced as
//! tokens so the normalized cache key and the parser can both decide what to
//! do with them; [`tokenize`] drops them before parsing.

use crate::span::Span;
use logos::Logos;
use std::fmt;

/// Token types produced by the Logos lexer.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'src> {
    // ===== Literals =====
    /// A floating point literal such as `1.5`.
    #[regex(r"[0-9]+\.[0-9]+")]
    Float(&'src str),

    /// An integer literal.
    #[regex(r"[0-9]+")]
    Int(&'src str),

    /// A double-quoted string with backslash escapes.
    /// The slice includes the quotes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str(&'src str),

    /// A verbatim string `@"..."` where `""` is an escaped quote.
    /// The slice includes the `@` and the quotes. One missing its closing
    /// quote is turned into [`Token::UnterminatedStr`] by [`tokenize`].
    #[token("@\"", lex_verbatim)]
    VerbatimStr(&'src str),

    /// A string literal missing its closing quote (runs to end of input).
    #[regex(r#""([^"\\]|\\.)*"#)]
    UnterminatedStr(&'src str),

    /// An identifier.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'src str),

    /// A line or block comment, including its delimiters.
    #[regex(r"//[^\n]*")]
    #[token("/*", lex_block_comment)]
    Comment(&'src str),

    // ===== Keywords =====
    /// The `type` keyword.
    #[token("type")]
    Type,
    /// The `capability` keyword.
    #[token("capability")]
    Capability,
    /// The `abstract` modifier.
    #[token("abstract")]
    Abstract,
    /// The `static` modifier.
    #[token("static")]
    Static,
    /// The `extern` modifier.
    #[token("extern")]
    Extern,
    /// The `async` modifier.
    #[token("async")]
    Async,
    /// The `await` operator.
    #[token("await")]
    Await,
    /// The `fn` keyword.
    #[token("fn")]
    Fn,
    /// The `let` keyword.
    #[token("let")]
    Let,
    /// The `if` keyword.
    #[token("if")]
    If,
    /// The `else` keyword.
    #[token("else")]
    Else,
    /// The `while` keyword.
    #[token("while")]
    While,
    /// The `for` keyword.
    #[token("for")]
    For,
    /// The `in` keyword.
    #[token("in")]
    In,
    /// The `return` keyword.
    #[token("return")]
    Return,
    /// The `throw` keyword.
    #[token("throw")]
    Throw,
    /// The `try` keyword.
    #[token("try")]
    Try,
    /// The `catch` keyword.
    #[token("catch")]
    Catch,
    /// The `break` keyword.
    #[token("break")]
    Break,
    /// The `continue` keyword.
    #[token("continue")]
    Continue,
    /// The `new` keyword.
    #[token("new")]
    New,
    /// The `self` receiver.
    #[token("self")]
    SelfKw,
    /// The `true` literal.
    #[token("true")]
    True,
    /// The `false` literal.
    #[token("false")]
    False,
    /// The `null` literal.
    #[token("null")]
    Null,

    // ===== Punctuation =====
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semi,
    /// `.`
    #[token(".")]
    Dot,
    /// `:`
    #[token(":")]
    Colon,
    /// `->`
    #[token("->")]
    Arrow,
    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `>`
    #[token(">")]
    Gt,
    /// `=`
    #[token("=")]
    Assign,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `!`
    #[token("!")]
    Bang,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,

    /// Error token for unrecognized input (inserted by [`tokenize`]).
    Error,
}

/// Byte length of a verbatim string body up to and including its closing
/// quote, or `None` when the text ends first.
fn verbatim_body_len(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Callback for a verbatim string: consume through the closing quote, or
/// to the end of input when there is none.
fn lex_verbatim<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> &'src str {
    let rest = lex.remainder();
    lex.bump(verbatim_body_len(rest).unwrap_or(rest.len()));
    lex.slice()
}

/// Callback for a block comment: consume through the first `*/`.
/// An unclosed comment swallows the rest of the input as an error.
fn lex_block_comment<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Some(lex.slice())
        }
        None => {
            lex.bump(rest.len());
            None
        }
    }
}

impl Token<'_> {
    /// Returns true if this token may begin a type declaration.
    pub const fn starts_type_decl(&self) -> bool {
        matches!(self, Self::Type | Self::Capability | Self::Abstract)
    }

    /// Returns true for comment tokens.
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_))
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Float(s)
            | Self::Int(s)
            | Self::Str(s)
            | Self::VerbatimStr(s)
            | Self::UnterminatedStr(s)
            | Self::Ident(s)
            | Self::Comment(s) => *s,
            Self::Error => "<error>",
            Self::Type => "type",
            Self::Capability => "capability",
            Self::Abstract => "abstract",
            Self::Static => "static",
            Self::Extern => "extern",
            Self::Async => "async",
            Self::Await => "await",
            Self::Fn => "fn",
            Self::Let => "let",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::In => "in",
            Self::Return => "return",
            Self::Throw => "throw",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::New => "new",
            Self::SelfKw => "self",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::Arrow => "->",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Assign => "=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
        };
        f.write_str(text)
    }
}

/// Tokenize source code, keeping comments.
///
/// Unrecognized input becomes [`Token::Error`] so later stages can report it
/// at the right position.
pub fn tokenize_with_trivia(source: &str) -> Vec<(Token<'_>, Span)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(Token::VerbatimStr(text)) if verbatim_body_len(&text[2..]).is_none() => {
                tokens.push((Token::UnterminatedStr(text), span));
            }
            Ok(token) => tokens.push((token, span)),
            Err(()) => tokens.push((Token::Error, span)),
        }
    }
    tokens
}

/// Tokenize source code into (Token, Span) pairs, dropping comments.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Span)> {
    tokenize_with_trivia(source)
        .into_iter()
        .filter(|(token, _)| !token.is_trivia())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_tokenize_keywords_and_idents() {
        let tokens = kinds("static fn Main typed");
        assert_eq!(
            tokens,
            vec![
                Token::Static,
                Token::Fn,
                Token::Ident("Main"),
                Token::Ident("typed"),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(kinds("42"), vec![Token::Int("42")]);
        assert_eq!(kinds("4.25"), vec![Token::Float("4.25")]);
        assert_eq!(
            kinds("1.Foo"),
            vec![Token::Int("1"), Token::Dot, Token::Ident("Foo")]
        );
    }

    #[test]
    fn test_tokenize_strings() {
        assert_eq!(kinds(r#""a\"b""#), vec![Token::Str(r#""a\"b""#)]);
        assert_eq!(
            kinds("@\"line\n\"\"q\"\"\""),
            vec![Token::VerbatimStr("@\"line\n\"\"q\"\"\"")]
        );
    }

    #[test]
    fn test_tokenize_verbatim_string_in_call() {
        assert_eq!(
            kinds(r#"Write(@"say ""hi""", @"")"#),
            vec![
                Token::Ident("Write"),
                Token::LParen,
                Token::VerbatimStr(r#"@"say ""hi""""#),
                Token::Comma,
                Token::VerbatimStr(r#"@"""#),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        assert_eq!(kinds("\"abc"), vec![Token::UnterminatedStr("\"abc")]);
        assert_eq!(
            kinds("x @\"open \"\" end"),
            vec![Token::Ident("x"), Token::UnterminatedStr("@\"open \"\" end")]
        );
    }

    #[test]
    fn test_tokenize_comments() {
        let with = tokenize_with_trivia("a // note\n/* block\n */ b");
        assert_eq!(with.len(), 4);
        assert_eq!(kinds("a // note\n/* block\n */ b"), vec![Token::Ident("a"), Token::Ident("b")]);
    }

    #[test]
    fn test_block_comment_ends_at_first_close() {
        assert_eq!(
            tokenize_with_trivia("/* a ** b */ c /**/ */"),
            vec![
                (Token::Comment("/* a ** b */"), Span::new(0, 12)),
                (Token::Ident("c"), Span::new(13, 14)),
                (Token::Comment("/**/"), Span::new(15, 19)),
                (Token::Star, Span::new(20, 21)),
                (Token::Slash, Span::new(21, 22)),
            ]
        );
    }

    #[test]
    fn test_unclosed_block_comment_is_one_error() {
        let tokens = tokenize("a /* never closed");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[1].0, Token::Error));
        assert_eq!(tokens[1].1, Span::new(2, 17));
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("<= < == = -> - && ||"),
            vec![
                Token::LtEq,
                Token::Lt,
                Token::EqEq,
                Token::Assign,
                Token::Arrow,
                Token::Minus,
                Token::AndAnd,
                Token::OrOr,
            ]
        );
    }

    #[test]
    fn test_tokenize_error_token() {
        let tokens = tokenize("a # b");
        assert!(matches!(tokens[1].0, Token::Error));
        assert_eq!(tokens[1].1, Span::new(2, 3));
    }
}
