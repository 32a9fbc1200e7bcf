//! Token-based parser using the Logos lexer + Chumsky.
//!
//! # Architecture
//!
//! ```text
//! Source (&str) → Logos tokenize() → Vec<SpannedToken> → Chumsky parser → SourceFile
//! ```
//!
//! Every token carries its own byte span, so leaf nodes take their span from
//! the token they were built from and composite nodes merge the spans of
//! their first and last pieces. Chumsky's own spans (token indices) are only
//! used for error reporting, via [`index_to_byte_span`].
//!
//! Recovery happens at type-declaration granularity: a broken declaration is
//! skipped up to the next `type`, `capability` or `abstract` keyword so one
//! file can report several independent errors.

use chumsky::error::RichReason;
use chumsky::prelude::*;
use chumsky::Boxed;
use std::fmt;

use crate::ast::{
    BinaryOp, Block, ElseBranch, Expr, ExprKind, FieldDecl, Ident, Literal, Member, MethodDecl,
    Param, SourceFile, Stmt, StmtKind, TypeDecl, TypeKind, UnaryOp,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{tokenize, Token};
use crate::span::Span;
use crate::ParseResult;

// ============================================================================
// Token Input Types
// ============================================================================

/// A token paired with its byte offset span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken<'src> {
    /// The token.
    pub token: Token<'src>,
    /// Byte offset span.
    pub span: Span,
}

impl fmt::Display for SpannedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}

type Input<'src> = &'src [SpannedToken<'src>];

/// Type alias for parser extra with our token type.
type TokExtra<'src> = extra::Err<Rich<'src, SpannedToken<'src>>>;

type BoxedParser<'src, O> = Boxed<'src, 'src, Input<'src>, O, TokExtra<'src>>;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert raw tokens from the lexer to `SpannedToken`s for parsing.
fn make_tokens(source: &str) -> Vec<SpannedToken<'_>> {
    tokenize(source)
        .into_iter()
        .map(|(token, span)| SpannedToken { token, span })
        .collect()
}

/// Get the byte span from a slice index span, using the token spans.
fn index_to_byte_span(tokens: &[SpannedToken<'_>], start_idx: usize, end_idx: usize) -> Span {
    let eof = tokens.last().map_or(0, |t| t.span.end);
    let start = tokens.get(start_idx).map_or(eof, |t| t.span.start);
    let end = end_idx
        .checked_sub(1)
        .and_then(|i| tokens.get(i))
        .map_or(eof, |t| t.span.end)
        .max(start);
    Span::new(start, end)
}

/// Resolve backslash escapes in the body of a quoted string.
fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                chars.next();
                match next {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '0' => result.push('\0'),
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    _ => {
                        result.push('\\');
                        result.push(next);
                    }
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ============================================================================
// Token Matchers (Primitives)
// ============================================================================

// Matchers use `select!` rather than `any().filter(..)`: a failed `select!`
// rewinds before recording its error, so the error sits on the offending
// token and carries it as `found`.

/// Match a keyword or punctuation token, yielding its span.
macro_rules! tok {
    ($name:ident, $variant:ident) => {
        fn $name<'src>() -> impl Parser<'src, Input<'src>, Span, TokExtra<'src>> + Clone {
            select! { SpannedToken { token: Token::$variant, span } => span }
        }
    };
}

tok!(tok_type, Type);
tok!(tok_capability, Capability);
tok!(tok_abstract, Abstract);
tok!(tok_static, Static);
tok!(tok_extern, Extern);
tok!(tok_async, Async);
tok!(tok_await, Await);
tok!(tok_fn, Fn);
tok!(tok_let, Let);
tok!(tok_if, If);
tok!(tok_else, Else);
tok!(tok_while, While);
tok!(tok_for, For);
tok!(tok_in, In);
tok!(tok_return, Return);
tok!(tok_throw, Throw);
tok!(tok_try, Try);
tok!(tok_catch, Catch);
tok!(tok_break, Break);
tok!(tok_continue, Continue);
tok!(tok_new, New);
tok!(tok_self, SelfKw);
tok!(tok_lbrace, LBrace);
tok!(tok_rbrace, RBrace);
tok!(tok_lparen, LParen);
tok!(tok_rparen, RParen);
tok!(tok_lbracket, LBracket);
tok!(tok_rbracket, RBracket);
tok!(tok_comma, Comma);
tok!(tok_semi, Semi);
tok!(tok_dot, Dot);
tok!(tok_colon, Colon);
tok!(tok_arrow, Arrow);
tok!(tok_eqeq, EqEq);
tok!(tok_noteq, NotEq);
tok!(tok_lteq, LtEq);
tok!(tok_gteq, GtEq);
tok!(tok_lt, Lt);
tok!(tok_gt, Gt);
tok!(tok_assign, Assign);
tok!(tok_andand, AndAnd);
tok!(tok_oror, OrOr);
tok!(tok_bang, Bang);
tok!(tok_plus, Plus);
tok!(tok_minus, Minus);
tok!(tok_star, Star);
tok!(tok_slash, Slash);
tok!(tok_percent, Percent);

/// Match an identifier.
fn tok_ident<'src>() -> impl Parser<'src, Input<'src>, Ident, TokExtra<'src>> + Clone {
    select! { SpannedToken { token: Token::Ident(name), span } => Ident::new(name, span) }
}

/// Match a literal token and convert it to a [`Literal`].
fn tok_literal<'src>() -> impl Parser<'src, Input<'src>, (Literal, Span), TokExtra<'src>> + Clone {
    select! {
        t @ SpannedToken {
            token: Token::Int(_)
                | Token::Float(_)
                | Token::Str(_)
                | Token::VerbatimStr(_)
                | Token::True
                | Token::False
                | Token::Null,
            ..
        } => t
    }
    .try_map(|t: SpannedToken<'src>, span| {
        let literal = match t.token {
            Token::Int(s) => Literal::Int(s.parse().map_err(|_| {
                Rich::custom(span, format!("integer literal '{s}' is out of range"))
            })?),
            Token::Float(s) => Literal::Float(
                s.parse()
                    .map_err(|_| Rich::custom(span, format!("invalid float literal '{s}'")))?,
            ),
            Token::Str(s) => Literal::Str(unescape(&s[1..s.len() - 1])),
            Token::VerbatimStr(s) => Literal::Str(s[2..s.len() - 1].replace("\"\"", "\"")),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Null => Literal::Null,
            _ => return Err(Rich::custom(span, "expected literal")),
        };
        Ok((literal, t.span))
    })
}

/// A literal with an optional leading minus, for parameter defaults.
fn tok_default_literal<'src>() -> impl Parser<'src, Input<'src>, Literal, TokExtra<'src>> + Clone
{
    tok_minus()
        .or_not()
        .then(tok_literal())
        .try_map(|(minus, (literal, _)), span| match (minus, literal) {
            (None, literal) => Ok(literal),
            (Some(_), Literal::Int(n)) => Ok(Literal::Int(-n)),
            (Some(_), Literal::Float(n)) => Ok(Literal::Float(-n)),
            (Some(_), _) => Err(Rich::custom(span, "only numbers can be negated")),
        })
}

// ============================================================================
// Expressions
// ============================================================================

enum Postfix {
    Member(Ident),
    Call(Vec<Expr>, Span),
    Index(Expr, Span),
}

enum Prefix {
    Not,
    Neg,
    Await,
}

fn apply_postfix(target: Expr, op: Postfix) -> Expr {
    match op {
        Postfix::Member(name) => {
            let span = target.span.merge(&name.span);
            Expr::new(
                ExprKind::Member {
                    target: Box::new(target),
                    name,
                },
                span,
            )
        }
        Postfix::Call(args, close) => {
            let span = target.span.merge(&close);
            Expr::new(
                ExprKind::Call {
                    callee: Box::new(target),
                    args,
                },
                span,
            )
        }
        Postfix::Index(index, close) => {
            let span = target.span.merge(&close);
            Expr::new(
                ExprKind::Index {
                    target: Box::new(target),
                    index: Box::new(index),
                },
                span,
            )
        }
    }
}

fn apply_prefix(operand: Expr, (op, at): (Prefix, Span)) -> Expr {
    let span = at.merge(&operand.span);
    let kind = match op {
        Prefix::Not => ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        },
        Prefix::Neg => ExprKind::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        },
        Prefix::Await => ExprKind::Await(Box::new(operand)),
    };
    Expr::new(kind, span)
}

/// One left-associative precedence level.
fn binary_level<'src, P, O>(operand: P, op: O) -> BoxedParser<'src, Expr>
where
    P: Parser<'src, Input<'src>, Expr, TokExtra<'src>> + Clone + 'src,
    O: Parser<'src, Input<'src>, BinaryOp, TokExtra<'src>> + Clone + 'src,
{
    operand
        .clone()
        .foldl(op.then(operand).repeated(), |lhs, (op, rhs)| {
            let span = lhs.span.merge(&rhs.span);
            Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            )
        })
        .boxed()
}

/// Parse an expression with standard precedence.
fn expr_parser<'src>() -> impl Parser<'src, Input<'src>, Expr, TokExtra<'src>> + Clone {
    recursive(|expr| {
        let args = tok_lparen()
            .ignore_then(
                expr.clone()
                    .separated_by(tok_comma())
                    .allow_trailing()
                    .collect::<Vec<_>>(),
            )
            .then(tok_rparen());

        let literal = tok_literal().map(|(lit, span)| Expr::new(ExprKind::Literal(lit), span));
        let name = tok_ident().map(|id| Expr::new(ExprKind::Name(id.name), id.span));
        let self_ref = tok_self().map(|span| Expr::new(ExprKind::SelfRef, span));
        let paren = tok_lparen()
            .ignore_then(expr.clone())
            .then_ignore(tok_rparen());
        let list = tok_lbracket()
            .then(
                expr.clone()
                    .separated_by(tok_comma())
                    .allow_trailing()
                    .collect::<Vec<_>>(),
            )
            .then(tok_rbracket())
            .map(|((open, items), close)| Expr::new(ExprKind::List(items), open.merge(&close)));
        let new_expr = tok_new()
            .then(tok_ident())
            .then(args.clone())
            .map(|((kw, ty), (args, close))| {
                Expr::new(ExprKind::New { ty, args }, kw.merge(&close))
            });

        let primary = choice((literal, self_ref, new_expr, name, paren, list)).boxed();

        let postfix_op = choice((
            tok_dot().ignore_then(tok_ident()).map(Postfix::Member),
            args.map(|(args, close)| Postfix::Call(args, close)),
            tok_lbracket()
                .ignore_then(expr.clone())
                .then(tok_rbracket())
                .map(|(index, close)| Postfix::Index(index, close)),
        ));
        let postfix = primary.foldl(postfix_op.repeated(), apply_postfix).boxed();

        let prefix_op = choice((
            tok_bang().map(|span| (Prefix::Not, span)),
            tok_minus().map(|span| (Prefix::Neg, span)),
            tok_await().map(|span| (Prefix::Await, span)),
        ));
        let unary = prefix_op
            .repeated()
            .collect::<Vec<_>>()
            .then(postfix)
            .map(|(ops, operand)| ops.into_iter().rev().fold(operand, apply_prefix))
            .boxed();

        let product = binary_level(
            unary,
            choice((
                tok_star().to(BinaryOp::Mul),
                tok_slash().to(BinaryOp::Div),
                tok_percent().to(BinaryOp::Rem),
            )),
        );
        let sum = binary_level(
            product,
            choice((tok_plus().to(BinaryOp::Add), tok_minus().to(BinaryOp::Sub))),
        );
        let comparison = binary_level(
            sum,
            choice((
                tok_lteq().to(BinaryOp::LtEq),
                tok_gteq().to(BinaryOp::GtEq),
                tok_lt().to(BinaryOp::Lt),
                tok_gt().to(BinaryOp::Gt),
            )),
        );
        let equality = binary_level(
            comparison,
            choice((tok_eqeq().to(BinaryOp::Eq), tok_noteq().to(BinaryOp::NotEq))),
        );
        let conjunction = binary_level(equality, tok_andand().to(BinaryOp::And));
        binary_level(conjunction, tok_oror().to(BinaryOp::Or))
    })
}

// ============================================================================
// Statements
// ============================================================================

fn stmt(kind: StmtKind, span: Span) -> Stmt {
    Stmt { kind, span }
}

/// Parse a braced block of statements.
fn block_parser<'src>() -> impl Parser<'src, Input<'src>, Block, TokExtra<'src>> + Clone {
    let expr = expr_parser().boxed();

    recursive(move |block| {
        let let_stmt = tok_let()
            .then(tok_ident())
            .then(tok_assign().ignore_then(expr.clone()).or_not())
            .then(tok_semi())
            .map(|(((kw, name), init), semi)| stmt(StmtKind::Let { name, init }, kw.merge(&semi)));

        let if_stmt = recursive(|if_stmt| {
            tok_if()
                .then(expr.clone())
                .then(block.clone())
                .then(
                    tok_else()
                        .ignore_then(choice((
                            if_stmt.map(|s: Stmt| ElseBranch::If(Box::new(s))),
                            block.clone().map(ElseBranch::Block),
                        )))
                        .or_not(),
                )
                .map(|(((kw, cond), then_block), else_branch): (((Span, Expr), Block), _)| {
                    let end = match &else_branch {
                        Some(ElseBranch::Block(b)) => b.span,
                        Some(ElseBranch::If(s)) => s.span,
                        None => then_block.span,
                    };
                    stmt(
                        StmtKind::If {
                            cond,
                            then_block,
                            else_branch,
                        },
                        kw.merge(&end),
                    )
                })
        });

        let while_stmt = tok_while()
            .then(expr.clone())
            .then(block.clone())
            .map(|((kw, cond), body): ((Span, Expr), Block)| {
                let span = kw.merge(&body.span);
                stmt(StmtKind::While { cond, body }, span)
            });

        let for_stmt = tok_for()
            .then(tok_ident())
            .then_ignore(tok_in())
            .then(expr.clone())
            .then(block.clone())
            .map(|(((kw, var), iterable), body): (((Span, Ident), Expr), Block)| {
                let span = kw.merge(&body.span);
                stmt(
                    StmtKind::For {
                        var,
                        iterable,
                        body,
                    },
                    span,
                )
            });

        let return_stmt = tok_return()
            .then(expr.clone().or_not())
            .then(tok_semi())
            .map(|((kw, value), semi)| stmt(StmtKind::Return(value), kw.merge(&semi)));

        let throw_stmt = tok_throw()
            .then(expr.clone())
            .then(tok_semi())
            .map(|((kw, value), semi)| stmt(StmtKind::Throw(value), kw.merge(&semi)));

        let try_stmt = tok_try()
            .then(block.clone())
            .then_ignore(tok_catch())
            .then(
                tok_lparen()
                    .ignore_then(tok_ident())
                    .then_ignore(tok_rparen())
                    .or_not(),
            )
            .then(block.clone())
            .map(
                |(((kw, body), binding), handler): (((Span, Block), Option<Ident>), Block)| {
                    let span = kw.merge(&handler.span);
                    stmt(
                        StmtKind::Try {
                            body,
                            binding,
                            handler,
                        },
                        span,
                    )
                },
            );

        let break_stmt = tok_break()
            .then(tok_semi())
            .map(|(kw, semi)| stmt(StmtKind::Break, kw.merge(&semi)));
        let continue_stmt = tok_continue()
            .then(tok_semi())
            .map(|(kw, semi)| stmt(StmtKind::Continue, kw.merge(&semi)));

        let block_stmt = block.clone().map(|b: Block| {
            let span = b.span;
            stmt(StmtKind::Block(b), span)
        });

        let expr_stmt = expr
            .clone()
            .then(tok_assign().ignore_then(expr.clone()).or_not())
            .then(tok_semi())
            .map(|((target, value), semi)| {
                let span = target.span.merge(&semi);
                match value {
                    Some(value) => stmt(StmtKind::Assign { target, value }, span),
                    None => stmt(StmtKind::Expr(target), span),
                }
            });

        let statement = choice((
            let_stmt,
            if_stmt,
            while_stmt,
            for_stmt,
            return_stmt,
            throw_stmt,
            try_stmt,
            break_stmt,
            continue_stmt,
            block_stmt,
            expr_stmt,
        ))
        .boxed();

        tok_lbrace()
            .then(statement.repeated().collect::<Vec<_>>())
            .then(tok_rbrace())
            .map(|((open, stmts), close)| Block {
                stmts,
                span: open.merge(&close),
            })
    })
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Static,
    Async,
    Extern,
    Abstract,
}

/// Parse a field or method declaration.
fn member_parser<'src>() -> impl Parser<'src, Input<'src>, Member, TokExtra<'src>> + Clone {
    let field = tok_static()
        .or_not()
        .then(tok_let())
        .then(tok_ident())
        .then(tok_assign().ignore_then(expr_parser()).or_not())
        .then(tok_semi())
        .map(|((((is_static, kw), name), init), semi)| {
            Member::Field(FieldDecl {
                name,
                is_static: is_static.is_some(),
                init,
                span: is_static.unwrap_or(kw).merge(&semi),
            })
        });

    let modifier = choice((
        tok_static().map(|span| (Modifier::Static, span)),
        tok_async().map(|span| (Modifier::Async, span)),
        tok_extern().map(|span| (Modifier::Extern, span)),
    ));

    let param = tok_ident()
        .then(tok_colon().ignore_then(tok_ident()).or_not())
        .then(tok_assign().ignore_then(tok_default_literal()).or_not())
        .map(|((name, ty), default)| Param { name, ty, default });

    let params = tok_lparen()
        .ignore_then(
            param
                .separated_by(tok_comma())
                .allow_trailing()
                .collect::<Vec<_>>(),
        )
        .then_ignore(tok_rparen());

    let body = choice((
        block_parser().map(|b: Block| (b.span, Some(b))),
        tok_semi().map(|span| (span, None)),
    ));

    let method = modifier
        .repeated()
        .collect::<Vec<_>>()
        .then(tok_fn())
        .then(tok_ident())
        .then(params)
        .then(tok_arrow().ignore_then(tok_ident()).or_not())
        .then(body)
        .map(|(((((mods, kw), name), params), return_type), (end, body))| {
            let has = |m: Modifier| mods.iter().any(|(x, _)| *x == m);
            let start = mods.first().map_or(kw, |(_, span)| *span);
            Member::Method(MethodDecl {
                name,
                is_static: has(Modifier::Static),
                is_async: has(Modifier::Async),
                is_extern: has(Modifier::Extern),
                params,
                return_type,
                body,
                span: start.merge(&end),
            })
        });

    choice((field, method))
}

/// Parse a `type` or `capability` declaration.
fn type_decl_parser<'src>() -> impl Parser<'src, Input<'src>, TypeDecl, TokExtra<'src>> + Clone {
    let modifier = choice((
        tok_abstract().map(|span| (Modifier::Abstract, span)),
        tok_static().map(|span| (Modifier::Static, span)),
    ));
    let kind = choice((
        tok_type().map(|span| (TypeKind::Type, span)),
        tok_capability().map(|span| (TypeKind::Capability, span)),
    ));
    let generics = tok_lt()
        .ignore_then(
            tok_ident()
                .separated_by(tok_comma())
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(tok_gt());
    let bases = tok_colon().ignore_then(
        tok_ident()
            .separated_by(tok_comma())
            .at_least(1)
            .collect::<Vec<_>>(),
    );

    modifier
        .repeated()
        .collect::<Vec<_>>()
        .then(kind)
        .then(tok_ident())
        .then(generics.or_not())
        .then(bases.or_not())
        .then_ignore(tok_lbrace())
        .then(member_parser().repeated().collect::<Vec<_>>())
        .then(tok_rbrace())
        .map(
            |((((((mods, (kind, kw)), name), generics), bases), members), close)| {
                let start = mods.first().map_or(kw, |(_, span)| *span);
                TypeDecl {
                    kind,
                    name,
                    is_abstract: mods.iter().any(|(m, _)| *m == Modifier::Abstract),
                    is_static: mods.iter().any(|(m, _)| *m == Modifier::Static),
                    generics: generics.unwrap_or_default(),
                    bases: bases.unwrap_or_default(),
                    members,
                    span: start.merge(&close),
                }
            },
        )
}

/// Skip tokens up to the start of the next type declaration.
/// Consumes at least one token to make progress.
fn tok_skip_to_next_type<'src>() -> impl Parser<'src, Input<'src>, (), TokExtra<'src>> + Clone {
    any()
        .then(select! { t @ SpannedToken { .. } if !t.token.starts_type_decl() => () }.repeated())
        .to(())
}

/// Parse a complete file with error recovery.
fn file_parser<'src>() -> impl Parser<'src, Input<'src>, Vec<TypeDecl>, TokExtra<'src>> {
    type_decl_parser()
        .map(Some)
        .recover_with(via_parser(tok_skip_to_next_type().to(None)))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|items| items.into_iter().flatten().collect())
}

// ============================================================================
// Public API
// ============================================================================

/// Parse Gen source code using the token-based parser.
pub fn parse(source: &str) -> ParseResult {
    let tokens = make_tokens(source);

    // Lexer-level problems are reported once here; parser errors that merely
    // trip over the same token are dropped below.
    let mut errors: Vec<ParseError> = tokens
        .iter()
        .filter_map(|t| match t.token {
            Token::Error => Some(ParseError::new(
                ParseErrorKind::UnexpectedChar(t.span.text(source).unwrap_or("?").to_string()),
                t.span,
            )),
            Token::UnterminatedStr(_) => Some(
                ParseError::new(ParseErrorKind::UnterminatedString, t.span)
                    .with_hint("add a closing '\"'"),
            ),
            _ => None,
        })
        .collect();

    let (types, errs) = file_parser().parse(tokens.as_slice()).into_output_errors();

    for e in errs {
        let span = index_to_byte_span(&tokens, e.span().start, e.span().end);
        let kind = if let RichReason::Custom(msg) = e.reason() {
            ParseErrorKind::InvalidLiteral(msg.to_string())
        } else {
            match e.found() {
                None => ParseErrorKind::UnexpectedEof,
                Some(t) if matches!(t.token, Token::Error | Token::UnterminatedStr(_)) => continue,
                Some(t) => ParseErrorKind::UnexpectedToken(t.to_string()),
            }
        };
        errors.push(ParseError::new(kind, span));
    }

    errors.sort_by_key(|e| e.span.start);

    ParseResult {
        file: SourceFile {
            types: types.unwrap_or_default(),
        },
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> SourceFile {
        let result = parse(source);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        result.file
    }

    fn main_body(file: &SourceFile) -> &Block {
        let method = file.types[0].methods().next().expect("method");
        method.body.as_ref().expect("body")
    }

    #[test]
    fn test_parse_empty() {
        let file = parse_ok("");
        assert!(file.types.is_empty());
    }

    #[test]
    fn test_parse_type_with_bases_and_generics() {
        let file = parse_ok("abstract type Repo<T> : Base, IStore { }");
        let decl = &file.types[0];
        assert_eq!(decl.kind, TypeKind::Type);
        assert!(decl.is_abstract);
        assert_eq!(decl.name.name, "Repo");
        assert_eq!(decl.generics.len(), 1);
        let bases: Vec<_> = decl.bases.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(bases, vec!["Base", "IStore"]);
    }

    #[test]
    fn test_parse_capability_signature() {
        let file = parse_ok("capability IFoo { fn Message(); }");
        let method = file.types[0].methods().next().unwrap();
        assert_eq!(file.types[0].kind, TypeKind::Capability);
        assert!(method.body.is_none());
    }

    #[test]
    fn test_parse_method_modifiers_and_params() {
        let file = parse_ok(
            "type A { static async fn Run(a: String, b = -1, c = \"x\") -> Task { } extern static fn Native(v); }",
        );
        let methods: Vec<_> = file.types[0].methods().collect();
        assert!(methods[0].is_static && methods[0].is_async && !methods[0].is_extern);
        assert_eq!(methods[0].params[0].ty.as_ref().unwrap().name, "String");
        assert_eq!(methods[0].params[1].default, Some(Literal::Int(-1)));
        assert_eq!(methods[0].required_params(), 1);
        assert_eq!(methods[0].return_type.as_ref().unwrap().name, "Task");
        assert!(methods[1].is_extern && methods[1].body.is_none());
    }

    #[test]
    fn test_parse_fields() {
        let file = parse_ok("type A { static let count = 0; let name; }");
        let fields: Vec<_> = file.types[0].fields().collect();
        assert!(fields[0].is_static);
        assert!(fields[0].init.is_some());
        assert!(!fields[1].is_static);
        assert!(fields[1].init.is_none());
    }

    #[test]
    fn test_parse_precedence() {
        let file = parse_ok("type A { fn f() { return 1 + 2 * 3 == 7 && !done; } }");
        let StmtKind::Return(Some(expr)) = &main_body(&file).stmts[0].kind else {
            panic!("expected return");
        };
        let ExprKind::Binary { op, lhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        let ExprKind::Binary { op, lhs, .. } = &lhs.kind else {
            panic!("expected equality");
        };
        assert_eq!(*op, BinaryOp::Eq);
        let ExprKind::Binary { op, rhs, .. } = &lhs.kind else {
            panic!("expected sum");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_parse_method_call_chain() {
        let file = parse_ok("type A { fn f() { Console.WriteLine(items[0].ToUpper()); } }");
        let StmtKind::Expr(expr) = &main_body(&file).stmts[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Member { name, .. } if name.name == "WriteLine"));
        assert!(matches!(args[0].kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_parse_statements() {
        let file = parse_ok(
            r#"type A { fn f(xs) {
                let total = 0;
                for x in xs { if x > 2 { continue; } else if x < 0 { break; } else { total = total + x; } }
                while total > 10 { total = total - 1; }
                try { throw new Exception("boom"); } catch (e) { Console.WriteLine(e); }
                self.items[1] = await Load();
                return;
            } }"#,
        );
        let kinds: Vec<_> = main_body(&file)
            .stmts
            .iter()
            .map(|s| std::mem::discriminant(&s.kind))
            .collect();
        assert_eq!(kinds.len(), 6);
        assert!(matches!(main_body(&file).stmts[4].kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_parse_spans_cover_source() {
        let source = "type Program { static fn Main() { } }";
        let file = parse_ok(source);
        assert_eq!(file.types[0].span, Span::new(0, source.len()));
        assert_eq!(file.types[0].name.span.text(source), Some("Program"));
    }

    #[test]
    fn test_unbalanced_brace_reports_eof() {
        let result = parse("type Program { static fn Main() { Console.WriteLine(1); }");
        assert!(!result.errors.is_empty());
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_recovers_at_next_type() {
        let result = parse("type A { fn f( { } } type B { } type C { let; } type D { }");
        let names: Vec<_> = result.file.types.iter().map(|t| t.name.name.as_str()).collect();
        assert_eq!(names, vec!["B", "D"]);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_lexer_errors_are_reported_once() {
        let result = parse("type A { fn f() { let x = 1 # 2; } }");
        let chars: Vec<_> = result
            .errors
            .iter()
            .filter(|e| matches!(e.kind, ParseErrorKind::UnexpectedChar(_)))
            .collect();
        assert_eq!(chars.len(), 1);
        assert_eq!(chars[0].kind, ParseErrorKind::UnexpectedChar("#".into()));
    }

    #[test]
    fn test_integer_overflow_is_invalid_literal() {
        let result = parse("type A { let x = 99999999999999999999; }");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            ParseErrorKind::InvalidLiteral(
                "integer literal '99999999999999999999' is out of range".into()
            )
        );
        assert_eq!(result.errors[0].span, Span::new(17, 37));
    }

    #[test]
    fn test_unexpected_token_is_reported_at_the_token() {
        let result = parse(
            "type A { fn f() { x = ; } }\ntype B { fn g() { return ) ; } }\ntype C { }",
        );
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].kind, ParseErrorKind::UnexpectedToken(";".into()));
        assert_eq!(result.errors[0].span, Span::new(22, 23));
        assert_eq!(result.errors[1].kind, ParseErrorKind::UnexpectedToken(")".into()));
        assert_eq!(result.errors[1].span, Span::new(53, 54));
        let names: Vec<_> = result.file.types.iter().map(|t| t.name.name.as_str()).collect();
        assert_eq!(names, vec!["C"]);
    }

    #[test]
    fn test_truncated_input_is_unexpected_eof() {
        let result = parse("type A { fn f() {");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\nb\t\"c\"\\"#), "a\nb\t\"c\"\\");
        assert_eq!(unescape(r"\q"), "\\q");
    }

    #[test]
    fn test_index_to_byte_span_past_end() {
        let tokens = make_tokens("type A");
        assert_eq!(index_to_byte_span(&tokens, 2, 2), Span::new(6, 6));
    }
}
