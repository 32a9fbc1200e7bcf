//! Syntax tree for Gen source files.

use crate::span::Span;
use std::fmt;

/// A parsed source file: a sequence of type declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    /// Declared types in source order.
    pub types: Vec<TypeDecl>,
}

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    /// The identifier text.
    pub name: String,
    /// Where it appears.
    pub span: Span,
}

impl Ident {
    /// Create a new identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Whether a declaration is a class-like type or a capability (interface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// `type`
    Type,
    /// `capability`
    Capability,
}

/// A `type` or `capability` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Type or capability.
    pub kind: TypeKind,
    /// Declared name.
    pub name: Ident,
    /// `abstract` modifier.
    pub is_abstract: bool,
    /// `static` modifier.
    pub is_static: bool,
    /// Generic parameter names; non-empty means the type is open generic.
    pub generics: Vec<Ident>,
    /// Base types and capabilities in declaration order.
    pub bases: Vec<Ident>,
    /// Fields and methods.
    pub members: Vec<Member>,
    /// Span of the whole declaration.
    pub span: Span,
}

impl TypeDecl {
    /// Iterate over method declarations.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            Member::Field(_) => None,
        })
    }

    /// Iterate over field declarations.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            Member::Method(_) => None,
        })
    }
}

/// A member of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// `let` field.
    Field(FieldDecl),
    /// `fn` method.
    Method(MethodDecl),
}

impl Member {
    /// The member's name.
    #[must_use]
    pub fn name(&self) -> &Ident {
        match self {
            Self::Field(f) => &f.name,
            Self::Method(m) => &m.name,
        }
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name.
    pub name: Ident,
    /// `static` modifier.
    pub is_static: bool,
    /// Initializer expression.
    pub init: Option<Expr>,
    /// Span of the declaration.
    pub span: Span,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// Method name.
    pub name: Ident,
    /// `static` modifier.
    pub is_static: bool,
    /// `async` modifier.
    pub is_async: bool,
    /// `extern` modifier.
    pub is_extern: bool,
    /// Parameters.
    pub params: Vec<Param>,
    /// Return annotation (`-> Name`).
    pub return_type: Option<Ident>,
    /// Body, absent for signatures and extern methods.
    pub body: Option<Block>,
    /// Span of the declaration.
    pub span: Span,
}

impl MethodDecl {
    /// Number of parameters without a default value.
    #[must_use]
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: Ident,
    /// Optional type annotation.
    pub ty: Option<Ident>,
    /// Optional default value.
    pub default: Option<Literal>,
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Statements in order.
    pub stmts: Vec<Stmt>,
    /// Span including the braces.
    pub span: Span,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What kind of statement.
    pub kind: StmtKind,
    /// Where it appears.
    pub span: Span,
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let name = init;`
    Let {
        /// Declared name.
        name: Ident,
        /// Initial value.
        init: Option<Expr>,
    },
    /// `target = value;`
    Assign {
        /// Assigned place.
        target: Expr,
        /// New value.
        value: Expr,
    },
    /// `expr;`
    Expr(Expr),
    /// `if cond { } else { }`
    If {
        /// Condition.
        cond: Expr,
        /// Taken when the condition is truthy.
        then_block: Block,
        /// `else` branch.
        else_branch: Option<ElseBranch>,
    },
    /// `while cond { }`
    While {
        /// Condition.
        cond: Expr,
        /// Loop body.
        body: Block,
    },
    /// `for name in iterable { }`
    For {
        /// Loop variable.
        var: Ident,
        /// Iterated list.
        iterable: Expr,
        /// Loop body.
        body: Block,
    },
    /// `return value;`
    Return(Option<Expr>),
    /// `throw value;`
    Throw(Expr),
    /// `try { } catch (name) { }`
    Try {
        /// Protected block.
        body: Block,
        /// Variable bound to the exception.
        binding: Option<Ident>,
        /// Handler block.
        handler: Block,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// A nested block.
    Block(Block),
}

/// The `else` part of an `if`.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    /// `else { }`
    Block(Block),
    /// `else if ...`
    If(Box<Stmt>),
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// What kind of expression.
    pub kind: ExprKind,
    /// Where it appears.
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal value.
    Literal(Literal),
    /// A bare name: local, parameter, member of the enclosing type, or type.
    Name(String),
    /// `self`
    SelfRef,
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `new T(args)`
    New {
        /// Instantiated type.
        ty: Ident,
        /// Constructor arguments.
        args: Vec<Expr>,
    },
    /// `target.name`
    Member {
        /// Receiver.
        target: Box<Expr>,
        /// Member name.
        name: Ident,
    },
    /// `callee(args)`; a `Member` callee is a method call.
    Call {
        /// Called expression.
        callee: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `target[index]`
    Index {
        /// Indexed value.
        target: Box<Expr>,
        /// Index value.
        index: Box<Expr>,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Infix operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `await expr`
    Await(Box<Expr>),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal (escapes resolved).
    Str(String),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq => 3,
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Rem => 6,
        }
    }

    /// Source symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}
