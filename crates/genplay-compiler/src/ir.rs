//! Module images: the emitted, serializable form of a compilation.
//!
//! A module image is self-describing. It lists the libraries it was compiled
//! against and, for every declared type, the fields and methods with their
//! lowered bodies. Names in bodies are already resolved: locals are slots,
//! static accesses carry the owning type, and only instance member access is
//! left to dynamic dispatch.

use genplay_core::LibraryIdentity;
use genplay_syntax::ast;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version tag written into every image.
pub const MODULE_FORMAT_VERSION: u32 = 1;

/// Whether a module has an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// No entry point required.
    Library,
    /// Expected to contain `Program.Main`.
    Executable,
}

/// Errors decoding a module image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a valid image.
    #[error("invalid module image: {0}")]
    Format(#[from] rmp_serde::decode::Error),
    /// The image was written by an incompatible version.
    #[error("unsupported module format version {0}")]
    Version(u32),
}

/// A compiled module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleImage {
    /// Format version, see [`MODULE_FORMAT_VERSION`].
    pub format_version: u32,
    /// Module name (`Generator`, `Program`, or a library name).
    pub name: String,
    /// Output kind.
    pub kind: OutputKind,
    /// Libraries the module was compiled against, in resolution order.
    pub references: Vec<LibraryIdentity>,
    /// Declared types in declaration order.
    pub types: Vec<TypeDef>,
}

impl ModuleImage {
    /// Serialize to `MessagePack`.
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    /// Deserialize from `MessagePack`, checking the format version.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let image: Self = rmp_serde::from_slice(bytes)?;
        if image.format_version != MODULE_FORMAT_VERSION {
            return Err(DecodeError::Version(image.format_version));
        }
        Ok(image)
    }

    /// Find a declared type by simple name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Names of all declared types.
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Class-like type or capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDefKind {
    /// `type`
    Class,
    /// `capability`
    Capability,
}

/// Reference to a type, qualified by the library declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Declaring library; `None` for the module being compiled.
    pub library: Option<LibraryIdentity>,
    /// Simple type name.
    pub name: String,
}

impl TypeRef {
    /// A type declared in the current module.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            library: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Simple name.
    pub name: String,
    /// Class or capability.
    pub kind: TypeDefKind,
    /// `abstract` modifier.
    pub is_abstract: bool,
    /// `static` modifier.
    pub is_static: bool,
    /// Generic parameter names.
    pub generics: Vec<String>,
    /// Non-capability base type.
    pub base: Option<TypeRef>,
    /// Directly listed capabilities.
    pub capabilities: Vec<TypeRef>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Methods in declaration order.
    pub methods: Vec<MethodDef>,
    /// Logical file name the type was declared in.
    pub file: String,
}

impl TypeDef {
    /// Find a method declared directly on this type.
    pub fn find_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Find a field declared directly on this type.
    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True for concrete, closed, instantiable class types.
    pub fn is_activatable(&self) -> bool {
        self.kind == TypeDefKind::Class
            && !self.is_abstract
            && !self.is_static
            && self.generics.is_empty()
    }
}

/// A field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Belongs to the type rather than instances.
    pub is_static: bool,
    /// Initializer.
    pub init: Option<Expr>,
    /// 1-based declaration line.
    pub line: u32,
}

/// How a method's result is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnShape {
    /// No annotation or `-> void`.
    Void,
    /// `async fn` or `-> Task`.
    Awaitable,
    /// Any other annotation.
    Value,
}

/// A method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Method name.
    pub name: String,
    /// Static method.
    pub is_static: bool,
    /// `async` modifier.
    pub is_async: bool,
    /// Natively bound.
    pub is_extern: bool,
    /// Parameters.
    pub params: Vec<ParamDef>,
    /// Return annotation as written.
    pub return_type: Option<String>,
    /// Return shape.
    pub shape: ReturnShape,
    /// Number of local slots, parameters first.
    pub locals: u32,
    /// Lowered body; `None` for signatures and extern methods.
    pub body: Option<Vec<Stmt>>,
    /// 1-based declaration line.
    pub line: u32,
}

impl MethodDef {
    /// Parameters without defaults.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    /// Whether `count` arguments can be bound to the parameters.
    pub fn accepts(&self, count: usize) -> bool {
        (self.required_params()..=self.params.len()).contains(&count)
    }
}

/// A parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Parameter name.
    pub name: String,
    /// Type annotation as written.
    pub ty: Option<String>,
    /// Default value.
    pub default: Option<Const>,
}

/// Compile-time constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Const {
    /// `null`
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    Str(String),
}

impl From<&ast::Literal> for Const {
    fn from(lit: &ast::Literal) -> Self {
        match lit {
            ast::Literal::Null => Self::Null,
            ast::Literal::Bool(b) => Self::Bool(*b),
            ast::Literal::Int(n) => Self::Int(*n),
            ast::Literal::Float(f) => Self::Float(*f),
            ast::Literal::Str(s) => Self::Str(s.clone()),
        }
    }
}

/// A lowered statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// 1-based source line, used in stack traces.
    pub line: u32,
    /// The statement.
    pub kind: StmtKind,
}

/// Lowered statement kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum StmtKind {
    Local {
        slot: u32,
        init: Option<Expr>,
    },
    Assign {
        place: Place,
        value: Expr,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    ForEach {
        slot: u32,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Try {
        body: Vec<Stmt>,
        slot: Option<u32>,
        handler: Vec<Stmt>,
    },
    Break,
    Continue,
    Block(Vec<Stmt>),
}

/// An assignable place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Place {
    Local(u32),
    Field { target: Expr, name: String },
    StaticField { owner: TypeRef, name: String },
    Index { target: Expr, index: Expr },
}

/// A lowered expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Expr {
    Const(Const),
    Local(u32),
    SelfRef,
    Type(TypeRef),
    List(Vec<Expr>),
    New {
        ty: TypeRef,
        args: Vec<Expr>,
    },
    /// Instance member read, dispatched on the receiver at run time.
    Field {
        target: Box<Expr>,
        name: String,
    },
    StaticField {
        owner: TypeRef,
        name: String,
    },
    /// Instance method call, dispatched on the receiver at run time.
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    StaticCall {
        owner: TypeRef,
        method: String,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Await(Box<Expr>),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl From<ast::UnaryOp> for UnaryOp {
    fn from(op: ast::UnaryOp) -> Self {
        match op {
            ast::UnaryOp::Not => Self::Not,
            ast::UnaryOp::Neg => Self::Neg,
        }
    }
}

/// Infix operators; `And`/`Or` short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl From<ast::BinaryOp> for BinaryOp {
    fn from(op: ast::BinaryOp) -> Self {
        match op {
            ast::BinaryOp::Or => Self::Or,
            ast::BinaryOp::And => Self::And,
            ast::BinaryOp::Eq => Self::Eq,
            ast::BinaryOp::NotEq => Self::NotEq,
            ast::BinaryOp::Lt => Self::Lt,
            ast::BinaryOp::LtEq => Self::LtEq,
            ast::BinaryOp::Gt => Self::Gt,
            ast::BinaryOp::GtEq => Self::GtEq,
            ast::BinaryOp::Add => Self::Add,
            ast::BinaryOp::Sub => Self::Sub,
            ast::BinaryOp::Mul => Self::Mul,
            ast::BinaryOp::Div => Self::Div,
            ast::BinaryOp::Rem => Self::Rem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> ModuleImage {
        ModuleImage {
            format_version: MODULE_FORMAT_VERSION,
            name: "Program".into(),
            kind: OutputKind::Executable,
            references: vec![LibraryIdentity::new("System")],
            types: vec![TypeDef {
                name: "Program".into(),
                kind: TypeDefKind::Class,
                is_abstract: false,
                is_static: false,
                generics: vec![],
                base: None,
                capabilities: vec![],
                fields: vec![],
                methods: vec![MethodDef {
                    name: "Main".into(),
                    is_static: true,
                    is_async: false,
                    is_extern: false,
                    params: vec![],
                    return_type: None,
                    shape: ReturnShape::Void,
                    locals: 0,
                    body: Some(vec![Stmt {
                        line: 3,
                        kind: StmtKind::Expr(Expr::StaticCall {
                            owner: TypeRef {
                                library: Some(LibraryIdentity::new("System")),
                                name: "Console".into(),
                            },
                            method: "WriteLine".into(),
                            args: vec![Expr::Const(Const::Str("hi".into()))],
                        }),
                    }]),
                    line: 2,
                }],
                file: "Program.gen".into(),
            }],
        }
    }

    #[test]
    fn test_image_codec() {
        let image = sample_image();
        let bytes = image.encode().unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(ModuleImage::decode(&bytes).unwrap(), image);
    }

    #[test]
    fn test_decode_rejects_other_versions() {
        let mut image = sample_image();
        image.format_version = 99;
        let bytes = image.encode().unwrap();
        assert!(matches!(
            ModuleImage::decode(&bytes),
            Err(DecodeError::Version(99))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            ModuleImage::decode(b"not an image"),
            Err(DecodeError::Format(_))
        ));
    }

    #[test]
    fn test_method_accepts() {
        let mut method = sample_image().types[0].methods[0].clone();
        method.params = vec![
            ParamDef {
                name: "a".into(),
                ty: None,
                default: None,
            },
            ParamDef {
                name: "b".into(),
                ty: None,
                default: Some(Const::Int(1)),
            },
        ];
        assert!(!method.accepts(0));
        assert!(method.accepts(1));
        assert!(method.accepts(2));
        assert!(!method.accepts(3));
    }
}
