//! Canonical pretty-printer for Gen syntax trees.
//!
//! Output uses four-space indentation, one statement per line and the minimum
//! parentheses needed to preserve the tree's operator structure. Comments are
//! not part of the tree and therefore do not survive formatting.

use crate::ast::{
    Block, ElseBranch, Expr, ExprKind, FieldDecl, Literal, Member, MethodDecl, Param, SourceFile,
    Stmt, StmtKind, TypeDecl, TypeKind, UnaryOp,
};
use crate::parse;

const INDENT: &str = "    ";

/// Binding strength of prefix operators; binary levels are 1 through 6.
const PREFIX_PRECEDENCE: u8 = 7;
/// Binding strength of postfix chains and atoms.
const ATOM_PRECEDENCE: u8 = 8;

/// Format a parsed source file.
#[must_use]
pub fn format_source_file(file: &SourceFile) -> String {
    let mut formatter = Formatter::default();
    for (i, decl) in file.types.iter().enumerate() {
        if i > 0 {
            formatter.out.push('\n');
        }
        formatter.type_decl(decl);
    }
    formatter.out
}

/// Parse and format source text.
///
/// Returns `None` when the text has syntax errors, in which case callers
/// usually show the raw text instead.
#[must_use]
pub fn format_source(source: &str) -> Option<String> {
    let result = parse(source);
    if result.errors.is_empty() {
        Some(format_source_file(&result.file))
    } else {
        None
    }
}

#[derive(Default)]
struct Formatter {
    out: String,
    depth: usize,
}

impl Formatter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn type_decl(&mut self, decl: &TypeDecl) {
        let mut header = String::new();
        if decl.is_abstract {
            header.push_str("abstract ");
        }
        if decl.is_static {
            header.push_str("static ");
        }
        header.push_str(match decl.kind {
            TypeKind::Type => "type ",
            TypeKind::Capability => "capability ",
        });
        header.push_str(&decl.name.name);
        if !decl.generics.is_empty() {
            let names: Vec<_> = decl.generics.iter().map(|g| g.name.as_str()).collect();
            header.push('<');
            header.push_str(&names.join(", "));
            header.push('>');
        }
        if !decl.bases.is_empty() {
            let names: Vec<_> = decl.bases.iter().map(|b| b.name.as_str()).collect();
            header.push_str(" : ");
            header.push_str(&names.join(", "));
        }

        if decl.members.is_empty() {
            header.push_str(" {}");
            self.line(&header);
            return;
        }

        header.push_str(" {");
        self.line(&header);
        self.depth += 1;
        let mut previous: Option<&Member> = None;
        for member in &decl.members {
            // Methods are set apart; runs of fields stay together.
            if let Some(prev) = previous {
                if matches!(prev, Member::Method(_)) || matches!(member, Member::Method(_)) {
                    self.out.push('\n');
                }
            }
            match member {
                Member::Field(field) => self.field(field),
                Member::Method(method) => self.method(method),
            }
            previous = Some(member);
        }
        self.depth -= 1;
        self.line("}");
    }

    fn field(&mut self, field: &FieldDecl) {
        let mut text = String::new();
        if field.is_static {
            text.push_str("static ");
        }
        text.push_str("let ");
        text.push_str(&field.name.name);
        if let Some(init) = &field.init {
            text.push_str(" = ");
            text.push_str(&expr(init, 0));
        }
        text.push(';');
        self.line(&text);
    }

    fn method(&mut self, method: &MethodDecl) {
        let mut header = String::new();
        if method.is_static {
            header.push_str("static ");
        }
        if method.is_async {
            header.push_str("async ");
        }
        if method.is_extern {
            header.push_str("extern ");
        }
        header.push_str("fn ");
        header.push_str(&method.name.name);
        header.push('(');
        let params: Vec<_> = method.params.iter().map(param).collect();
        header.push_str(&params.join(", "));
        header.push(')');
        if let Some(ret) = &method.return_type {
            header.push_str(" -> ");
            header.push_str(&ret.name);
        }
        match &method.body {
            Some(body) => self.block_after(header, body),
            None => {
                header.push(';');
                self.line(&header);
            }
        }
    }

    /// Emit `prefix {`, the block's statements and the closing `}`.
    fn block_after(&mut self, mut prefix: String, block: &Block) {
        if !prefix.is_empty() {
            prefix.push(' ');
        }
        if block.stmts.is_empty() {
            prefix.push_str("{}");
            self.line(&prefix);
            return;
        }
        prefix.push('{');
        self.line(&prefix);
        self.body(block);
        self.line("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { name, init } => match init {
                Some(init) => self.line(&format!("let {} = {};", name.name, expr(init, 0))),
                None => self.line(&format!("let {};", name.name)),
            },
            StmtKind::Assign { target, value } => {
                self.line(&format!("{} = {};", expr(target, 0), expr(value, 0)));
            }
            StmtKind::Expr(e) => self.line(&format!("{};", expr(e, 0))),
            StmtKind::If { .. } => self.if_chain(stmt, String::new()),
            StmtKind::While { cond, body } => {
                self.block_after(format!("while {}", expr(cond, 0)), body);
            }
            StmtKind::For {
                var,
                iterable,
                body,
            } => {
                let header = format!("for {} in {}", var.name, expr(iterable, 0));
                self.block_after(header, body);
            }
            StmtKind::Return(value) => match value {
                Some(value) => self.line(&format!("return {};", expr(value, 0))),
                None => self.line("return;"),
            },
            StmtKind::Throw(value) => self.line(&format!("throw {};", expr(value, 0))),
            StmtKind::Try {
                body,
                binding,
                handler,
            } => {
                self.open_block("try".to_string(), body);
                let catch = match binding {
                    Some(name) => format!("}} catch ({})", name.name),
                    None => "} catch".to_string(),
                };
                self.block_after_close(catch, handler);
            }
            StmtKind::Break => self.line("break;"),
            StmtKind::Continue => self.line("continue;"),
            StmtKind::Block(block) => self.block_after(String::new(), block),
        }
    }

    /// Emit an `if`/`else if`/`else` chain; `lead` is `""` or `"} else "`.
    fn if_chain(&mut self, stmt: &Stmt, lead: String) {
        let StmtKind::If {
            cond,
            then_block,
            else_branch,
        } = &stmt.kind
        else {
            return;
        };
        let header = format!("{lead}if {}", expr(cond, 0));
        match else_branch {
            None if lead.is_empty() => self.block_after(header, then_block),
            None => self.block_after_close(header, then_block),
            Some(branch) => {
                self.open_block(header, then_block);
                match branch {
                    ElseBranch::If(nested) => self.if_chain(nested, "} else ".to_string()),
                    ElseBranch::Block(block) => {
                        self.block_after_close("} else".to_string(), block);
                    }
                }
            }
        }
    }

    /// Emit `header {` and the statements, leaving the block open.
    fn open_block(&mut self, header: String, block: &Block) {
        self.line(&format!("{header} {{"));
        self.body(block);
    }

    /// Emit `header {`, the statements and the final `}`; `header` starts
    /// with the `}` closing the previous block.
    fn block_after_close(&mut self, header: String, block: &Block) {
        self.line(&format!("{header} {{"));
        self.body(block);
        self.line("}");
    }

    fn body(&mut self, block: &Block) {
        self.depth += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.depth -= 1;
    }
}

fn param(p: &Param) -> String {
    let mut text = p.name.name.clone();
    if let Some(ty) = &p.ty {
        text.push_str(": ");
        text.push_str(&ty.name);
    }
    if let Some(default) = &p.default {
        text.push_str(" = ");
        text.push_str(&literal(default));
    }
    text
}

fn precedence(e: &Expr) -> u8 {
    match &e.kind {
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary { .. } | ExprKind::Await(_) => PREFIX_PRECEDENCE,
        _ => ATOM_PRECEDENCE,
    }
}

/// Render `e`, parenthesized when it binds looser than `min`.
fn expr(e: &Expr, min: u8) -> String {
    let text = match &e.kind {
        ExprKind::Literal(lit) => literal(lit),
        ExprKind::Name(name) => name.clone(),
        ExprKind::SelfRef => "self".to_string(),
        ExprKind::List(items) => format!("[{}]", args(items)),
        ExprKind::New { ty, args: a } => format!("new {}({})", ty.name, args(a)),
        ExprKind::Member { target, name } => {
            format!("{}.{}", expr(target, ATOM_PRECEDENCE), name.name)
        }
        ExprKind::Call { callee, args: a } => {
            format!("{}({})", expr(callee, ATOM_PRECEDENCE), args(a))
        }
        ExprKind::Index { target, index } => {
            format!("{}[{}]", expr(target, ATOM_PRECEDENCE), expr(index, 0))
        }
        ExprKind::Unary { op, operand } => {
            let symbol = match op {
                UnaryOp::Not => "!",
                UnaryOp::Neg => "-",
            };
            format!("{symbol}{}", expr(operand, PREFIX_PRECEDENCE))
        }
        ExprKind::Await(operand) => format!("await {}", expr(operand, PREFIX_PRECEDENCE)),
        ExprKind::Binary { op, lhs, rhs } => {
            let p = op.precedence();
            format!("{} {} {}", expr(lhs, p), op.symbol(), expr(rhs, p + 1))
        }
    };
    if precedence(e) < min {
        format!("({text})")
    } else {
        text
    }
}

fn args(items: &[Expr]) -> String {
    items
        .iter()
        .map(|a| expr(a, 0))
        .collect::<Vec<_>>()
        .join(", ")
}

fn literal(lit: &Literal) -> String {
    match lit {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Int(n) => n.to_string(),
        Literal::Float(f) => {
            let text = format!("{f:?}");
            if text.contains('e') {
                format!("{f:.1}")
            } else {
                text
            }
        }
        Literal::Str(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for c in s.chars() {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '\r' => out.push_str("\\r"),
                    '\0' => out.push_str("\\0"),
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    _ => out.push(c),
                }
            }
            out.push('"');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(source: &str) -> String {
        format_source(source).expect("source should parse")
    }

    #[test]
    fn test_format_normalizes_layout() {
        let formatted = fmt("type   Program{static fn Main( ){Console.WriteLine(\"hi\") ;}}");
        assert_eq!(
            formatted,
            "type Program {\n    static fn Main() {\n        Console.WriteLine(\"hi\");\n    }\n}\n"
        );
    }

    #[test]
    fn test_format_minimal_parentheses() {
        let formatted = fmt("type A { fn f() { return (a + (b * c)) - (d - e); } }");
        assert!(formatted.contains("return a + b * c - (d - e);"));
        let formatted = fmt("type A { fn f() { return -(a + b).Length; } }");
        assert!(formatted.contains("return -(a + b).Length;"));
    }

    #[test]
    fn test_format_else_if_chain() {
        let formatted = fmt("type A { fn f(x) { if x { a(); } else if y { b(); } else { c(); } } }");
        let expected = "\
type A {
    fn f(x) {
        if x {
            a();
        } else if y {
            b();
        } else {
            c();
        }
    }
}
";
        assert_eq!(formatted, expected);
    }

    #[test]
    fn test_format_members_and_signatures() {
        let formatted = fmt(
            "static type S : Base, ICap { static let n = 1; let m; extern static fn Native(v: String = \"a\\n\"); }",
        );
        let expected = "\
static type S : Base, ICap {
    static let n = 1;
    let m;

    static extern fn Native(v: String = \"a\\n\");
}
";
        assert_eq!(formatted, expected);
    }

    #[test]
    fn test_format_try_catch() {
        let formatted = fmt("type A { fn f() { try { g(); } catch (e) { h(e); } } }");
        assert!(formatted.contains("        try {\n            g();\n        } catch (e) {\n            h(e);\n        }\n"));
    }

    #[test]
    fn test_format_is_idempotent() {
        let once = fmt("type A<T> { fn f() { let xs = [1, 2.5, true, null]; while !done { xs[0] = await g(); } } }");
        assert_eq!(fmt(&once), once);
    }

    #[test]
    fn test_format_source_rejects_invalid() {
        assert!(format_source("type {").is_none());
    }
}
