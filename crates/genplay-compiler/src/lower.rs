//! Lowering of method bodies and field initializers to the module IR.
//!
//! Name resolution happens here. A bare name is looked up as a local, then
//! as a member of the enclosing type hierarchy, then as a type. Static
//! accesses are bound to their declaring type; instance member access stays
//! dynamic.

use crate::binder::{DeclId, DiagnosticBag, ParsedUnit};
use crate::ir::{
    Const, Expr, FieldDef, MethodDef, ParamDef, Place, ReturnShape, Stmt, StmtKind, TypeDef,
    TypeRef,
};
use crate::model::{InvocationInfo, MemberRef, SymbolTable, TypeSymbol};
use genplay_core::{CancellationToken, Cancelled, DiagnosticCode};
use genplay_syntax::ast::{self, ElseBranch, ExprKind, Ident, MethodDecl, TypeDecl};
use genplay_syntax::Span;

/// Output of lowering every accepted declaration.
pub(crate) struct Lowered {
    pub types: Vec<TypeDef>,
    pub invocations: Vec<InvocationInfo>,
}

fn type_ref(symbol: &TypeSymbol) -> TypeRef {
    TypeRef {
        library: symbol.library.clone(),
        name: symbol.name.clone(),
    }
}

fn return_shape(method: &MethodDecl) -> ReturnShape {
    if method.is_async {
        return ReturnShape::Awaitable;
    }
    match method.return_type.as_ref().map(|t| t.name.as_str()) {
        None | Some("void") => ReturnShape::Void,
        Some("Task") => ReturnShape::Awaitable,
        Some(_) => ReturnShape::Value,
    }
}

const fn is_jump(kind: &ast::StmtKind) -> bool {
    matches!(
        kind,
        ast::StmtKind::Return(_)
            | ast::StmtKind::Throw(_)
            | ast::StmtKind::Break
            | ast::StmtKind::Continue
    )
}

pub(crate) fn lower_types(
    table: &SymbolTable,
    parsed: &[ParsedUnit],
    accepted: &[DeclId],
    bag: &mut DiagnosticBag,
    cancel: &CancellationToken,
) -> Result<Lowered, Cancelled> {
    let mut lowered = Lowered {
        types: Vec::with_capacity(accepted.len()),
        invocations: Vec::new(),
    };
    for &(u, t) in accepted {
        cancel.check()?;
        let file = parsed[u].unit.name.as_str();
        let decl = &parsed[u].file.types[t];
        let Some(owner) = table.get(&decl.name.name) else {
            continue;
        };
        let def = lower_type(table, owner, decl, file, bag, &mut lowered.invocations);
        lowered.types.push(def);
    }
    Ok(lowered)
}

fn lower_type(
    table: &SymbolTable,
    owner: &TypeSymbol,
    decl: &TypeDecl,
    file: &str,
    bag: &mut DiagnosticBag,
    invocations: &mut Vec<InvocationInfo>,
) -> TypeDef {
    let mut base = None;
    let mut capabilities = Vec::new();
    for name in &decl.bases {
        let Some(symbol) = table.get(&name.name) else {
            continue;
        };
        if symbol.is_capability() {
            capabilities.push(type_ref(symbol));
        } else if base.is_none() {
            base = Some(type_ref(symbol));
        }
    }

    let fields = decl
        .fields()
        .map(|field| {
            let caller = format!("{}.{}", decl.name, field.name);
            let mut lowerer =
                FnLowerer::new(table, owner, file, caller, field.is_static, bag, invocations);
            lowerer.push_scope();
            let init = field.init.as_ref().map(|e| lowerer.lower_expr(e));
            lowerer.pop_scope();
            FieldDef {
                name: field.name.name.clone(),
                is_static: field.is_static,
                init,
                line: bag.line(file, field.span.start),
            }
        })
        .collect();

    let methods = decl
        .methods()
        .map(|method| {
            let caller = format!("{}.{}", decl.name, method.name);
            FnLowerer::new(table, owner, file, caller, method.is_static, bag, invocations)
                .lower_method(method)
        })
        .collect();

    TypeDef {
        name: decl.name.name.clone(),
        kind: owner.kind,
        is_abstract: decl.is_abstract,
        is_static: decl.is_static,
        generics: owner.generics.clone(),
        base,
        capabilities,
        fields,
        methods,
        file: file.to_string(),
    }
}

struct LocalInfo {
    name: String,
    span: Span,
    used: bool,
    warn_unused: bool,
}

enum Resolved {
    Local(u32),
    StaticField(TypeRef, String),
    InstanceField(String),
    Type(TypeRef),
}

enum Receiver<'a> {
    Type(&'a TypeSymbol),
    Value(Expr),
    Unresolved,
}

/// Lowers one method body or field initializer.
struct FnLowerer<'a> {
    table: &'a SymbolTable,
    owner: &'a TypeSymbol,
    file: &'a str,
    caller: String,
    is_static: bool,
    bag: &'a mut DiagnosticBag,
    invocations: &'a mut Vec<InvocationInfo>,
    scopes: Vec<Vec<u32>>,
    locals: Vec<LocalInfo>,
    loop_depth: u32,
}

impl<'a> FnLowerer<'a> {
    fn new(
        table: &'a SymbolTable,
        owner: &'a TypeSymbol,
        file: &'a str,
        caller: String,
        is_static: bool,
        bag: &'a mut DiagnosticBag,
        invocations: &'a mut Vec<InvocationInfo>,
    ) -> Self {
        Self {
            table,
            owner,
            file,
            caller,
            is_static,
            bag,
            invocations,
            scopes: Vec::new(),
            locals: Vec::new(),
            loop_depth: 0,
        }
    }

    fn report(&mut self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        self.bag.report(code, self.file, span, message);
    }

    fn line(&self, span: Span) -> u32 {
        self.bag.line(self.file, span.start)
    }

    // === Scopes ===

    fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn pop_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        for slot in scope {
            let local = &self.locals[slot as usize];
            if local.warn_unused && !local.used {
                let span = local.span;
                let message = format!("The variable '{}' is declared but never used", local.name);
                self.report(DiagnosticCode::UnusedLocal, span, message);
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .copied()
            .find(|&slot| self.locals[slot as usize].name == name)
    }

    fn declare(&mut self, ident: &Ident, warn_unused: bool) -> u32 {
        if self.lookup(&ident.name).is_some() {
            self.report(
                DiagnosticCode::DuplicateLocal,
                ident.span,
                format!(
                    "A local variable named '{}' is already defined in this scope",
                    ident.name
                ),
            );
        }
        let slot = self.locals.len() as u32;
        self.locals.push(LocalInfo {
            name: ident.name.clone(),
            span: ident.span,
            used: false,
            warn_unused,
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(slot);
        }
        slot
    }

    // === Methods and statements ===

    fn lower_method(mut self, method: &MethodDecl) -> MethodDef {
        self.push_scope();
        let mut params = Vec::with_capacity(method.params.len());
        for param in &method.params {
            self.declare(&param.name, false);
            params.push(ParamDef {
                name: param.name.name.clone(),
                ty: param.ty.as_ref().map(|t| t.name.clone()),
                default: param.default.as_ref().map(Const::from),
            });
        }
        let body = method.body.as_ref().map(|block| self.lower_block(block));
        self.pop_scope();

        MethodDef {
            name: method.name.name.clone(),
            is_static: method.is_static,
            is_async: method.is_async,
            is_extern: method.is_extern,
            params,
            return_type: method.return_type.as_ref().map(|t| t.name.clone()),
            shape: return_shape(method),
            locals: self.locals.len() as u32,
            body,
            line: self.line(method.name.span),
        }
    }

    fn lower_block(&mut self, block: &ast::Block) -> Vec<Stmt> {
        self.push_scope();
        let mut out = Vec::with_capacity(block.stmts.len());
        let mut terminated = false;
        let mut warned = false;
        for stmt in &block.stmts {
            if terminated && !warned {
                self.report(
                    DiagnosticCode::UnreachableCode,
                    stmt.span,
                    "Unreachable code detected",
                );
                warned = true;
            }
            out.push(self.lower_stmt(stmt));
            terminated |= is_jump(&stmt.kind);
        }
        self.pop_scope();
        out
    }

    fn lower_loop_body(&mut self, block: &ast::Block) -> Vec<Stmt> {
        self.loop_depth += 1;
        let body = self.lower_block(block);
        self.loop_depth -= 1;
        body
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) -> Stmt {
        let line = self.line(stmt.span);
        let kind = match &stmt.kind {
            ast::StmtKind::Let { name, init } => {
                let init = init.as_ref().map(|e| self.lower_expr(e));
                let slot = self.declare(name, true);
                StmtKind::Local { slot, init }
            }
            ast::StmtKind::Assign { target, value } => {
                let place = self.lower_place(target);
                let value = self.lower_expr(value);
                match place {
                    Some(place) => StmtKind::Assign { place, value },
                    None => StmtKind::Expr(value),
                }
            }
            ast::StmtKind::Expr(expr) => StmtKind::Expr(self.lower_expr(expr)),
            ast::StmtKind::If {
                cond,
                then_block,
                else_branch,
            } => {
                let cond = self.lower_expr(cond);
                let then_body = self.lower_block(then_block);
                let else_body = match else_branch {
                    None => Vec::new(),
                    Some(ElseBranch::Block(block)) => self.lower_block(block),
                    Some(ElseBranch::If(nested)) => vec![self.lower_stmt(nested)],
                };
                StmtKind::If {
                    cond,
                    then_body,
                    else_body,
                }
            }
            ast::StmtKind::While { cond, body } => {
                let cond = self.lower_expr(cond);
                let body = self.lower_loop_body(body);
                StmtKind::While { cond, body }
            }
            ast::StmtKind::For {
                var,
                iterable,
                body,
            } => {
                let iterable = self.lower_expr(iterable);
                self.push_scope();
                let slot = self.declare(var, false);
                let body = self.lower_loop_body(body);
                self.pop_scope();
                StmtKind::ForEach {
                    slot,
                    iterable,
                    body,
                }
            }
            ast::StmtKind::Return(value) => {
                StmtKind::Return(value.as_ref().map(|e| self.lower_expr(e)))
            }
            ast::StmtKind::Throw(value) => StmtKind::Throw(self.lower_expr(value)),
            ast::StmtKind::Try {
                body,
                binding,
                handler,
            } => {
                let body = self.lower_block(body);
                self.push_scope();
                let slot = binding.as_ref().map(|b| self.declare(b, false));
                let handler = self.lower_block(handler);
                self.pop_scope();
                StmtKind::Try {
                    body,
                    slot,
                    handler,
                }
            }
            ast::StmtKind::Break | ast::StmtKind::Continue => {
                let is_break = matches!(stmt.kind, ast::StmtKind::Break);
                if self.loop_depth == 0 {
                    let keyword = if is_break { "break" } else { "continue" };
                    self.report(
                        DiagnosticCode::JumpOutsideLoop,
                        stmt.span,
                        format!("No enclosing loop out of which to {keyword}"),
                    );
                }
                if is_break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            ast::StmtKind::Block(block) => StmtKind::Block(self.lower_block(block)),
        };
        Stmt { line, kind }
    }

    // === Names ===

    fn instance_in_static(&mut self, declaring: &TypeSymbol, member: &str, span: Span) {
        self.report(
            DiagnosticCode::InstanceMemberInStaticContext,
            span,
            format!(
                "An object reference is required for the non-static member '{}.{member}'",
                declaring.name
            ),
        );
    }

    fn unknown_name(&mut self, name: &str, span: Span) {
        self.report(
            DiagnosticCode::UnknownName,
            span,
            format!("The name '{name}' does not exist in the current context"),
        );
    }

    fn resolve_name(&mut self, name: &str, span: Span) -> Option<Resolved> {
        if let Some(slot) = self.lookup(name) {
            return Some(Resolved::Local(slot));
        }
        let table = self.table;
        if let Some((declaring, member)) = table.find_member(&self.owner.name, name) {
            return match member {
                MemberRef::Field(field) if field.is_static => Some(Resolved::StaticField(
                    type_ref(declaring),
                    field.name.clone(),
                )),
                MemberRef::Field(field) if self.is_static => {
                    self.instance_in_static(declaring, &field.name, span);
                    None
                }
                MemberRef::Field(field) => Some(Resolved::InstanceField(field.name.clone())),
                MemberRef::Method(method) => {
                    self.report(
                        DiagnosticCode::UnknownName,
                        span,
                        format!(
                            "Method '{}.{}' cannot be used as a value",
                            declaring.name, method.name
                        ),
                    );
                    None
                }
            };
        }
        if let Some(symbol) = table.get(name) {
            return Some(Resolved::Type(type_ref(symbol)));
        }
        self.unknown_name(name, span);
        None
    }

    /// A name that is neither a local nor a member of the enclosing type.
    fn is_free_name(&self, name: &str) -> bool {
        self.lookup(name).is_none() && self.table.find_member(&self.owner.name, name).is_none()
    }

    fn lower_receiver(&mut self, expr: &ast::Expr) -> Receiver<'a> {
        if let ExprKind::Name(name) = &expr.kind {
            if self.is_free_name(name) {
                let table = self.table;
                return match table.get(name) {
                    Some(symbol) => Receiver::Type(symbol),
                    None => {
                        self.unknown_name(name, expr.span);
                        Receiver::Unresolved
                    }
                };
            }
        }
        Receiver::Value(self.lower_expr(expr))
    }

    fn lower_place(&mut self, target: &ast::Expr) -> Option<Place> {
        match &target.kind {
            ExprKind::Name(name) => match self.resolve_name(name, target.span)? {
                Resolved::Local(slot) => Some(Place::Local(slot)),
                Resolved::StaticField(owner, name) => Some(Place::StaticField { owner, name }),
                Resolved::InstanceField(name) => Some(Place::Field {
                    target: Expr::SelfRef,
                    name,
                }),
                Resolved::Type(_) => {
                    self.invalid_target(target.span);
                    None
                }
            },
            ExprKind::Member { target: inner, name } => match self.lower_receiver(inner) {
                Receiver::Type(symbol) => {
                    let table = self.table;
                    match table.find_member(&symbol.name, &name.name) {
                        Some((declaring, MemberRef::Field(field))) if field.is_static => {
                            Some(Place::StaticField {
                                owner: type_ref(declaring),
                                name: field.name.clone(),
                            })
                        }
                        Some((declaring, MemberRef::Field(field))) => {
                            self.instance_in_static(declaring, &field.name, name.span);
                            None
                        }
                        Some((_, MemberRef::Method(_))) => {
                            self.invalid_target(target.span);
                            None
                        }
                        None => {
                            self.unknown_static_member(symbol, name);
                            None
                        }
                    }
                }
                Receiver::Value(inner) => Some(Place::Field {
                    target: inner,
                    name: name.name.clone(),
                }),
                Receiver::Unresolved => None,
            },
            ExprKind::Index { target, index } => Some(Place::Index {
                target: self.lower_expr(target),
                index: self.lower_expr(index),
            }),
            _ => {
                self.invalid_target(target.span);
                None
            }
        }
    }

    fn invalid_target(&mut self, span: Span) {
        self.report(
            DiagnosticCode::InvalidAssignmentTarget,
            span,
            "The left-hand side of an assignment must be a variable, field or indexer",
        );
    }

    fn unknown_static_member(&mut self, symbol: &TypeSymbol, name: &Ident) {
        self.report(
            DiagnosticCode::UnknownMember,
            name.span,
            format!(
                "'{}' does not contain a static member named '{name}'",
                symbol.name
            ),
        );
    }

    // === Expressions ===

    fn lower_exprs(&mut self, exprs: &[ast::Expr]) -> Vec<Expr> {
        exprs.iter().map(|e| self.lower_expr(e)).collect()
    }

    fn lower_expr(&mut self, expr: &ast::Expr) -> Expr {
        match &expr.kind {
            ExprKind::Literal(literal) => Expr::Const(literal.into()),
            ExprKind::Name(name) => match self.resolve_name(name, expr.span) {
                Some(Resolved::Local(slot)) => {
                    self.locals[slot as usize].used = true;
                    Expr::Local(slot)
                }
                Some(Resolved::StaticField(owner, name)) => Expr::StaticField { owner, name },
                Some(Resolved::InstanceField(name)) => Expr::Field {
                    target: Box::new(Expr::SelfRef),
                    name,
                },
                Some(Resolved::Type(ty)) => Expr::Type(ty),
                None => Expr::Const(Const::Null),
            },
            ExprKind::SelfRef => {
                if self.is_static {
                    self.report(
                        DiagnosticCode::SelfInStaticContext,
                        expr.span,
                        "Keyword 'self' is not valid in a static context",
                    );
                }
                Expr::SelfRef
            }
            ExprKind::List(items) => Expr::List(self.lower_exprs(items)),
            ExprKind::New { ty, args } => self.lower_new(ty, args),
            ExprKind::Member { target, name } => match self.lower_receiver(target) {
                Receiver::Type(symbol) => self.lower_static_read(symbol, name),
                Receiver::Value(target) => Expr::Field {
                    target: Box::new(target),
                    name: name.name.clone(),
                },
                Receiver::Unresolved => Expr::Const(Const::Null),
            },
            ExprKind::Call { callee, args } => self.lower_call(callee, args, expr.span),
            ExprKind::Index { target, index } => Expr::Index {
                target: Box::new(self.lower_expr(target)),
                index: Box::new(self.lower_expr(index)),
            },
            ExprKind::Unary { op, operand } => Expr::Unary {
                op: (*op).into(),
                operand: Box::new(self.lower_expr(operand)),
            },
            ExprKind::Binary { op, lhs, rhs } => Expr::Binary {
                op: (*op).into(),
                lhs: Box::new(self.lower_expr(lhs)),
                rhs: Box::new(self.lower_expr(rhs)),
            },
            ExprKind::Await(inner) => Expr::Await(Box::new(self.lower_expr(inner))),
        }
    }

    fn lower_new(&mut self, ty: &Ident, args: &[ast::Expr]) -> Expr {
        let args = self.lower_exprs(args);
        let table = self.table;
        let Some(symbol) = table.get(&ty.name) else {
            self.unknown_name(&ty.name, ty.span);
            return Expr::Const(Const::Null);
        };
        if symbol.is_capability() || symbol.is_abstract || symbol.is_static {
            self.report(
                DiagnosticCode::CannotInstantiate,
                ty.span,
                format!("Cannot create an instance of the abstract, static or capability type '{ty}'"),
            );
            return Expr::Const(Const::Null);
        }
        let arity_ok = match table.constructor(&symbol.name) {
            Some(ctor) => ctor.accepts(args.len()),
            None => args.is_empty(),
        };
        if !arity_ok {
            self.report(
                DiagnosticCode::ArgumentCount,
                ty.span,
                format!("'{ty}' does not contain a constructor that takes {} arguments", args.len()),
            );
        }
        Expr::New {
            ty: type_ref(symbol),
            args,
        }
    }

    fn lower_static_read(&mut self, symbol: &TypeSymbol, name: &Ident) -> Expr {
        let table = self.table;
        match table.find_member(&symbol.name, &name.name) {
            Some((declaring, MemberRef::Field(field))) if field.is_static => Expr::StaticField {
                owner: type_ref(declaring),
                name: field.name.clone(),
            },
            Some((declaring, member)) if !member.is_static() => {
                self.instance_in_static(declaring, &name.name, name.span);
                Expr::Const(Const::Null)
            }
            Some((declaring, _)) => {
                self.report(
                    DiagnosticCode::UnknownName,
                    name.span,
                    format!(
                        "Method '{}.{name}' cannot be used as a value",
                        declaring.name
                    ),
                );
                Expr::Const(Const::Null)
            }
            None => {
                self.unknown_static_member(symbol, name);
                Expr::Const(Const::Null)
            }
        }
    }

    fn record_invocation(
        &mut self,
        type_name: Option<String>,
        method: &str,
        args: &[ast::Expr],
        span: Span,
    ) {
        let arguments = args
            .iter()
            .map(|arg| match &arg.kind {
                ExprKind::Literal(literal) => Some(Const::from(literal)),
                _ => None,
            })
            .collect();
        let line = self.line(span);
        self.invocations.push(InvocationInfo {
            type_name,
            method: method.to_string(),
            arguments,
            caller: self.caller.clone(),
            file: self.file.to_string(),
            line,
        });
    }

    fn check_arity(&mut self, method: &crate::model::MethodSymbol, count: usize, span: Span) {
        if !method.accepts(count) {
            self.report(
                DiagnosticCode::ArgumentCount,
                span,
                format!("No overload for method '{}' takes {count} arguments", method.name),
            );
        }
    }

    fn lower_call(&mut self, callee: &ast::Expr, args: &[ast::Expr], span: Span) -> Expr {
        match &callee.kind {
            ExprKind::Member { target, name } => {
                let type_name = match &target.kind {
                    ExprKind::Name(n) if self.is_free_name(n) => Some(n.clone()),
                    ExprKind::SelfRef => Some(self.owner.name.clone()),
                    _ => None,
                };
                self.record_invocation(type_name, &name.name, args, span);
                let receiver = self.lower_receiver(target);
                let lowered = self.lower_exprs(args);
                match receiver {
                    Receiver::Type(symbol) => self.lower_static_call(symbol, name, lowered),
                    Receiver::Value(target) => Expr::Call {
                        target: Box::new(target),
                        method: name.name.clone(),
                        args: lowered,
                    },
                    Receiver::Unresolved => Expr::Const(Const::Null),
                }
            }
            ExprKind::Name(name) => {
                self.record_invocation(Some(self.owner.name.clone()), name, args, span);
                let lowered = self.lower_exprs(args);
                if self.lookup(name).is_some() {
                    self.report(
                        DiagnosticCode::UnknownName,
                        callee.span,
                        format!("'{name}' is a variable but is used like a method"),
                    );
                    return Expr::Const(Const::Null);
                }
                let table = self.table;
                let Some((declaring, method)) = table.find_method(&self.owner.name, name) else {
                    self.unknown_name(name, callee.span);
                    return Expr::Const(Const::Null);
                };
                self.check_arity(method, lowered.len(), callee.span);
                if method.is_static {
                    Expr::StaticCall {
                        owner: type_ref(declaring),
                        method: name.clone(),
                        args: lowered,
                    }
                } else if self.is_static {
                    self.instance_in_static(declaring, name, callee.span);
                    Expr::Const(Const::Null)
                } else {
                    Expr::Call {
                        target: Box::new(Expr::SelfRef),
                        method: name.clone(),
                        args: lowered,
                    }
                }
            }
            _ => {
                self.lower_expr(callee);
                self.lower_exprs(args);
                self.report(
                    DiagnosticCode::UnknownName,
                    callee.span,
                    "Only methods can be invoked",
                );
                Expr::Const(Const::Null)
            }
        }
    }

    fn lower_static_call(&mut self, symbol: &TypeSymbol, name: &Ident, args: Vec<Expr>) -> Expr {
        let table = self.table;
        match table.find_method(&symbol.name, &name.name) {
            Some((declaring, method)) if method.is_static => {
                self.check_arity(method, args.len(), name.span);
                Expr::StaticCall {
                    owner: type_ref(declaring),
                    method: method.name.clone(),
                    args,
                }
            }
            Some((declaring, method)) => {
                self.instance_in_static(declaring, &method.name, name.span);
                Expr::Const(Const::Null)
            }
            None => {
                self.unknown_static_member(symbol, name);
                Expr::Const(Const::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Compilation, CompileOptions, ReferenceSet};
    use genplay_core::{CancellationToken, SourceUnit};
    use std::sync::Arc;

    fn compile(source: &str) -> Compilation {
        Compilation::create(
            "Test",
            vec![SourceUnit::new("Test.gen", source)],
            Arc::new(ReferenceSet::empty()),
            CompileOptions::library(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    fn codes(compilation: &Compilation) -> Vec<&str> {
        compilation
            .diagnostics()
            .iter()
            .map(|d| d.code.as_str())
            .collect()
    }

    #[test]
    fn test_unknown_name() {
        let c = compile("type T { static fn M() { return x; } }");
        assert_eq!(codes(&c), vec!["E0201"]);
        assert_eq!(
            c.diagnostics()[0].to_string(),
            "Test.gen(1,33): error E0201: The name 'x' does not exist in the current context"
        );
    }

    #[test]
    fn test_self_and_instance_members_in_static_context() {
        let c = compile("type T { let v; fn I() {} static fn M() { self.v = 1; I(); return v; } }");
        assert_eq!(codes(&c), vec!["E0205", "E0208", "E0208"]);
    }

    #[test]
    fn test_static_member_access() {
        let c = compile(
            "static type S { static let V = 1; static fn Get(a, b = 2) { return a + b; } }
             type T { static fn M() { S.V = S.Get(1); S.Get(); S.Missing(); } }",
        );
        assert_eq!(codes(&c), vec!["E0203", "E0202"]);
    }

    #[test]
    fn test_instantiation_rules() {
        let c = compile(
            "abstract type A {} capability C {} type P { fn init(x) {} }
             type T { static fn M() { new A(); new C(); new P(); new P(1); new Q(); } }",
        );
        assert_eq!(codes(&c), vec!["E0204", "E0204", "E0203", "E0201"]);
    }

    #[test]
    fn test_locals() {
        let c = compile(
            "type T { static fn M(p) { let a = 1; let a = 2; let unused; for i in p { } return a; } }",
        );
        assert_eq!(codes(&c), vec!["E0209", "W0301", "W0301"]);
    }

    #[test]
    fn test_jumps_and_unreachable() {
        let c = compile(
            "type T { static fn M() { break; while true { continue; return; } return; 1; } }",
        );
        assert_eq!(codes(&c), vec!["E0207", "W0302", "W0302"]);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let c = compile("type T { static fn M() { T = 1; 1 = 2; } }");
        assert_eq!(codes(&c), vec!["E0206", "E0206"]);
    }

    #[test]
    fn test_invocations_keep_unresolved_receivers() {
        let c = compile(
            "type T { fn Helper(x) {} fn M(list) { Locator.Get(\"IFoo\", list); Helper(3); list.Add(1); } }",
        );
        let invocations = c.semantic_model().invocations();
        assert_eq!(invocations.len(), 3);
        assert_eq!(invocations[0].type_name.as_deref(), Some("Locator"));
        assert_eq!(invocations[0].method, "Get");
        assert_eq!(
            invocations[0].arguments,
            vec![Some(crate::ir::Const::Str("IFoo".into())), None]
        );
        assert_eq!(invocations[0].caller, "T.M");
        assert_eq!(invocations[1].type_name.as_deref(), Some("T"));
        assert_eq!(invocations[2].type_name, None);
        assert!(c.has_errors());
    }
}
