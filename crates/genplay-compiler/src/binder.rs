//! Declaration binding: symbol table construction and type-level checks.

use crate::ir::TypeDefKind;
use crate::model::{FieldSymbol, MethodSymbol, ParamSymbol, SymbolTable, TypeSymbol};
use crate::reference::ReferenceSet;
use crate::CompileOptions;
use genplay_core::{Diagnostic, DiagnosticCode, LibraryIdentity, LineIndex, SourceUnit};
use genplay_syntax::ast::{Member, MethodDecl, SourceFile, TypeDecl, TypeKind};
use genplay_syntax::{ParseError, Span};
use std::collections::{HashMap, HashSet};

/// A parsed source unit.
pub(crate) struct ParsedUnit {
    pub unit: SourceUnit,
    pub file: SourceFile,
}

/// Index of an accepted declaration: (unit, type) positions in the parsed
/// units. Declarations rejected as duplicates are not lowered.
pub(crate) type DeclId = (usize, usize);

/// Collects located diagnostics.
pub(crate) struct DiagnosticBag {
    lines: HashMap<String, LineIndex>,
    items: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new(units: &[SourceUnit]) -> Self {
        let lines = units
            .iter()
            .map(|u| (u.name.clone(), LineIndex::new(&u.text)))
            .collect();
        Self {
            lines,
            items: Vec::new(),
        }
    }

    pub fn report(
        &mut self,
        code: DiagnosticCode,
        file: &str,
        span: Span,
        message: impl Into<String>,
    ) {
        let mut diagnostic = Diagnostic::from_code(code, message);
        if let Some(lines) = self.lines.get(file) {
            diagnostic = diagnostic.at(lines.location(file, span.start));
        }
        self.items.push(diagnostic);
    }

    pub fn report_unlocated(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.items.push(Diagnostic::from_code(code, message));
    }

    pub fn parse_error(&mut self, file: &str, error: &ParseError) {
        if let Some(lines) = self.lines.get(file) {
            self.items.push(error.to_diagnostic(file, lines));
        }
    }

    /// 1-based line of a byte offset.
    pub fn line(&self, file: &str, offset: usize) -> u32 {
        self.lines
            .get(file)
            .map_or(0, |lines| lines.line_col(offset).0)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

fn method_symbol(method: &MethodDecl) -> MethodSymbol {
    MethodSymbol {
        name: method.name.name.clone(),
        is_static: method.is_static,
        is_async: method.is_async,
        is_extern: method.is_extern,
        has_body: method.body.is_some(),
        params: method
            .params
            .iter()
            .map(|p| ParamSymbol {
                name: p.name.name.clone(),
                ty: p.ty.as_ref().map(|t| t.name.clone()),
                has_default: p.default.is_some(),
            })
            .collect(),
        return_type: method.return_type.as_ref().map(|t| t.name.clone()),
    }
}

fn type_symbol(decl: &TypeDecl, file: &str) -> TypeSymbol {
    TypeSymbol {
        name: decl.name.name.clone(),
        library: None,
        kind: match decl.kind {
            TypeKind::Type => TypeDefKind::Class,
            TypeKind::Capability => TypeDefKind::Capability,
        },
        is_abstract: decl.is_abstract,
        is_static: decl.is_static,
        generics: decl.generics.iter().map(|g| g.name.clone()).collect(),
        bases: decl.bases.iter().map(|b| b.name.clone()).collect(),
        fields: decl
            .fields()
            .map(|f| FieldSymbol {
                name: f.name.name.clone(),
                is_static: f.is_static,
            })
            .collect(),
        methods: decl.methods().map(method_symbol).collect(),
        file: Some(file.to_string()),
    }
}

/// Build the symbol table from referenced libraries and source declarations.
pub(crate) fn build_symbols(
    references: &ReferenceSet,
    parsed: &[ParsedUnit],
    bag: &mut DiagnosticBag,
) -> (SymbolTable, Vec<DeclId>) {
    let mut table = SymbolTable::default();

    for library in references.libraries() {
        let identity = LibraryIdentity::new(library.name.clone());
        for def in &library.types {
            // Libraries are compiled against each other, so names are unique.
            let _ = table.insert(TypeSymbol::from_def(def, &identity));
        }
    }

    let mut accepted = Vec::new();
    for (u, parsed_unit) in parsed.iter().enumerate() {
        for (t, decl) in parsed_unit.file.types.iter().enumerate() {
            let symbol = type_symbol(decl, &parsed_unit.unit.name);
            match table.insert(symbol) {
                Ok(()) => accepted.push((u, t)),
                Err(existing) => {
                    let message = match &existing.library {
                        Some(library) => format!(
                            "The type '{}' conflicts with a type of the same name in library '{library}'",
                            decl.name
                        ),
                        None => format!("The type '{}' is already declared", decl.name),
                    };
                    bag.report(
                        DiagnosticCode::DuplicateType,
                        &parsed_unit.unit.name,
                        decl.name.span,
                        message,
                    );
                }
            }
        }
    }

    (table, accepted)
}

fn has_cycle(table: &SymbolTable, start: &str) -> bool {
    let mut seen = HashSet::new();
    let mut stack: Vec<&str> = table
        .get(start)
        .map(|t| t.bases.iter().map(String::as_str).collect())
        .unwrap_or_default();
    while let Some(name) = stack.pop() {
        if name == start {
            return true;
        }
        if seen.insert(name) {
            if let Some(symbol) = table.get(name) {
                stack.extend(symbol.bases.iter().map(String::as_str));
            }
        }
    }
    false
}

fn signature(capability: &TypeSymbol, method: &MethodSymbol) -> String {
    let params: Vec<_> = method.params.iter().map(|p| p.name.as_str()).collect();
    format!("{}.{}({})", capability.name, method.name, params.join(", "))
}

/// Type-level checks over accepted declarations.
pub(crate) fn check_declarations(
    table: &SymbolTable,
    parsed: &[ParsedUnit],
    accepted: &[DeclId],
    options: CompileOptions,
    bag: &mut DiagnosticBag,
) {
    for &(u, t) in accepted {
        let file = parsed[u].unit.name.as_str();
        let decl = &parsed[u].file.types[t];
        let name = decl.name.name.as_str();

        let mut members = HashSet::new();
        for member in &decl.members {
            let member_name = member.name();
            if !members.insert(member_name.name.as_str()) {
                bag.report(
                    DiagnosticCode::DuplicateMember,
                    file,
                    member_name.span,
                    format!("The type '{name}' already contains a definition for '{member_name}'"),
                );
            }
        }

        check_bases(table, decl, file, bag);

        if has_cycle(table, name) {
            bag.report(
                DiagnosticCode::InheritanceCycle,
                file,
                decl.name.span,
                format!("Circular base type dependency involving '{name}'"),
            );
        }

        let generics: HashSet<&str> = decl.generics.iter().map(|g| g.name.as_str()).collect();
        for member in &decl.members {
            if let Member::Method(method) = member {
                check_method(table, decl, method, &generics, file, options, bag);
            }
        }

        if decl.kind == TypeKind::Type && !decl.is_abstract {
            check_capabilities_implemented(table, decl, file, bag);
        }
    }
}

fn check_bases(table: &SymbolTable, decl: &TypeDecl, file: &str, bag: &mut DiagnosticBag) {
    let name = &decl.name.name;
    let mut base_type: Option<&str> = None;
    for base in &decl.bases {
        let Some(symbol) = table.get(&base.name) else {
            bag.report(
                DiagnosticCode::UnknownBaseType,
                file,
                base.span,
                format!("The type or capability '{base}' could not be found"),
            );
            continue;
        };
        if symbol.is_capability() {
            continue;
        }
        match decl.kind {
            TypeKind::Capability => bag.report(
                DiagnosticCode::InvalidBaseList,
                file,
                base.span,
                format!("Capability '{name}' cannot inherit from type '{base}'"),
            ),
            TypeKind::Type => match base_type {
                Some(first) => bag.report(
                    DiagnosticCode::InvalidBaseList,
                    file,
                    base.span,
                    format!("Type '{name}' cannot have multiple base types '{first}' and '{base}'"),
                ),
                None => base_type = Some(base.name.as_str()),
            },
        }
    }
}

fn check_method(
    table: &SymbolTable,
    decl: &TypeDecl,
    method: &MethodDecl,
    generics: &HashSet<&str>,
    file: &str,
    options: CompileOptions,
    bag: &mut DiagnosticBag,
) {
    let qualified = format!("{}.{}", decl.name, method.name);
    let span = method.name.span;

    if method.is_extern && !options.allow_extern {
        bag.report(
            DiagnosticCode::ExternNotAllowed,
            file,
            span,
            format!("'{qualified}' cannot be extern: 'extern' is only allowed in reference libraries"),
        );
    }

    let message = match (decl.kind, method.body.is_some(), method.is_extern) {
        (TypeKind::Capability, true, _) => {
            Some(format!("Capability member '{qualified}' cannot declare a body"))
        }
        (TypeKind::Type, true, true) => Some(format!(
            "'{qualified}' cannot declare a body because it is marked extern"
        )),
        (TypeKind::Type, false, false) => Some(format!(
            "'{qualified}' must declare a body because it is not marked extern"
        )),
        _ => None,
    };
    if let Some(message) = message {
        bag.report(DiagnosticCode::InvalidMethodBody, file, span, message);
    }

    let annotations = method
        .params
        .iter()
        .filter_map(|p| p.ty.as_ref())
        .chain(method.return_type.as_ref());
    for annotation in annotations {
        let known = generics.contains(annotation.name.as_str())
            || table.is_known_annotation(&annotation.name);
        if !known {
            bag.report(
                DiagnosticCode::UnknownTypeAnnotation,
                file,
                annotation.span,
                format!("The type name '{annotation}' could not be found"),
            );
        }
    }
}

fn check_capabilities_implemented(
    table: &SymbolTable,
    decl: &TypeDecl,
    file: &str,
    bag: &mut DiagnosticBag,
) {
    let name = decl.name.name.as_str();
    for capability in table.capabilities_of(name) {
        for required in capability.methods.iter().filter(|m| !m.is_static) {
            let implemented = table
                .find_method(name, &required.name)
                .is_some_and(|(_, m)| {
                    !m.is_static
                        && (m.has_body || m.is_extern)
                        && m.params.len() == required.params.len()
                });
            if !implemented {
                bag.report(
                    DiagnosticCode::MissingCapabilityMember,
                    file,
                    decl.name.span,
                    format!(
                        "'{name}' does not implement capability member '{}'",
                        signature(capability, required)
                    ),
                );
            }
        }
    }
}

/// Warn when an executable compilation has no `Program.Main`.
pub(crate) fn check_entry_point(table: &SymbolTable, bag: &mut DiagnosticBag) {
    let has_main = table
        .local_types()
        .filter(|t| t.name == "Program")
        .any(|t| t.method("Main").is_some_and(|m| m.is_static));
    if !has_main {
        bag.report_unlocated(
            DiagnosticCode::MissingEntryPoint,
            "Program does not contain a static 'Main' method suitable for an entry point",
        );
    }
}
