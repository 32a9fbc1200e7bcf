//! Symbols and the read-only semantic model handed to generators.

use crate::ir::{Const, TypeDef, TypeDefKind};
use genplay_core::{LibraryIdentity, SourceUnit};
use std::collections::{HashMap, HashSet};

/// Type names that are always known to annotations.
pub const BUILTIN_TYPE_NAMES: &[&str] = &["void", "Object", "String", "Int", "Float", "Bool", "List"];

/// A declared type, from source or from a referenced library.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSymbol {
    /// Simple name.
    pub name: String,
    /// Declaring library; `None` for types in this compilation.
    pub library: Option<LibraryIdentity>,
    /// Class or capability.
    pub kind: TypeDefKind,
    /// `abstract` modifier.
    pub is_abstract: bool,
    /// `static` modifier.
    pub is_static: bool,
    /// Generic parameter names.
    pub generics: Vec<String>,
    /// Base names as written, in declaration order.
    pub bases: Vec<String>,
    /// Fields.
    pub fields: Vec<FieldSymbol>,
    /// Methods.
    pub methods: Vec<MethodSymbol>,
    /// Declaring file, when declared in source.
    pub file: Option<String>,
}

impl TypeSymbol {
    /// True for capabilities.
    pub fn is_capability(&self) -> bool {
        self.kind == TypeDefKind::Capability
    }

    /// Find a method declared directly on this type.
    pub fn method(&self, name: &str) -> Option<&MethodSymbol> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Find a field declared directly on this type.
    pub fn field(&self, name: &str) -> Option<&FieldSymbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn from_def(def: &TypeDef, library: &LibraryIdentity) -> Self {
        let mut bases = Vec::new();
        bases.extend(def.base.iter().map(|b| b.name.clone()));
        bases.extend(def.capabilities.iter().map(|c| c.name.clone()));
        Self {
            name: def.name.clone(),
            library: Some(library.clone()),
            kind: def.kind,
            is_abstract: def.is_abstract,
            is_static: def.is_static,
            generics: def.generics.clone(),
            bases,
            fields: def
                .fields
                .iter()
                .map(|f| FieldSymbol {
                    name: f.name.clone(),
                    is_static: f.is_static,
                })
                .collect(),
            methods: def
                .methods
                .iter()
                .map(|m| MethodSymbol {
                    name: m.name.clone(),
                    is_static: m.is_static,
                    is_async: m.is_async,
                    is_extern: m.is_extern,
                    has_body: m.body.is_some(),
                    params: m
                        .params
                        .iter()
                        .map(|p| ParamSymbol {
                            name: p.name.clone(),
                            ty: p.ty.clone(),
                            has_default: p.default.is_some(),
                        })
                        .collect(),
                    return_type: m.return_type.clone(),
                })
                .collect(),
            file: None,
        }
    }
}

/// A field symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSymbol {
    /// Field name.
    pub name: String,
    /// Static field.
    pub is_static: bool,
}

/// A method symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbol {
    /// Method name.
    pub name: String,
    /// Static method.
    pub is_static: bool,
    /// `async` modifier.
    pub is_async: bool,
    /// `extern` modifier.
    pub is_extern: bool,
    /// Has a body.
    pub has_body: bool,
    /// Parameters.
    pub params: Vec<ParamSymbol>,
    /// Return annotation as written.
    pub return_type: Option<String>,
}

impl MethodSymbol {
    /// Parameters without defaults.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| !p.has_default).count()
    }

    /// Whether `count` arguments can be bound.
    pub fn accepts(&self, count: usize) -> bool {
        (self.required_params()..=self.params.len()).contains(&count)
    }
}

/// A parameter symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSymbol {
    /// Parameter name.
    pub name: String,
    /// Type annotation as written.
    pub ty: Option<String>,
    /// Has a default value.
    pub has_default: bool,
}

/// A member found by lookup.
#[derive(Debug, Clone, Copy)]
pub enum MemberRef<'a> {
    /// A field.
    Field(&'a FieldSymbol),
    /// A method.
    Method(&'a MethodSymbol),
}

impl MemberRef<'_> {
    /// Whether the member is static.
    pub fn is_static(&self) -> bool {
        match self {
            Self::Field(f) => f.is_static,
            Self::Method(m) => m.is_static,
        }
    }
}

/// All types visible to a compilation, keyed by simple name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    types: Vec<TypeSymbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    /// Add a type unless the name is taken; returns the existing symbol on
    /// conflict.
    pub(crate) fn insert(&mut self, symbol: TypeSymbol) -> Result<(), &TypeSymbol> {
        if let Some(&existing) = self.index.get(&symbol.name) {
            return Err(&self.types[existing]);
        }
        self.index.insert(symbol.name.clone(), self.types.len());
        self.types.push(symbol);
        Ok(())
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&TypeSymbol> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    /// All types, libraries first.
    pub fn iter(&self) -> impl Iterator<Item = &TypeSymbol> {
        self.types.iter()
    }

    /// Types declared in this compilation.
    pub fn local_types(&self) -> impl Iterator<Item = &TypeSymbol> {
        self.types.iter().filter(|t| t.library.is_none())
    }

    /// The non-capability base type of `name`, if declared and known.
    pub fn base_of(&self, name: &str) -> Option<&TypeSymbol> {
        let symbol = self.get(name)?;
        symbol
            .bases
            .iter()
            .filter_map(|b| self.get(b))
            .find(|b| !b.is_capability())
    }

    /// `name` followed by its base types, stopping at cycles.
    pub fn ancestors<'a>(&'a self, name: &str) -> Vec<&'a TypeSymbol> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.get(name);
        while let Some(symbol) = current {
            if !seen.insert(symbol.name.as_str()) {
                break;
            }
            chain.push(symbol);
            current = self.base_of(&symbol.name);
        }
        chain
    }

    /// Find a member on `name` or its bases, with the declaring type.
    pub fn find_member<'a>(
        &'a self,
        name: &str,
        member: &str,
    ) -> Option<(&'a TypeSymbol, MemberRef<'a>)> {
        self.ancestors(name).into_iter().find_map(|owner| {
            if let Some(field) = owner.field(member) {
                return Some((owner, MemberRef::Field(field)));
            }
            owner
                .method(member)
                .map(|method| (owner, MemberRef::Method(method)))
        })
    }

    /// Find a method on `name` or its bases, with the declaring type.
    pub fn find_method<'a>(
        &'a self,
        name: &str,
        method: &str,
    ) -> Option<(&'a TypeSymbol, &'a MethodSymbol)> {
        self.ancestors(name)
            .into_iter()
            .find_map(|owner| owner.method(method).map(|m| (owner, m)))
    }

    /// The instance constructor (`init`) of `name`, searching bases.
    pub fn constructor(&self, name: &str) -> Option<&MethodSymbol> {
        self.find_method(name, "init")
            .map(|(_, m)| m)
            .filter(|m| !m.is_static)
    }

    /// Every capability `name` implements, directly or through bases.
    pub fn capabilities_of(&self, name: &str) -> Vec<&TypeSymbol> {
        let mut found: Vec<&TypeSymbol> = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = vec![name];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(symbol) = self.get(current) else {
                continue;
            };
            if symbol.is_capability() && symbol.name != name {
                found.push(symbol);
            }
            stack.extend(symbol.bases.iter().map(String::as_str));
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Whether `name` implements `capability`.
    pub fn implements(&self, name: &str, capability: &str) -> bool {
        self.capabilities_of(name)
            .iter()
            .any(|c| c.name == capability)
    }

    /// Whether `name` is a known type or builtin annotation.
    pub fn is_known_annotation(&self, name: &str) -> bool {
        BUILTIN_TYPE_NAMES.contains(&name) || self.index.contains_key(name)
    }
}

/// A method call observed in the program.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationInfo {
    /// Receiver type when known from the source: the named type of a
    /// static-looking call (even when unresolved), or the enclosing type
    /// for calls on `self`.
    pub type_name: Option<String>,
    /// Called method.
    pub method: String,
    /// Arguments that are literals; `None` for anything else.
    pub arguments: Vec<Option<Const>>,
    /// `Type.Method` containing the call.
    pub caller: String,
    /// File of the call.
    pub file: String,
    /// 1-based line of the call.
    pub line: u32,
}

/// Read-only view of a compilation for generators.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    symbols: SymbolTable,
    invocations: Vec<InvocationInfo>,
    source_files: Vec<SourceUnit>,
}

impl SemanticModel {
    pub(crate) fn new(
        symbols: SymbolTable,
        invocations: Vec<InvocationInfo>,
        source_files: Vec<SourceUnit>,
    ) -> Self {
        Self {
            symbols,
            invocations,
            source_files,
        }
    }

    /// Types declared in the program, in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeSymbol> {
        self.symbols.local_types()
    }

    /// Look up a program or library type.
    pub fn get_type(&self, name: &str) -> Option<&TypeSymbol> {
        self.symbols.get(name)
    }

    /// Concrete program types implementing `capability`.
    pub fn implementations(&self, capability: &str) -> Vec<&TypeSymbol> {
        self.symbols
            .local_types()
            .filter(|t| !t.is_capability() && !t.is_abstract && !t.is_static)
            .filter(|t| self.symbols.implements(&t.name, capability))
            .collect()
    }

    /// Method calls in the program, in source order.
    pub fn invocations(&self) -> &[InvocationInfo] {
        &self.invocations
    }

    /// The program's source files.
    pub fn source_files(&self) -> &[SourceUnit] {
        &self.source_files
    }

    /// The full symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}
