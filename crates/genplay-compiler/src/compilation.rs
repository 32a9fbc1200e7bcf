//! Compilations: a set of source units bound against a reference set.

use crate::binder::{self, DiagnosticBag, ParsedUnit};
use crate::error::EmitError;
use crate::ir::{ModuleImage, OutputKind, TypeDef, MODULE_FORMAT_VERSION};
use crate::lower;
use crate::model::SemanticModel;
use crate::reference::ReferenceSet;
use genplay_core::{CancellationToken, Cancelled, Diagnostic, SourceUnit};
use std::sync::Arc;
use tracing::debug;

/// How a compilation is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Library or executable.
    pub kind: OutputKind,
    /// Permit `extern` methods.
    pub allow_extern: bool,
}

impl CompileOptions {
    /// A library without native bindings (plugins, the program's first pass).
    pub const fn library() -> Self {
        Self {
            kind: OutputKind::Library,
            allow_extern: false,
        }
    }

    /// An executable expected to contain `Program.Main`.
    pub const fn executable() -> Self {
        Self {
            kind: OutputKind::Executable,
            allow_extern: false,
        }
    }

    /// A reference library that may declare `extern` methods.
    pub const fn reference_library() -> Self {
        Self {
            kind: OutputKind::Library,
            allow_extern: true,
        }
    }
}

/// A bound compilation.
///
/// Creation never fails on bad source: problems are recorded as
/// diagnostics and the semantic model is still built from whatever bound.
#[derive(Debug, Clone)]
pub struct Compilation {
    name: String,
    options: CompileOptions,
    references: Arc<ReferenceSet>,
    units: Vec<SourceUnit>,
    diagnostics: Vec<Diagnostic>,
    types: Vec<TypeDef>,
    model: Arc<SemanticModel>,
}

impl Compilation {
    /// Parse, bind and lower `units` against `references`.
    ///
    /// Only cancellation aborts creation.
    pub fn create(
        name: impl Into<String>,
        units: Vec<SourceUnit>,
        references: Arc<ReferenceSet>,
        options: CompileOptions,
        cancel: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let name = name.into();
        let _span = tracing::debug_span!("compile", name = %name, units = units.len()).entered();

        let mut bag = DiagnosticBag::new(&units);
        let mut parsed = Vec::with_capacity(units.len());
        for unit in &units {
            cancel.check()?;
            let result = genplay_syntax::parse(&unit.text);
            for error in &result.errors {
                bag.parse_error(&unit.name, error);
            }
            parsed.push(ParsedUnit {
                unit: unit.clone(),
                file: result.file,
            });
        }

        let (table, accepted) = binder::build_symbols(&references, &parsed, &mut bag);
        binder::check_declarations(&table, &parsed, &accepted, options, &mut bag);
        let lowered = lower::lower_types(&table, &parsed, &accepted, &mut bag, cancel)?;
        if options.kind == OutputKind::Executable {
            binder::check_entry_point(&table, &mut bag);
        }

        let diagnostics = bag.into_vec();
        debug!(
            types = lowered.types.len(),
            errors = diagnostics.iter().filter(|d| d.is_error()).count(),
            diagnostics = diagnostics.len(),
            "bound compilation"
        );

        let model = SemanticModel::new(table, lowered.invocations, units.clone());
        Ok(Self {
            name,
            options,
            references,
            units,
            diagnostics,
            types: lowered.types,
            model: Arc::new(model),
        })
    }

    /// A new compilation with `extra` units appended.
    pub fn with_units(
        &self,
        extra: Vec<SourceUnit>,
        options: CompileOptions,
        cancel: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let mut units = self.units.clone();
        units.extend(extra);
        Self::create(
            self.name.clone(),
            units,
            Arc::clone(&self.references),
            options,
            cancel,
        )
    }

    /// Compilation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options used to build this compilation.
    pub const fn options(&self) -> CompileOptions {
        self.options
    }

    /// The reference set this compilation is bound against.
    pub fn references(&self) -> &Arc<ReferenceSet> {
        &self.references
    }

    /// Source units in compilation order.
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// All diagnostics, in the order they were produced.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Read-only model of the bound program.
    pub fn semantic_model(&self) -> &Arc<SemanticModel> {
        &self.model
    }

    /// The module image this compilation describes.
    pub fn image(&self) -> ModuleImage {
        ModuleImage {
            format_version: MODULE_FORMAT_VERSION,
            name: self.name.clone(),
            kind: self.options.kind,
            references: self.references.identities(),
            types: self.types.clone(),
        }
    }

    /// Emit the module image into an in-memory buffer.
    pub fn emit(&self) -> Result<Vec<u8>, EmitError> {
        let errors = self.errors().count();
        if errors > 0 {
            return Err(EmitError::HasErrors(errors));
        }
        let bytes = self.image().encode()?;
        if bytes.is_empty() {
            return Err(EmitError::Empty);
        }
        debug!(name = %self.name, bytes = bytes.len(), "emitted module");
        Ok(bytes)
    }
}
