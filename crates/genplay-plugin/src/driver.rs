//! Applies generators to a program compilation.
//!
//! Every generator sees the original program, never another generator's
//! output. Their contributions are merged in discovery order and the
//! generated units are sorted by logical name.

use crate::compiler::PluginSet;
use crate::host::GeneratorOutput;
use crate::instance::TransformationPluginInstance;
use genplay_compiler::{Compilation, CompileOptions, SemanticModel};
use genplay_core::{CancellationToken, Cancelled, Diagnostic, SourceUnit};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Report text when no generator added a unit.
pub const NO_SOURCE: &str = "< No source generated >";

const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;
const SEPARATOR_WIDTH: usize = 50;

fn pool() -> Option<&'static ThreadPool> {
    static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("genplay-generator-{i}"))
            .stack_size(WORKER_STACK_SIZE)
            .build()
            .map_err(|err| warn!(error = %err, "could not build generator pool, running sequentially"))
            .ok()
    })
    .as_ref()
}

/// Result of running every generator.
#[derive(Debug)]
pub struct Transformation {
    /// Generated units, sorted by logical name.
    pub generated: Vec<SourceUnit>,
    /// Diagnostics reported by generators, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// Program plus generated units as an executable compilation. `None`
    /// when a generator reported an error.
    pub augmented: Option<Compilation>,
}

impl Transformation {
    /// Error diagnostics reported by generators.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error()).cloned().collect()
    }

    /// True if any generator reported an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The generated-source report.
    pub fn report(&self) -> String {
        generated_report(&self.generated)
    }
}

/// Pretty-print generated units for display.
///
/// Units are formatted when they parse and shown raw otherwise. With more
/// than one unit each is headed by its name and a dashed rule.
pub fn generated_report(units: &[SourceUnit]) -> String {
    if units.is_empty() {
        return NO_SOURCE.to_string();
    }
    let headed = units.len() > 1;
    units
        .iter()
        .map(|unit| {
            let body = genplay_syntax::format_source(&unit.text).unwrap_or_else(|| unit.text.to_string());
            let body = body.trim_end();
            if headed {
                format!("{}\n{}\n{body}", unit.name, "-".repeat(SEPARATOR_WIDTH))
            } else {
                body.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Runs a [`PluginSet`] against a program.
#[derive(Debug, Clone, Copy)]
pub struct TransformationDriver {
    parallel: bool,
}

impl Default for TransformationDriver {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl TransformationDriver {
    /// Driver running generators in parallel when `parallel` is set.
    pub const fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Run every generator against `program`, then compile the program
    /// with the generated units as an executable when no generator
    /// reported an error.
    pub fn run(
        &self,
        program: &Compilation,
        plugins: &PluginSet,
        cancel: &CancellationToken,
    ) -> Result<Transformation, Cancelled> {
        let model = program.semantic_model();
        let outputs = self.execute_all(plugins.as_slice(), model, cancel)?;

        let mut generated = Vec::new();
        let mut diagnostics = Vec::new();
        for output in outputs {
            generated.extend(output.sources);
            diagnostics.extend(output.diagnostics);
        }
        generated.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            generators = plugins.len(),
            generated = generated.len(),
            diagnostics = diagnostics.len(),
            "ran generators"
        );

        let augmented = if diagnostics.iter().any(Diagnostic::is_error) {
            None
        } else {
            Some(program.with_units(generated.clone(), CompileOptions::executable(), cancel)?)
        };
        Ok(Transformation {
            generated,
            diagnostics,
            augmented,
        })
    }

    fn execute_all(
        &self,
        plugins: &[TransformationPluginInstance],
        model: &Arc<SemanticModel>,
        cancel: &CancellationToken,
    ) -> Result<Vec<GeneratorOutput>, Cancelled> {
        match pool() {
            Some(pool) if self.parallel && plugins.len() > 1 => pool.install(|| {
                plugins
                    .par_iter()
                    .map(|plugin| plugin.execute(model, cancel))
                    .collect()
            }),
            _ => plugins.iter().map(|plugin| plugin.execute(model, cancel)).collect(),
        }
    }
}
