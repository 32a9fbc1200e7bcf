//! Activated generator types.

use crate::host::{GeneratorContextObject, GeneratorOutput};
use genplay_compiler::{ModuleImage, ReferenceSet, SemanticModel};
use genplay_core::{CancellationToken, Cancelled, Diagnostic, DiagnosticCode};
use genplay_runtime::{
    ClassId, ConsoleMode, Interpreter, LoadContext, NativeRegistry, RuntimeConfig, RuntimeError,
    Value,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Library declaring the generator capability.
pub const GENERATOR_LIBRARY: &str = "Generation";
/// Name of the generator capability.
pub const GENERATOR_CAPABILITY: &str = "Generator";
/// Method invoked on each generator.
pub const EXECUTE_METHOD: &str = "Execute";

/// One generator type of a compiled plugin module.
///
/// The instance holds only the module image, never interpreter state:
/// every [`execute`](Self::execute) loads the module into a fresh
/// generation and activates a new object, so it is `Send + Sync` and
/// can run on any worker.
#[derive(Debug, Clone)]
pub struct TransformationPluginInstance {
    image: Arc<ModuleImage>,
    references: Arc<ReferenceSet>,
    class_name: String,
    natives: Arc<NativeRegistry>,
    config: RuntimeConfig,
}

impl TransformationPluginInstance {
    pub(crate) fn new(
        image: Arc<ModuleImage>,
        references: Arc<ReferenceSet>,
        class_name: String,
        natives: Arc<NativeRegistry>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            image,
            references,
            class_name,
            natives,
            config,
        }
    }

    /// Generator type name.
    pub fn name(&self) -> &str {
        &self.class_name
    }

    /// Activate the type once without running it.
    pub(crate) fn activate(&self) -> Result<(), String> {
        let (context, class) = self.load()?;
        let mut interpreter = Interpreter::new(context, Arc::clone(&self.natives), self.config)
            .with_console(ConsoleMode::Log);
        interpreter
            .instantiate(class, Vec::new())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Load the module into a fresh generation and find the generator type.
    fn load(&self) -> Result<(Rc<LoadContext>, ClassId), String> {
        let context = LoadContext::load(Arc::clone(&self.image), &self.references)
            .map_err(|e| e.to_string())?;
        let class = context
            .find_class(&self.class_name)
            .ok_or_else(|| format!("type '{}' is missing from its module", self.class_name))?;
        Ok((context, class))
    }

    /// Run the generator against `model`.
    ///
    /// An exception escaping `Execute` is reported as a `GEN0001` error
    /// diagnostic in the returned output; only cancellation is an `Err`.
    pub fn execute(
        &self,
        model: &Arc<SemanticModel>,
        cancel: &CancellationToken,
    ) -> Result<GeneratorOutput, Cancelled> {
        cancel.check()?;
        let _span = tracing::debug_span!("generator", name = %self.class_name).entered();

        let (context, class) = match self.load() {
            Ok(loaded) => loaded,
            Err(err) => return Ok(self.failed(&err)),
        };
        let output = Rc::new(RefCell::new(GeneratorOutput::default()));
        let result = {
            let mut interpreter = Interpreter::new(context, Arc::clone(&self.natives), self.config)
                .with_console(ConsoleMode::Log)
                .with_cancellation(cancel.clone());
            let host = Value::host(GeneratorContextObject::new(
                self.class_name.as_str(),
                Arc::clone(model),
                Rc::clone(&output),
            ));
            interpreter
                .instantiate(class, Vec::new())
                .and_then(|generator| interpreter.invoke(&generator, EXECUTE_METHOD, vec![host]))
        };

        match result {
            Ok(_) => {
                let output = output.take();
                debug!(
                    sources = output.sources.len(),
                    diagnostics = output.diagnostics.len(),
                    "generator finished"
                );
                Ok(output)
            }
            Err(RuntimeError::Cancelled) => Err(Cancelled),
            Err(RuntimeError::Exception(exception)) => {
                warn!(exception = %exception.name, "generator threw");
                Ok(self.failed(&exception.description()))
            }
        }
    }

    fn failed(&self, description: &str) -> GeneratorOutput {
        GeneratorOutput {
            diagnostics: vec![Diagnostic::from_code(
                DiagnosticCode::GeneratorFailed,
                format!(
                    "Generator '{}' failed to generate source: {description}",
                    self.class_name
                ),
            )],
            ..GeneratorOutput::default()
        }
    }
}
