//! Plugin compilation and generator discovery.

use crate::cache::{CacheKey, PluginCache, DEFAULT_CAPACITY};
use crate::error::{Artifact, StageError};
use crate::instance::{TransformationPluginInstance, GENERATOR_CAPABILITY, GENERATOR_LIBRARY};
use genplay_compiler::{Compilation, CompileOptions, EmitError, ModuleImage, ReferenceSet};
use genplay_core::{CancellationToken, SourceUnit};
use genplay_runtime::{LoadContext, NativeRegistry, RuntimeConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Logical file name of the plugin source in diagnostics.
pub const GENERATOR_FILE_NAME: &str = "Generator.gen";

/// Generators discovered in one plugin module, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    instances: Vec<TransformationPluginInstance>,
}

impl PluginSet {
    /// The instances in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, TransformationPluginInstance> {
        self.instances.iter()
    }

    /// The instances as a slice.
    pub fn as_slice(&self) -> &[TransformationPluginInstance] {
        &self.instances
    }

    /// Number of generators.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True if the set holds no generator.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Generator type names.
    pub fn names(&self) -> Vec<&str> {
        self.instances.iter().map(TransformationPluginInstance::name).collect()
    }
}

impl<'a> IntoIterator for &'a PluginSet {
    type Item = &'a TransformationPluginInstance;
    type IntoIter = std::slice::Iter<'a, TransformationPluginInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Compiles plugin source into generator instances, caching by
/// normalized source.
#[derive(Debug)]
pub struct PluginCompiler {
    cache: PluginCache<PluginSet>,
    compile_count: AtomicUsize,
    file_name: String,
    natives: Arc<NativeRegistry>,
    config: RuntimeConfig,
}

impl Default for PluginCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PluginCompiler {
    /// Compiler whose cache holds `capacity` plugin sets.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: PluginCache::new(capacity),
            compile_count: AtomicUsize::new(0),
            file_name: GENERATOR_FILE_NAME.to_string(),
            natives: Arc::new(NativeRegistry::new()),
            config: RuntimeConfig::default(),
        }
    }

    /// Use a different logical file name for plugin diagnostics.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Interpreter limits for generator code.
    #[must_use]
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Native bindings for generator code.
    #[must_use]
    pub fn with_natives(mut self, natives: Arc<NativeRegistry>) -> Self {
        self.natives = natives;
        self
    }

    /// Number of cache misses that went on to compile.
    pub fn compile_count(&self) -> usize {
        self.compile_count.load(Ordering::Relaxed)
    }

    /// The plugin cache.
    pub const fn cache(&self) -> &PluginCache<PluginSet> {
        &self.cache
    }

    /// Compile `source` and activate every generator type it declares.
    pub fn compile(
        &self,
        source: &str,
        references: &Arc<ReferenceSet>,
        cancel: &CancellationToken,
    ) -> Result<Arc<PluginSet>, StageError> {
        if source.trim().is_empty() {
            return Err(StageError::InputMissing(Artifact::Generator));
        }

        let key = CacheKey::from_source(source);
        if let Some(set) = self.cache.get(&key) {
            info!(key = %key, generators = set.len(), "plugin cache hit");
            return Ok(set);
        }
        info!(key = %key, "plugin cache miss");
        self.compile_count.fetch_add(1, Ordering::Relaxed);

        let compilation = Compilation::create(
            "Generator",
            vec![SourceUnit::new(self.file_name.as_str(), source)],
            Arc::clone(references),
            CompileOptions::library(),
            cancel,
        )?;
        if compilation.has_errors() {
            return Err(StageError::Compile {
                stage: Artifact::Generator,
                diagnostics: compilation.errors().cloned().collect(),
            });
        }

        let bytes = compilation.emit().map_err(|err| StageError::Emit {
            stage: Artifact::Generator,
            cause: match err {
                EmitError::Empty => None,
                other => Some(other.to_string()),
            },
        })?;
        let image = ModuleImage::decode(&bytes).map_err(|err| StageError::Emit {
            stage: Artifact::Generator,
            cause: Some(err.to_string()),
        })?;
        cancel.check()?;

        let set = Arc::new(self.discover(Arc::new(image), references)?);
        debug!(generators = ?set.names(), "discovered generators");
        self.cache.insert(key, Arc::clone(&set));
        Ok(set)
    }

    fn discover(&self, image: Arc<ModuleImage>, references: &Arc<ReferenceSet>) -> Result<PluginSet, StageError> {
        let declared = || Vec::from_iter(image.type_names().into_iter().map(String::from));
        let context = LoadContext::load(Arc::clone(&image), references).map_err(|err| StageError::Emit {
            stage: Artifact::Generator,
            cause: Some(err.to_string()),
        })?;
        let Some(capability) = context.find_library_class(GENERATOR_LIBRARY, GENERATOR_CAPABILITY) else {
            warn!("reference set has no generator capability");
            return Err(StageError::Instantiation { types: declared() });
        };

        let mut instances = Vec::new();
        for class in context.classes() {
            let def = context.class(class);
            if !def.is_activatable() || !context.implements(class, capability) {
                continue;
            }
            let instance = TransformationPluginInstance::new(
                Arc::clone(&image),
                Arc::clone(references),
                def.name.clone(),
                Arc::clone(&self.natives),
                self.config,
            );
            match instance.activate() {
                Ok(()) => instances.push(instance),
                Err(err) => warn!(generator = %def.name, error = %err, "could not activate generator"),
            }
        }

        if instances.is_empty() {
            return Err(StageError::Instantiation { types: declared() });
        }
        Ok(PluginSet { instances })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genplay_compiler::ReferenceSetProvider;

    fn references() -> Arc<ReferenceSet> {
        ReferenceSetProvider::bundled()
            .get_or_resolve(&CancellationToken::new())
            .unwrap()
    }

    const GENERATOR: &str = r#"
type Hello : Generator {
    fn Execute(context) {
        context.AddSource("Hello", "type Greeting { static fn Text() { return \"hi\"; } }");
    }
}
"#;

    #[test]
    fn test_discovers_generator() {
        let compiler = PluginCompiler::default();
        let set = compiler
            .compile(GENERATOR, &references(), &CancellationToken::new())
            .unwrap();
        assert_eq!(set.names(), vec!["Hello"]);
        assert_eq!(compiler.compile_count(), 1);
    }

    #[test]
    fn test_reformatted_source_hits_cache() {
        let compiler = PluginCompiler::default();
        let references = references();
        let cancel = CancellationToken::new();
        let first = compiler.compile(GENERATOR, &references, &cancel).unwrap();
        let reformatted = format!("// same plugin\n{}", GENERATOR.replace("    ", "\t"));
        let second = compiler.compile(&reformatted, &references, &cancel).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.compile_count(), 1);
    }

    #[test]
    fn test_blank_source_needs_input() {
        let err = PluginCompiler::default()
            .compile("  \n\t", &references(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, StageError::InputMissing(Artifact::Generator)));
    }

    #[test]
    fn test_no_generator_lists_types() {
        let err = PluginCompiler::default()
            .compile(
                "type Helper { } abstract type Base : Generator { }",
                &references(),
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not instantiate source generator. Types in module:\n\nHelper\nBase"
        );
    }

    #[test]
    fn test_compile_errors_are_reported() {
        let err = PluginCompiler::default()
            .compile("type Broken {", &references(), &CancellationToken::new())
            .unwrap_err();
        assert!(err.to_string().starts_with("Error(s) compiling generator:\n\nGenerator.gen("));
    }

    #[test]
    fn test_failed_compiles_are_not_cached() {
        let compiler = PluginCompiler::default();
        let references = references();
        let cancel = CancellationToken::new();
        assert!(compiler.compile("type Broken {", &references, &cancel).is_err());
        assert!(compiler.compile("type Broken {", &references, &cancel).is_err());
        assert_eq!(compiler.compile_count(), 2);
        assert!(compiler.cache().is_empty());
    }
}
