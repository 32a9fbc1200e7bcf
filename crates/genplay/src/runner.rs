//! The staged compile, transform, compile, execute pipeline.

use crate::config::RunnerConfig;
use genplay_compiler::{
    Compilation, CompileOptions, DirectoryLibraries, EmitError, ReferenceSetProvider,
};
use genplay_core::{CancellationToken, Cancelled, SourceUnit};
use genplay_plugin::{Artifact, PluginCompiler, StageError, TransformationDriver};
use genplay_runtime::ExecutionHost;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The three texts a run produces.
///
/// `error` is empty exactly when every stage succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Generated-source report.
    pub generated_source: String,
    /// Captured program output.
    pub program_output: String,
    /// Error report of the failing stage.
    pub error: String,
}

impl RunResult {
    /// True if every stage succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

/// Runs a program through a plugin.
///
/// A runner is shared across runs: it owns the reference set and the
/// plugin cache. Everything else is created per run.
pub struct Runner {
    references: ReferenceSetProvider,
    plugins: PluginCompiler,
    driver: TransformationDriver,
    host: ExecutionHost,
    config: RunnerConfig,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("references_resolved", &self.references.is_resolved())
            .field("plugins", &self.plugins)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl Runner {
    /// Runner over the bundled libraries plus `config.library_dir`.
    pub fn new(config: RunnerConfig) -> Self {
        let mut references = ReferenceSetProvider::bundled();
        if let Some(dir) = &config.library_dir {
            references = references.with_source(DirectoryLibraries::new(dir));
        }
        Self::with_references(config, references)
    }

    /// Runner over an explicit reference provider.
    pub fn with_references(config: RunnerConfig, references: ReferenceSetProvider) -> Self {
        let runtime = config.runtime_config();
        Self {
            references,
            plugins: PluginCompiler::new(config.plugin_cache_capacity)
                .with_file_name(config.generator_file_name.as_str())
                .with_runtime_config(runtime),
            driver: TransformationDriver::new(config.parallel_generators),
            host: ExecutionHost::new(runtime),
            config,
        }
    }

    /// The configuration.
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The plugin compiler, for cache inspection.
    pub const fn plugin_compiler(&self) -> &PluginCompiler {
        &self.plugins
    }

    /// Run `program` through `plugin`.
    pub fn run(&self, program: &str, plugin: &str) -> RunResult {
        match self.run_cancellable(program, plugin, &CancellationToken::new()) {
            Ok(result) => result,
            Err(Cancelled) => RunResult {
                error: StageError::Cancelled.to_string(),
                ..RunResult::default()
            },
        }
    }

    /// Run `program` through `plugin`, giving up once `cancel` fires.
    ///
    /// Every stage before execution observes the token. A cancelled run
    /// has no result.
    pub fn run_cancellable(
        &self,
        program: &str,
        plugin: &str,
        cancel: &CancellationToken,
    ) -> Result<RunResult, Cancelled> {
        let started = Instant::now();
        let _span = tracing::info_span!("run").entered();
        let mut result = RunResult::default();

        match self.stages(program, plugin, cancel, &mut result) {
            Ok(output) => {
                result.program_output = output;
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "run succeeded");
            }
            Err(StageError::Cancelled) => {
                debug!("run cancelled");
                return Err(Cancelled);
            }
            Err(err) => {
                warn!(stage = err.kind(), elapsed_ms = started.elapsed().as_millis() as u64, "run failed");
                result.error = err.to_string();
            }
        }
        Ok(result)
    }

    fn stages(
        &self,
        program: &str,
        plugin: &str,
        cancel: &CancellationToken,
        result: &mut RunResult,
    ) -> Result<String, StageError> {
        if plugin.trim().is_empty() {
            return Err(StageError::InputMissing(Artifact::Generator));
        }
        if program.trim().is_empty() {
            return Err(StageError::InputMissing(Artifact::Program));
        }

        let references = self.references.get_or_resolve(cancel)?;

        let plugins = self.plugins.compile(plugin, &references, cancel)?;
        debug!(generators = ?plugins.names(), "plugin stage done");

        let original = Compilation::create(
            "Program",
            vec![SourceUnit::new(self.config.program_file_name.as_str(), program)],
            references.clone(),
            CompileOptions::library(),
            cancel,
        )?;

        let transformation = self.driver.run(&original, &plugins, cancel)?;
        result.generated_source = transformation.report();
        let Some(augmented) = transformation.augmented else {
            return Err(StageError::Generator(
                transformation.diagnostics.into_iter().filter(|d| d.is_error()).collect(),
            ));
        };
        debug!(generated = transformation.generated.len(), "transformation stage done");

        if augmented.has_errors() {
            return Err(StageError::Compile {
                stage: Artifact::Program,
                diagnostics: augmented.errors().cloned().collect(),
            });
        }
        let bytes = augmented.emit().map_err(|err| StageError::Emit {
            stage: Artifact::Program,
            cause: match err {
                EmitError::Empty => None,
                other => Some(other.to_string()),
            },
        })?;
        cancel.check()?;
        debug!(bytes = bytes.len(), "program stage done");

        Ok(self.host.execute(&bytes, &references)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plugin_is_reported_first() {
        let result = Runner::default().run("", "");
        assert_eq!(result.error, "Cannot run yet, need more input for the generator code.");
        assert!(result.generated_source.is_empty());
        assert!(result.program_output.is_empty());
    }

    #[test]
    fn test_cancelled_run_has_no_result() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = Runner::default().run_cancellable(
            "type Program { static fn Main() { } }",
            "type G : Generator { fn Execute(context) { } }",
            &cancel,
        );
        assert_eq!(outcome, Err(Cancelled));
    }

    #[test]
    fn test_run_result_json_shape() {
        let result = RunResult {
            generated_source: "g".into(),
            program_output: "p".into(),
            error: String::new(),
        };
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"generated_source":"g","program_output":"p","error":""}"#
        );
        assert!(result.is_success());
    }
}
