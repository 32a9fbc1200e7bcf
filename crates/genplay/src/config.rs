//! Runner configuration.
//!
//! Every field has a default, so a configuration file only needs the keys
//! it changes:
//!
//! ```json
//! { "plugin_cache_capacity": 4, "library_dir": "libs" }
//! ```

use genplay_plugin::{DEFAULT_CAPACITY, GENERATOR_FILE_NAME};
use genplay_runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings of a [`Runner`](crate::Runner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Compiled plugin sets kept in the cache.
    pub plugin_cache_capacity: usize,
    /// Nested calls allowed in interpreted code.
    pub max_call_depth: usize,
    /// Logical file name of the program source.
    pub program_file_name: String,
    /// Logical file name of the plugin source.
    pub generator_file_name: String,
    /// Directory of extra `*.gen` reference libraries.
    pub library_dir: Option<PathBuf>,
    /// Run generators on the worker pool.
    pub parallel_generators: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            plugin_cache_capacity: DEFAULT_CAPACITY,
            max_call_depth: RuntimeConfig::default().max_call_depth,
            program_file_name: "Program.gen".to_string(),
            generator_file_name: GENERATOR_FILE_NAME.to_string(),
            library_dir: None,
            parallel_generators: true,
        }
    }
}

impl RunnerConfig {
    /// Parse configuration JSON.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read configuration from a JSON file.
    ///
    /// A relative `library_dir` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text)?;
        if let (Some(dir), Some(parent)) = (&config.library_dir, path.parent()) {
            if dir.is_relative() {
                config.library_dir = Some(parent.join(dir));
            }
        }
        Ok(config)
    }

    /// Interpreter limits derived from this configuration.
    pub const fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            max_call_depth: self.max_call_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.plugin_cache_capacity, 10);
        assert_eq!(config.max_call_depth, 256);
        assert_eq!(config.program_file_name, "Program.gen");
        assert_eq!(config.generator_file_name, "Generator.gen");
        assert!(config.parallel_generators);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RunnerConfig::from_json(r#"{ "plugin_cache_capacity": 3 }"#).unwrap();
        assert_eq!(config.plugin_cache_capacity, 3);
        assert_eq!(config.max_call_depth, 256);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = RunnerConfig::from_json(r#"{ "cache": 3 }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration: unknown field `cache`"));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = RunnerConfig {
            library_dir: Some(PathBuf::from("/opt/libs")),
            parallel_generators: false,
            ..RunnerConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(RunnerConfig::from_json(&text).unwrap(), config);
    }
}
