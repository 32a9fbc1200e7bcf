//! Command implementations for the CLI tools.
//!
//! Each module contains the full implementation for a command,
//! which is invoked by a thin wrapper binary.

pub mod check;
pub mod run;
pub mod watch;

use crate::config::RunnerConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GENPLAY_LOG";

/// Install the stderr log subscriber.
///
/// `--verbose` logs everything at debug level with span timings; otherwise
/// the filter comes from `GENPLAY_LOG` and defaults to warnings.
pub fn init_tracing(verbose: bool) {
    let builder = tracing_subscriber::fmt().with_writer(std::io::stderr);
    if verbose {
        builder
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .init();
    } else {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        builder.with_env_filter(filter).init();
    }
}

/// Runner settings shared by the commands.
///
/// Flags override values from `--config`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunnerArgs {
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory of extra `*.gen` reference libraries
    #[arg(long, value_name = "DIR")]
    pub library_dir: Option<PathBuf>,

    /// Number of compiled generators kept in the cache
    #[arg(long, value_name = "N")]
    pub cache_capacity: Option<usize>,

    /// Nested calls allowed in interpreted code
    #[arg(long, value_name = "N")]
    pub max_call_depth: Option<usize>,

    /// Run generators one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,
}

impl RunnerArgs {
    /// Build the effective configuration.
    pub fn resolve(&self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::load(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => RunnerConfig::default(),
        };
        if let Some(dir) = &self.library_dir {
            config.library_dir = Some(dir.clone());
        }
        if let Some(capacity) = self.cache_capacity {
            config.plugin_cache_capacity = capacity;
        }
        if let Some(depth) = self.max_call_depth {
            config.max_call_depth = depth;
        }
        if self.sequential {
            config.parallel_generators = false;
        }
        Ok(config)
    }
}
