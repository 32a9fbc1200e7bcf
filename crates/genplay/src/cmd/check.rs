//! Implementation of genplay-check.

use crate::cmd::{init_tracing, RunnerArgs};
use crate::report::{self, Counts, SourceCache};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use genplay_compiler::{Compilation, CompileOptions, DirectoryLibraries, ReferenceSetProvider};
use genplay_core::{CancellationToken, Diagnostic, Severity, SourceUnit};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling integration
    Json,
}

/// JSON output structure for all diagnostics.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// List of diagnostics
    pub diagnostics: &'a [Diagnostic],
    /// Total error count
    pub error_count: usize,
    /// Total warning count
    pub warning_count: usize,
}

/// Compile Gen files as a library and report diagnostics.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The Gen files to check, compiled together
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show debug logging with stage timings
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

/// Compile `units` as one library and return its diagnostics.
pub fn check_units(units: Vec<SourceUnit>, library_dir: Option<PathBuf>) -> Result<Vec<Diagnostic>> {
    let mut provider = ReferenceSetProvider::bundled();
    if let Some(dir) = library_dir {
        provider = provider.with_source(DirectoryLibraries::new(dir));
    }
    let cancel = CancellationToken::new();
    let references = provider
        .get_or_resolve(&cancel)
        .context("failed to resolve reference libraries")?;
    let compilation = Compilation::create(
        "Check",
        units,
        references,
        CompileOptions::library(),
        &cancel,
    )?;
    Ok(compilation.diagnostics().to_vec())
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();
    let start = std::time::Instant::now();
    let config = args.runner.resolve()?;

    let mut cache = SourceCache::new();
    let mut units = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path.display().to_string();
        cache.add(name.clone(), text.clone());
        units.push(SourceUnit::new(name, text));
    }

    let diagnostics = check_units(units, config.library_dir)?;
    debug!(
        files = args.files.len(),
        diagnostics = diagnostics.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "check finished"
    );

    let counts = Counts {
        errors: diagnostics.iter().filter(|d| d.severity == Severity::Error).count(),
        warnings: diagnostics.iter().filter(|d| d.severity == Severity::Warning).count(),
    };

    if !args.quiet {
        match args.format {
            OutputFormat::Text => {
                report::report_diagnostics(&diagnostics, &cache, &mut stdout)?;
                report::print_summary(counts, &mut stdout)?;
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    diagnostics: &diagnostics,
                    error_count: counts.errors,
                    warning_count: counts.warnings,
                };
                serde_json::to_writer_pretty(&mut stdout, &output)?;
                writeln!(stdout)?;
            }
        }
    }

    Ok(if counts.errors > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Main entry point for genplay-check.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
