//! Implementation of genplay-run.

use crate::cmd::{init_tracing, RunnerArgs};
use crate::runner::{RunResult, Runner};
use crate::samples::{BundledSamples, SampleCatalog};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Output format for run results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Sections of plain text (default)
    #[default]
    Text,
    /// The run result as a JSON object
    Json,
}

/// Compile a generator, run it over a program, then compile and execute
/// the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The program source file
    #[arg(value_name = "PROGRAM", requires = "generator", conflicts_with = "sample")]
    pub program: Option<PathBuf>,

    /// The generator source file
    #[arg(value_name = "GENERATOR")]
    pub generator: Option<PathBuf>,

    /// Run a bundled sample instead of files
    #[arg(long, value_name = "NAME")]
    pub sample: Option<String>,

    /// List the bundled samples and exit
    #[arg(long)]
    pub list_samples: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show debug logging with stage timings
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

/// Write a result as titled text sections.
///
/// The error section is left out of successful runs.
pub fn write_text<W: Write>(result: &RunResult, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "=== Generated source ===")?;
    writeln!(writer, "{}", result.generated_source)?;
    writeln!(writer, "=== Program output ===")?;
    writeln!(writer, "{}", result.program_output.trim_end_matches('\n'))?;
    if !result.is_success() {
        writeln!(writer, "=== Errors ===")?;
        writeln!(writer, "{}", result.error.trim_end_matches('\n'))?;
    }
    Ok(())
}

fn load_sources(args: &Args) -> Result<(String, String)> {
    if let Some(name) = &args.sample {
        return BundledSamples
            .load_sample(name)
            .ok_or_else(|| anyhow!("unknown sample '{name}' (try --list-samples)"));
    }
    let (Some(program), Some(generator)) = (&args.program, &args.generator) else {
        bail!("expected PROGRAM and GENERATOR files, or --sample NAME");
    };
    let program_text = std::fs::read_to_string(program)
        .with_context(|| format!("failed to read {}", program.display()))?;
    let generator_text = std::fs::read_to_string(generator)
        .with_context(|| format!("failed to read {}", generator.display()))?;
    Ok((program_text, generator_text))
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    if args.list_samples {
        for name in BundledSamples.list_sample_names() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let (program, generator) = load_sources(args)?;
    let runner = Runner::new(args.runner.resolve()?);
    let result = runner.run(&program, &generator);

    match args.format {
        OutputFormat::Text => write_text(&result, &mut stdout)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &result)?;
            writeln!(stdout)?;
        }
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Main entry point for genplay-run.
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
