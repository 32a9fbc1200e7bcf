//! Implementation of genplay-watch.
//!
//! Polls a program and a generator file and re-runs the pipeline through a
//! [`Session`] whenever either changes. An edit made while a run is in
//! flight supersedes it.

use crate::cmd::run::write_text;
use crate::cmd::{init_tracing, RunnerArgs};
use crate::runner::Runner;
use crate::session::{Session, SessionEvent};
use anyhow::{bail, Context, Result};
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Re-run a program and generator whenever either file changes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The program source file
    #[arg(value_name = "PROGRAM")]
    pub program: PathBuf,

    /// The generator source file
    #[arg(value_name = "GENERATOR")]
    pub generator: PathBuf,

    /// Polling interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 300)]
    pub interval: u64,

    /// Show debug logging with stage timings
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub runner: RunnerArgs,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(args: &Args) -> Result<ExitCode> {
    let runner = Arc::new(Runner::new(args.runner.resolve()?));
    let session = Session::new(runner).context("failed to start the session worker")?;
    let events = session.events();
    let interval = Duration::from_millis(args.interval.max(10));
    let mut seen: Option<(String, String)> = None;

    loop {
        // Editors often replace files non-atomically; retry on the next poll.
        match read(&args.program).and_then(|p| Ok((p, read(&args.generator)?))) {
            Ok(sources) if seen.as_ref() != Some(&sources) => {
                let revision = session.submit(sources.0.clone(), sources.1.clone());
                info!(revision, "sources changed");
                seen = Some(sources);
            }
            Ok(_) => {}
            Err(e) => warn!("{e:#}"),
        }

        match events.recv_timeout(interval) {
            Ok(SessionEvent::Completed { revision }) => {
                if let Some(result) = session.latest() {
                    let mut stdout = io::stdout().lock();
                    writeln!(stdout, "--- revision {revision} ---")?;
                    write_text(&result, &mut stdout)?;
                    stdout.flush()?;
                }
            }
            Ok(SessionEvent::Superseded { .. }) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("the session worker stopped"),
        }
    }
}

/// Main entry point for genplay-watch.
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
