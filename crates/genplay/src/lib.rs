//! Source generator playground.
//!
//! Compiles a generator plugin, runs it over a program, compiles the
//! program together with the generated sources and executes the result,
//! capturing its console output:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Runner`] | One run of the whole pipeline, producing a [`RunResult`] |
//! | [`Session`] | Background runs where the newest submission wins |
//! | [`RunnerConfig`] | Cache size, interpreter limits and file names |
//! | [`SampleCatalog`] | Bundled program/generator pairs |
//!
//! The command-line tools live in [`cmd`]:
//!
//! - `genplay-run`: Run a program through a generator
//! - `genplay-check`: Check Gen files and render diagnostics
//! - `genplay-watch`: Re-run on every edit
//!
//! # Example
//!
//! ```
//! use genplay::Runner;
//!
//! let result = Runner::default().run(
//!     r#"type Program { static fn Main() { Console.Write(Greeter.Hello()); } }"#,
//!     r#"type Hello : Generator {
//!         fn Execute(context) {
//!             context.AddSource("Greeter", "static type Greeter { static fn Hello() { return \"hi\"; } }");
//!         }
//!     }"#,
//! );
//! assert!(result.is_success(), "{}", result.error);
//! assert_eq!(result.program_output, "hi");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod config;
pub mod report;
pub mod runner;
pub mod samples;
pub mod session;

pub use config::{ConfigError, RunnerConfig};
pub use runner::{RunResult, Runner};
pub use samples::{BundledSamples, SampleCatalog};
pub use session::{Session, SessionEvent};
