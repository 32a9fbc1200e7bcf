//! Source generator plugins for genplay.
//!
//! A plugin is Gen source declaring one or more types that implement the
//! `Generator` capability of the `Generation` library. This crate compiles
//! plugins, caches the activated generators by normalized source and runs
//! them against a program to produce extra source units.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`PluginCompiler`] | Compile, emit and discover generator types |
//! | [`PluginCache`] | Bounded LRU map keyed by [`CacheKey`] |
//! | [`TransformationPluginInstance`] | One generator, executed in a fresh generation per call |
//! | [`TransformationDriver`] | Runs a [`PluginSet`] and builds the augmented compilation |
//! | [`StageError`] | A failed stage and its user-facing report |
//!
//! # Example
//!
//! ```
//! use genplay_compiler::{Compilation, CompileOptions, ReferenceSetProvider};
//! use genplay_core::{CancellationToken, SourceUnit};
//! use genplay_plugin::{PluginCompiler, TransformationDriver};
//!
//! let cancel = CancellationToken::new();
//! let references = ReferenceSetProvider::bundled().get_or_resolve(&cancel).unwrap();
//! let plugins = PluginCompiler::default()
//!     .compile(
//!         r#"type Hello : Generator {
//!             fn Execute(context) { context.AddSource("Hello", "type Hello { }"); }
//!         }"#,
//!         &references,
//!         &cancel,
//!     )
//!     .unwrap();
//!
//! let program = Compilation::create(
//!     "Program",
//!     vec![SourceUnit::new("Program.gen", "type Program { static fn Main() { } }")],
//!     references,
//!     CompileOptions::library(),
//!     &cancel,
//! )
//! .unwrap();
//! let transformation = TransformationDriver::default()
//!     .run(&program, &plugins, &cancel)
//!     .unwrap();
//! assert_eq!(transformation.generated[0].name, "Hello/Hello.gen");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod compiler;
pub mod driver;
pub mod error;
pub mod host;
pub mod instance;

pub use cache::{CacheKey, PluginCache, DEFAULT_CAPACITY};
pub use compiler::{PluginCompiler, PluginSet, GENERATOR_FILE_NAME};
pub use driver::{generated_report, Transformation, TransformationDriver, NO_SOURCE};
pub use error::{Artifact, StageError};
pub use host::{GeneratorContextObject, GeneratorOutput};
pub use instance::TransformationPluginInstance;
