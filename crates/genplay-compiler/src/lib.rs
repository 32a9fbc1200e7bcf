//! Gen compiler: binding, lowering, module emission and reference libraries.
//!
//! A [`Compilation`] parses a set of [`SourceUnit`](genplay_core::SourceUnit)s,
//! binds them against a [`ReferenceSet`], lowers every method body to the
//! module IR and records diagnostics. A compilation without errors emits a
//! [`ModuleImage`] serialized with `rmp-serde`.
//!
//! # Stages
//!
//! | Stage | Produces |
//! |-------|----------|
//! | Parse | `P0001`..`P0004` |
//! | Declarations | symbol table, `E0101`..`E0109` |
//! | Lowering | IR bodies, invocation records, `E0201`..`E0209`, `W0301`, `W0302` |
//! | Entry check (executables) | `W0303` |
//! | Emission | `MessagePack` module image |
//!
//! # Example
//!
//! ```
//! use genplay_compiler::{Compilation, CompileOptions, ReferenceSetProvider};
//! use genplay_core::{CancellationToken, SourceUnit};
//!
//! let cancel = CancellationToken::new();
//! let references = ReferenceSetProvider::bundled().get_or_resolve(&cancel).unwrap();
//!
//! let program = SourceUnit::new(
//!     "Program.gen",
//!     "type Program { static fn Main() { Console.WriteLine(\"hi\"); } }",
//! );
//! let compilation = Compilation::create(
//!     "Program",
//!     vec![program],
//!     references,
//!     CompileOptions::executable(),
//!     &cancel,
//! )
//! .unwrap();
//!
//! assert!(!compilation.has_errors());
//! assert!(!compilation.emit().unwrap().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binder;
mod compilation;
pub mod error;
pub mod ir;
pub mod library;
mod lower;
pub mod model;
pub mod reference;

pub use compilation::{Compilation, CompileOptions};
pub use error::{EmitError, LibraryError, ReferenceError};
pub use ir::{DecodeError, ModuleImage, OutputKind};
pub use library::{BundledLibraries, DirectoryLibraries, LibrarySource};
pub use model::{InvocationInfo, SemanticModel, SymbolTable, TypeSymbol};
pub use reference::{ReferenceSet, ReferenceSetProvider};
