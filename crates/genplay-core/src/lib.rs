//! Core types for genplay
//!
//! This crate provides the vocabulary shared by every stage of the playground
//! pipeline:
//!
//! - [`SourceUnit`] - An immutable (logical name, text) pair
//! - [`Diagnostic`] - A compiler or generator message with a [`Severity`]
//! - [`DiagnosticCode`] - The fixed set of codes produced by the toolchain
//! - [`LibraryIdentity`] - Stable name of a referenced library
//! - [`CancellationToken`] - Cooperative cancellation for superseded runs
//!
//! # Example
//!
//! ```
//! use genplay_core::{Diagnostic, DiagnosticCode, LineIndex, SourceUnit};
//!
//! let unit = SourceUnit::new("Program.gen", "type Program {\n  x\n}");
//! let index = LineIndex::new(&unit.text);
//! let location = index.location(&unit.name, 17);
//!
//! let diag = Diagnostic::from_code(
//!     DiagnosticCode::UnknownName,
//!     "The name 'x' does not exist in the current context",
//! )
//! .at(location);
//!
//! assert_eq!(
//!     diag.to_string(),
//!     "Program.gen(2,3): error E0201: The name 'x' does not exist in the current context"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
pub mod diagnostic;
pub mod library;
pub mod source;

pub use cancel::{CancellationToken, Cancelled};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use library::LibraryIdentity;
pub use source::{LineIndex, Location, SourceUnit};
