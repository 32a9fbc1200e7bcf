//! Error types for emission and reference resolution.

use crate::ir::DecodeError;
use genplay_core::{Diagnostic, LibraryIdentity};
use std::path::PathBuf;
use thiserror::Error;

/// Errors producing a module image.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The compilation has Error-severity diagnostics.
    #[error("compilation has {0} error(s)")]
    HasErrors(usize),
    /// Serialization failed.
    #[error("failed to encode module image: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    /// Serialization produced no bytes.
    #[error("emission produced an empty module image")]
    Empty,
}

/// Errors from a [`LibrarySource`](crate::LibrarySource).
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Reading a library file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The source does not provide the requested library.
    #[error("library '{0}' is not available")]
    NotFound(LibraryIdentity),
    /// Library bytes are not UTF-8 Gen source.
    #[error("library '{0}' is not valid UTF-8")]
    InvalidUtf8(LibraryIdentity),
}

/// Errors resolving the reference set.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// A library source failed.
    #[error(transparent)]
    Library(#[from] LibraryError),
    /// A library did not compile.
    #[error("library '{library}' has {} error(s): {}", .diagnostics.len(), first_message(.diagnostics))]
    Compile {
        /// Failing library.
        library: LibraryIdentity,
        /// Error diagnostics.
        diagnostics: Vec<Diagnostic>,
    },
    /// A library compiled but could not be emitted.
    #[error("library '{library}' could not be emitted: {source}")]
    Emit {
        /// Failing library.
        library: LibraryIdentity,
        /// Emission error.
        source: EmitError,
    },
    /// An emitted library image could not be read back.
    #[error("library '{library}' could not be loaded: {source}")]
    Decode {
        /// Failing library.
        library: LibraryIdentity,
        /// Decoding error.
        source: DecodeError,
    },
    /// Resolution was cancelled.
    #[error(transparent)]
    Cancelled(#[from] genplay_core::Cancelled),
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}
