//! Library sources: where reference libraries come from.
//!
//! The compiler never knows how libraries are discovered. It asks a
//! [`LibrarySource`] for the identities it offers and then for each
//! library's bytes. Two sources ship with the crate: the libraries embedded
//! in the binary and a directory of `.gen` files.

use crate::error::LibraryError;
use genplay_core::LibraryIdentity;
use std::path::{Path, PathBuf};

/// Collaborator that enumerates and serves reference libraries.
pub trait LibrarySource: Send + Sync {
    /// Identities of every library this source offers, in resolution order.
    fn enumerate_available_libraries(&self) -> Result<Vec<LibraryIdentity>, LibraryError>;

    /// Raw bytes (UTF-8 Gen source) of one library.
    fn fetch_library_bytes(&self, identity: &LibraryIdentity) -> Result<Vec<u8>, LibraryError>;
}

const SYSTEM_SOURCE: &str = include_str!("../libs/System.gen");
const GENERATION_SOURCE: &str = include_str!("../libs/Generation.gen");

/// Libraries embedded in the binary: `System`, then `Generation`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLibraries;

impl BundledLibraries {
    const LIBRARIES: [(&'static str, &'static str); 2] = [
        ("System", SYSTEM_SOURCE),
        ("Generation", GENERATION_SOURCE),
    ];

    /// Source text of a bundled library.
    pub fn source(name: &str) -> Option<&'static str> {
        Self::LIBRARIES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| *text)
    }
}

impl LibrarySource for BundledLibraries {
    fn enumerate_available_libraries(&self) -> Result<Vec<LibraryIdentity>, LibraryError> {
        Ok(Self::LIBRARIES
            .iter()
            .map(|(name, _)| LibraryIdentity::new(*name))
            .collect())
    }

    fn fetch_library_bytes(&self, identity: &LibraryIdentity) -> Result<Vec<u8>, LibraryError> {
        Self::source(identity.as_str())
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| LibraryError::NotFound(identity.clone()))
    }
}

/// Every `*.gen` file in a directory, ordered by file name.
///
/// The identity of a library is its file stem.
#[derive(Debug, Clone)]
pub struct DirectoryLibraries {
    dir: PathBuf,
}

impl DirectoryLibraries {
    /// Serve libraries from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The served directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, identity: &LibraryIdentity) -> PathBuf {
        self.dir.join(format!("{identity}.gen"))
    }

    fn io_error(path: &Path, source: std::io::Error) -> LibraryError {
        LibraryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl LibrarySource for DirectoryLibraries {
    fn enumerate_available_libraries(&self) -> Result<Vec<LibraryIdentity>, LibraryError> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Self::io_error(&self.dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "gen") {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths
            .iter()
            .filter_map(|p| p.file_stem())
            .map(|stem| LibraryIdentity::new(stem.to_string_lossy()))
            .collect())
    }

    fn fetch_library_bytes(&self, identity: &LibraryIdentity) -> Result<Vec<u8>, LibraryError> {
        let path = self.path_of(identity);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LibraryError::NotFound(identity.clone()))
            }
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_order() {
        let ids = BundledLibraries.enumerate_available_libraries().unwrap();
        assert_eq!(
            ids,
            vec![LibraryIdentity::new("System"), LibraryIdentity::new("Generation")]
        );
    }

    #[test]
    fn test_bundled_missing() {
        let err = BundledLibraries
            .fetch_library_bytes(&LibraryIdentity::new("Nope"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }

    #[test]
    fn test_directory_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.gen"), "type B {}").unwrap();
        std::fs::write(dir.path().join("a.gen"), "type A {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = DirectoryLibraries::new(dir.path());
        let ids = source.enumerate_available_libraries().unwrap();
        assert_eq!(ids, vec![LibraryIdentity::new("a"), LibraryIdentity::new("b")]);
        assert_eq!(
            source.fetch_library_bytes(&ids[1]).unwrap(),
            b"type B {}".to_vec()
        );
    }

    #[test]
    fn test_directory_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryLibraries::new(dir.path().join("absent"));
        assert!(matches!(
            source.enumerate_available_libraries(),
            Err(LibraryError::Io { .. })
        ));
    }
}
