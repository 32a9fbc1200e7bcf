//! The reference set and its provider.
//!
//! Reference libraries are compiled once per process. The provider asks each
//! [`LibrarySource`] for its libraries, compiles them in order (each against
//! the ones before it) and caches the resulting set. A failed resolution is
//! reported and not cached, so the next run tries again.

use crate::compilation::{Compilation, CompileOptions};
use crate::error::{LibraryError, ReferenceError};
use crate::ir::ModuleImage;
use crate::library::{BundledLibraries, LibrarySource};
use genplay_core::{CancellationToken, LibraryIdentity, SourceUnit};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Compiled reference libraries in resolution order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    libraries: Vec<Arc<ModuleImage>>,
}

impl ReferenceSet {
    /// A set over the given images.
    pub fn new(libraries: Vec<Arc<ModuleImage>>) -> Self {
        Self { libraries }
    }

    /// A set with no libraries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Library images in resolution order.
    pub fn libraries(&self) -> &[Arc<ModuleImage>] {
        &self.libraries
    }

    /// Library identities in resolution order.
    pub fn identities(&self) -> Vec<LibraryIdentity> {
        self.libraries
            .iter()
            .map(|l| LibraryIdentity::new(l.name.clone()))
            .collect()
    }

    /// Look up a library by identity.
    pub fn library(&self, identity: &LibraryIdentity) -> Option<&Arc<ModuleImage>> {
        self.libraries
            .iter()
            .find(|l| l.name == identity.as_str())
    }

    /// Whether the set contains `identity`.
    pub fn contains(&self, identity: &LibraryIdentity) -> bool {
        self.library(identity).is_some()
    }

    /// Number of libraries.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

/// Resolves and caches the process-wide reference set.
pub struct ReferenceSetProvider {
    sources: Vec<Box<dyn LibrarySource>>,
    resolved: Mutex<Option<Arc<ReferenceSet>>>,
}

impl ReferenceSetProvider {
    /// A provider with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            resolved: Mutex::new(None),
        }
    }

    /// A provider serving the bundled libraries.
    pub fn bundled() -> Self {
        Self::new().with_source(BundledLibraries)
    }

    /// Add a library source; earlier sources win on identity clashes.
    pub fn with_source(mut self, source: impl LibrarySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Whether a set has already been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved.lock().is_some()
    }

    /// Return the cached set, resolving it on first use.
    ///
    /// Concurrent callers wait for a single resolution.
    pub fn get_or_resolve(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<ReferenceSet>, ReferenceError> {
        let mut resolved = self.resolved.lock();
        if let Some(set) = resolved.as_ref() {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(self.resolve(cancel)?);
        info!(libraries = set.len(), "resolved reference set");
        *resolved = Some(Arc::clone(&set));
        Ok(set)
    }

    fn enumerate(&self) -> Result<Vec<(usize, LibraryIdentity)>, LibraryError> {
        let mut seen = HashSet::new();
        let mut identities = Vec::new();
        for (index, source) in self.sources.iter().enumerate() {
            for identity in source.enumerate_available_libraries()? {
                if seen.insert(identity.clone()) {
                    identities.push((index, identity));
                } else {
                    debug!(library = %identity, "skipping library already provided");
                }
            }
        }
        Ok(identities)
    }

    fn resolve(&self, cancel: &CancellationToken) -> Result<ReferenceSet, ReferenceError> {
        let mut set = ReferenceSet::empty();
        for (index, identity) in self.enumerate()? {
            cancel.check()?;
            let bytes = self.sources[index].fetch_library_bytes(&identity)?;
            let text = String::from_utf8(bytes)
                .map_err(|_| LibraryError::InvalidUtf8(identity.clone()))?;
            let image = compile_library(&identity, text, &set, cancel)?;
            debug!(library = %identity, types = image.types.len(), "compiled library");
            set.libraries.push(Arc::new(image));
        }
        Ok(set)
    }
}

impl Default for ReferenceSetProvider {
    fn default() -> Self {
        Self::bundled()
    }
}

impl std::fmt::Debug for ReferenceSetProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceSetProvider")
            .field("sources", &self.sources.len())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

fn compile_library(
    identity: &LibraryIdentity,
    text: String,
    references: &ReferenceSet,
    cancel: &CancellationToken,
) -> Result<ModuleImage, ReferenceError> {
    let unit = SourceUnit::new(format!("{identity}.gen"), text);
    let compilation = Compilation::create(
        identity.as_str(),
        vec![unit],
        Arc::new(references.clone()),
        CompileOptions::reference_library(),
        cancel,
    )?;
    if compilation.has_errors() {
        return Err(ReferenceError::Compile {
            library: identity.clone(),
            diagnostics: compilation.errors().cloned().collect(),
        });
    }
    let bytes = compilation.emit().map_err(|source| ReferenceError::Emit {
        library: identity.clone(),
        source,
    })?;
    ModuleImage::decode(&bytes).map_err(|source| ReferenceError::Decode {
        library: identity.clone(),
        source,
    })
}
