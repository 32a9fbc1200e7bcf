//! Library identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a referenced library (its simple name, e.g. `System`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryIdentity(String);

impl LibraryIdentity {
    /// Create a new identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The library name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LibraryIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for LibraryIdentity {
    fn from(name: String) -> Self {
        Self(name)
    }
}
