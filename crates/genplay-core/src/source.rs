//! Source units and location tracking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One compilable file: a logical name paired with its text.
///
/// Units are immutable once created; the text is shared so generated units
/// can be handed to several stages without copying.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUnit {
    /// Logical file name used in diagnostics (e.g. `Program.gen`).
    pub name: String,
    /// Source text.
    pub text: Arc<str>,
}

impl SourceUnit {
    /// Create a new source unit.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Check whether the text is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A 1-based line/column position inside a named file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Logical file name.
    pub file: String,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based, in characters).
    pub column: u32,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.file, self.line, self.column)
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text: Arc<str>,
}

impl LineIndex {
    /// Build an index over the given text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            text: text.into(),
        }
    }

    /// Convert a byte offset into 1-based (line, column).
    ///
    /// Offsets past the end clamp to the last position.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());
        (line as u32 + 1, column as u32 + 1)
    }

    /// Build a [`Location`] for a byte offset in the named file.
    #[must_use]
    pub fn location(&self, file: &str, offset: usize) -> Location {
        let (line, column) = self.line_col(offset);
        Location::new(file, line, column)
    }

    /// Convert a 1-based (line, column) back into a byte offset.
    ///
    /// Positions past the end of a line clamp to its end; lines past the
    /// last one clamp to the end of the text.
    #[must_use]
    pub fn offset(&self, line: u32, column: u32) -> usize {
        let line = line.max(1) as usize - 1;
        let Some(&start) = self.line_starts.get(line) else {
            return self.text.len();
        };
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        self.text[start..end]
            .char_indices()
            .nth(column.max(1) as usize - 1)
            .map_or(end, |(i, _)| start + i)
    }

    /// Number of lines in the indexed text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
