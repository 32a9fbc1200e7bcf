//! Diagnostic rendering.
//!
//! Uses ariadne for pretty-printed diagnostics with source context.

use ariadne::{ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};
use genplay_core::{Diagnostic, LineIndex, Location, Severity};
use std::collections::HashMap;
use std::io::Write;

/// Source texts by logical file name.
#[derive(Debug, Default)]
pub struct SourceCache {
    sources: HashMap<String, String>,
}

impl SourceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source file to the cache.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(name.into(), text.into());
    }

    /// Get a source by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }
}

/// Error and warning counts of a rendered batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Errors rendered.
    pub errors: usize,
    /// Warnings rendered.
    pub warnings: usize,
}

/// Render diagnostics to the given writer.
///
/// Diagnostics whose file is in `cache` get a source snippet; the rest are
/// printed on one line.
pub fn report_diagnostics<W: Write>(
    diagnostics: &[Diagnostic],
    cache: &SourceCache,
    writer: &mut W,
) -> std::io::Result<Counts> {
    let mut colors = ColorGenerator::new();
    let mut counts = Counts::default();

    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Error => counts.errors += 1,
            Severity::Warning => counts.warnings += 1,
            Severity::Info => {}
        }

        let snippet = diagnostic
            .location
            .as_ref()
            .and_then(|location| cache.get(&location.file).map(|text| (location, text)));
        let Some((location, text)) = snippet else {
            writeln!(writer, "{diagnostic}")?;
            continue;
        };

        let span = span_of(location, text);
        let name = location.file.as_str();
        Report::build(kind_of(diagnostic.severity), (name, span.clone()))
            .with_code(&diagnostic.code)
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((name, span))
                    .with_message(diagnostic.severity.as_str())
                    .with_color(colors.next()),
            )
            .with_config(
                Config::default()
                    .with_compact(false)
                    .with_index_type(IndexType::Byte),
            )
            .finish()
            .write((name, Source::from(text)), &mut *writer)?;
    }

    Ok(counts)
}

const fn kind_of(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    }
}

/// The byte range of the character at `location`.
fn span_of(location: &Location, text: &str) -> std::ops::Range<usize> {
    let start = LineIndex::new(text).offset(location.line, location.column);
    let end = text[start..]
        .chars()
        .next()
        .map_or(start, |c| start + c.len_utf8());
    start..end
}

/// Print a summary of errors and warnings.
pub fn print_summary<W: Write>(counts: Counts, writer: &mut W) -> std::io::Result<()> {
    let Counts { errors, warnings } = counts;
    if errors == 0 && warnings == 0 {
        writeln!(writer, "\x1b[32m\u{2713}\x1b[0m No errors found")?;
    } else {
        let error_text = if errors == 1 { "error" } else { "errors" };
        let warning_text = if warnings == 1 { "warning" } else { "warnings" };

        if errors > 0 && warnings > 0 {
            writeln!(
                writer,
                "\x1b[31m\u{2717}\x1b[0m {errors} {error_text}, {warnings} {warning_text}"
            )?;
        } else if errors > 0 {
            writeln!(writer, "\x1b[31m\u{2717}\x1b[0m {errors} {error_text}")?;
        } else {
            writeln!(writer, "\x1b[33m\u{26A0}\x1b[0m {warnings} {warning_text}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(diagnostics: &[Diagnostic], cache: &SourceCache) -> (Counts, String) {
        let mut out = Vec::new();
        let counts = report_diagnostics(diagnostics, cache, &mut out).unwrap();
        (counts, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_unlocated_diagnostic_is_one_line() {
        let diagnostic = Diagnostic::new(Severity::Warning, "W1", "careful");
        let (counts, text) = render(&[diagnostic], &SourceCache::new());
        assert_eq!(counts, Counts { errors: 0, warnings: 1 });
        assert_eq!(text, "warning W1: careful\n");
    }

    #[test]
    fn test_located_diagnostic_shows_source() {
        let mut cache = SourceCache::new();
        cache.add("Program.gen", "type Program {\n  oops\n}\n");
        let diagnostic = Diagnostic::new(Severity::Error, "E0201", "The name 'oops' does not exist")
            .at(Location::new("Program.gen", 2, 3));
        let (counts, text) = render(&[diagnostic], &cache);
        assert_eq!(counts.errors, 1);
        assert!(text.contains("E0201"));
        assert!(text.contains("oops"));
        assert!(text.contains("Program.gen"));
    }

    #[test]
    fn test_span_covers_one_character() {
        let location = Location::new("a", 1, 2);
        assert_eq!(span_of(&location, "xé"), 1..3);
        assert_eq!(span_of(&Location::new("a", 5, 1), "x"), 1..1);
    }

    #[test]
    fn test_summary_wording() {
        let mut out = Vec::new();
        print_summary(Counts { errors: 1, warnings: 2 }, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("1 error, 2 warnings\n"));
    }
}
