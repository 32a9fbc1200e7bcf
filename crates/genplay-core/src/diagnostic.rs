//! Diagnostics produced by the compiler and by generators.
//!
//! # Codes
//!
//! | Code | Description |
//! |------|-------------|
//! | P0001 | Unexpected character |
//! | P0002 | Unexpected end of input |
//! | P0003 | Unexpected token |
//! | P0004 | Unterminated string literal |
//! | E0101 | Duplicate type |
//! | E0102 | Duplicate member |
//! | E0103 | Unknown base type |
//! | E0104 | Inheritance cycle |
//! | E0105 | Invalid base list |
//! | E0106 | Capability member not implemented |
//! | E0107 | Missing or unexpected method body |
//! | E0108 | `extern` outside a library |
//! | E0109 | Unknown type annotation |
//! | E0201 | Unknown name |
//! | E0202 | Unknown static member |
//! | E0203 | Wrong argument count |
//! | E0204 | Type cannot be instantiated |
//! | E0205 | `self` in a static context |
//! | E0206 | Invalid assignment target |
//! | E0207 | `break`/`continue` outside a loop |
//! | E0208 | Instance member from a static context |
//! | E0209 | Local already declared |
//! | W0301 | Unused local (warning) |
//! | W0302 | Unreachable code (warning) |
//! | W0303 | No entry point (warning) |
//! | GEN0001 | Generator threw an exception |

use crate::source::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Aborts the stage that produced it.
    Error,
    /// Suspicious but valid.
    Warning,
    /// Informational only.
    Info,
}

impl Severity {
    /// Lowercase name used in rendered diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagnostic severity '{0}'")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" | "information" => Ok(Self::Info),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Diagnostic codes emitted by the genplay toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // === Syntax (Pxxxx) ===
    /// P0001: A character the lexer does not recognise.
    UnexpectedChar,
    /// P0002: Input ended in the middle of a construct.
    UnexpectedEof,
    /// P0003: A token that does not fit the grammar.
    UnexpectedToken,
    /// P0004: A string literal without a closing quote.
    UnterminatedString,

    // === Declarations (E01xx) ===
    /// E0101: Two types share a name.
    DuplicateType,
    /// E0102: Two members of one type share a name.
    DuplicateMember,
    /// E0103: A base type that cannot be found.
    UnknownBaseType,
    /// E0104: A type inherits from itself.
    InheritanceCycle,
    /// E0105: Too many base types, or a capability with a type base.
    InvalidBaseList,
    /// E0106: A concrete type misses a capability method.
    MissingCapabilityMember,
    /// E0107: Body missing on a regular method, or present on a signature.
    InvalidMethodBody,
    /// E0108: `extern` used outside a library compilation.
    ExternNotAllowed,
    /// E0109: A parameter or return annotation names an unknown type.
    UnknownTypeAnnotation,

    // === Bodies (E02xx) ===
    /// E0201: A name that is not in scope.
    UnknownName,
    /// E0202: A static member the type does not declare.
    UnknownMember,
    /// E0203: A call with the wrong number of arguments.
    ArgumentCount,
    /// E0204: `new` on an abstract type, capability or static type.
    CannotInstantiate,
    /// E0205: `self` inside a static method.
    SelfInStaticContext,
    /// E0206: Assignment to something that is not a variable, field or element.
    InvalidAssignmentTarget,
    /// E0207: `break` or `continue` outside a loop.
    JumpOutsideLoop,
    /// E0208: Instance member used without a receiver in a static method.
    InstanceMemberInStaticContext,
    /// E0209: A local declared twice in one scope.
    DuplicateLocal,

    // === Warnings (W03xx) ===
    /// W0301: A local that is never read.
    UnusedLocal,
    /// W0302: Statements after an unconditional jump.
    UnreachableCode,
    /// W0303: An executable without `Program.Main`.
    MissingEntryPoint,

    // === Generators (GENxxxx) ===
    /// GEN0001: A generator threw while executing.
    GeneratorFailed,
}

impl DiagnosticCode {
    /// Get the code string (e.g., "E0201").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedChar => "P0001",
            Self::UnexpectedEof => "P0002",
            Self::UnexpectedToken => "P0003",
            Self::UnterminatedString => "P0004",
            Self::DuplicateType => "E0101",
            Self::DuplicateMember => "E0102",
            Self::UnknownBaseType => "E0103",
            Self::InheritanceCycle => "E0104",
            Self::InvalidBaseList => "E0105",
            Self::MissingCapabilityMember => "E0106",
            Self::InvalidMethodBody => "E0107",
            Self::ExternNotAllowed => "E0108",
            Self::UnknownTypeAnnotation => "E0109",
            Self::UnknownName => "E0201",
            Self::UnknownMember => "E0202",
            Self::ArgumentCount => "E0203",
            Self::CannotInstantiate => "E0204",
            Self::SelfInStaticContext => "E0205",
            Self::InvalidAssignmentTarget => "E0206",
            Self::JumpOutsideLoop => "E0207",
            Self::InstanceMemberInStaticContext => "E0208",
            Self::DuplicateLocal => "E0209",
            Self::UnusedLocal => "W0301",
            Self::UnreachableCode => "W0302",
            Self::MissingEntryPoint => "W0303",
            Self::GeneratorFailed => "GEN0001",
        }
    }

    /// Check if this is a warning (not an error).
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::UnusedLocal | Self::UnreachableCode | Self::MissingEntryPoint
        )
    }

    /// Check if this is just informational.
    ///
    /// No built-in code is informational today; generators report their own.
    #[must_use]
    pub const fn is_info(&self) -> bool {
        false
    }

    /// Get the severity level.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        if self.is_info() {
            Severity::Info
        } else if self.is_warning() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A message attached to a source location.
///
/// The code is a plain string because generators report diagnostics with
/// their own identifiers alongside the toolchain's [`DiagnosticCode`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the message.
    pub severity: Severity,
    /// Diagnostic identifier (e.g. "E0201", "DI0001").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the diagnostic applies, when known.
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a diagnostic with an explicit severity and code.
    #[must_use]
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Create a diagnostic from a toolchain code, taking its default severity.
    #[must_use]
    pub fn from_code(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code.severity(), code.code(), message)
    }

    /// Attach a location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Check whether this diagnostic has error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_severity() {
        assert_eq!(DiagnosticCode::UnknownName.severity(), Severity::Error);
        assert_eq!(DiagnosticCode::UnusedLocal.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::MissingEntryPoint.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::UnexpectedToken.severity(), Severity::Error);
    }

    #[test]
    fn test_display_without_location() {
        let diag = Diagnostic::new(Severity::Error, "DI0001", "Could not find 'IFoo'");
        assert_eq!(diag.to_string(), "error DI0001: Could not find 'IFoo'");
    }

    #[test]
    fn test_display_with_location() {
        let diag = Diagnostic::from_code(DiagnosticCode::UnusedLocal, "The variable 'x' is never used")
            .at(Location::new("Program.gen", 4, 13));
        assert_eq!(
            diag.to_string(),
            "Program.gen(4,13): warning W0301: The variable 'x' is never used"
        );
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("Error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("Info".parse::<Severity>(), Ok(Severity::Info));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_serde_round_trip_keeps_location() {
        let diag = Diagnostic::from_code(DiagnosticCode::DuplicateType, "dup")
            .at(Location::new("a.gen", 1, 1));
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diag);
    }
}
