//! Stage failures and their user-facing text.

use genplay_compiler::ReferenceError;
use genplay_core::Diagnostic;
use genplay_runtime::ExecutionError;
use std::fmt;
use thiserror::Error;

/// Which input a stage was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// The plugin (generator) source.
    Generator,
    /// The program source.
    Program,
}

impl Artifact {
    /// Lowercase name used in messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Program => "program",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lines(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn emit_text(stage: &Artifact, cause: &Option<String>) -> String {
    match cause {
        Some(cause) => format!("Error emitting {stage}:\n\n{cause}"),
        None => format!("Unknown error emitting {stage}."),
    }
}

fn execution_text(error: &ExecutionError) -> String {
    match error {
        ExecutionError::Exception { output, exception } => {
            let mut text = String::new();
            if !output.is_empty() {
                text.push_str(output);
                if !output.ends_with('\n') {
                    text.push('\n');
                }
                text.push('\n');
            }
            text.push_str("Error executing program:\n\n");
            text.push_str(&exception.description());
            text
        }
        other => format!("Error executing program:\n\n{other}"),
    }
}

/// A pipeline stage that did not complete.
///
/// The `Display` text is the error report shown to the user: a header
/// naming the stage, a blank line, then one entry per diagnostic.
#[derive(Debug, Error)]
pub enum StageError {
    /// A source blob is empty or whitespace.
    #[error("Cannot run yet, need more input for the {0} code.")]
    InputMissing(Artifact),
    /// The reference set could not be resolved.
    #[error("Error(s) resolving references:\n\ncould not resolve references: {0}")]
    References(#[source] ReferenceError),
    /// Compilation produced error diagnostics.
    #[error("Error(s) compiling {stage}:\n\n{}", lines(.diagnostics))]
    Compile {
        /// Stage that failed.
        stage: Artifact,
        /// Error diagnostics of the compilation.
        diagnostics: Vec<Diagnostic>,
    },
    /// Emission failed or produced nothing.
    #[error("{}", emit_text(.stage, .cause))]
    Emit {
        /// Stage that failed.
        stage: Artifact,
        /// Cause; `None` when the emission was empty.
        cause: Option<String>,
    },
    /// No activatable generator type in the plugin module.
    #[error("Could not instantiate source generator. Types in module:\n\n{}", .types.join("\n"))]
    Instantiation {
        /// Every type the module declares.
        types: Vec<String>,
    },
    /// A generator reported error diagnostics.
    #[error("Error(s) running generator:\n\n{}", lines(.0))]
    Generator(Vec<Diagnostic>),
    /// The program could not be executed.
    #[error("{}", execution_text(.0))]
    Execution(#[source] ExecutionError),
    /// The run was superseded.
    #[error("Run was cancelled.")]
    Cancelled,
}

impl StageError {
    /// Short stage label for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InputMissing(_) => "input-missing",
            Self::References(_) => "infrastructure",
            Self::Compile { .. } => "compile-diagnostics",
            Self::Emit { .. } => "emit-failure",
            Self::Instantiation { .. } => "plugin-instantiation",
            Self::Generator(_) => "generator-diagnostics",
            Self::Execution(ExecutionError::Exception { .. }) => "execution-runtime",
            Self::Execution(_) => "execution-shape",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<genplay_core::Cancelled> for StageError {
    fn from(_: genplay_core::Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<ReferenceError> for StageError {
    fn from(error: ReferenceError) -> Self {
        match error {
            ReferenceError::Cancelled(_) => Self::Cancelled,
            other => Self::References(other),
        }
    }
}

impl From<ExecutionError> for StageError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::Cancelled => Self::Cancelled,
            other => Self::Execution(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genplay_core::{DiagnosticCode, Location};
    use genplay_runtime::{ExceptionInfo, StackFrame};

    #[test]
    fn test_input_missing_text() {
        assert_eq!(
            StageError::InputMissing(Artifact::Generator).to_string(),
            "Cannot run yet, need more input for the generator code."
        );
        assert_eq!(
            StageError::InputMissing(Artifact::Program).to_string(),
            "Cannot run yet, need more input for the program code."
        );
    }

    #[test]
    fn test_compile_text_lists_diagnostics() {
        let err = StageError::Compile {
            stage: Artifact::Program,
            diagnostics: vec![
                Diagnostic::from_code(DiagnosticCode::UnknownName, "The name 'x' does not exist in the current context")
                    .at(Location::new("Program.gen", 3, 9)),
                Diagnostic::from_code(DiagnosticCode::UnknownName, "The name 'y' does not exist in the current context")
                    .at(Location::new("Program.gen", 4, 13)),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Error(s) compiling program:\n\n\
             Program.gen(3,9): error E0201: The name 'x' does not exist in the current context\n\
             Program.gen(4,13): error E0201: The name 'y' does not exist in the current context"
        );
    }

    #[test]
    fn test_emit_texts() {
        let unknown = StageError::Emit {
            stage: Artifact::Generator,
            cause: None,
        };
        assert_eq!(unknown.to_string(), "Unknown error emitting generator.");
        let known = StageError::Emit {
            stage: Artifact::Program,
            cause: Some("boom".into()),
        };
        assert_eq!(known.to_string(), "Error emitting program:\n\nboom");
    }

    #[test]
    fn test_instantiation_lists_types() {
        let err = StageError::Instantiation {
            types: vec!["Helper".into(), "Other".into()],
        };
        assert_eq!(
            err.to_string(),
            "Could not instantiate source generator. Types in module:\n\nHelper\nOther"
        );
    }

    #[test]
    fn test_execution_keeps_partial_output() {
        let err = StageError::from(ExecutionError::Exception {
            output: "partial-line\n".into(),
            exception: ExceptionInfo {
                name: "Exception".into(),
                message: "bad".into(),
                trace: vec![StackFrame {
                    type_name: "Program".into(),
                    method: "Main".into(),
                    file: "Program.gen".into(),
                    line: 4,
                }],
            },
        });
        assert_eq!(
            err.to_string(),
            "partial-line\n\nError executing program:\n\nException: bad\n   at Program.Main() in Program.gen:line 4"
        );
        assert_eq!(err.kind(), "execution-runtime");
    }

    #[test]
    fn test_shape_error_text() {
        let err = StageError::from(ExecutionError::MainArity);
        assert_eq!(
            err.to_string(),
            "Error executing program:\n\nMethod \"Main\" must have 0 or 1 parameters."
        );
        assert!(matches!(StageError::from(ExecutionError::Cancelled), StageError::Cancelled));
    }
}
