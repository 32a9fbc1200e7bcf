//! Runtime errors and exception descriptions.

use genplay_compiler::DecodeError;
use genplay_core::LibraryIdentity;
use std::fmt;
use thiserror::Error;

/// Errors loading a module into a [`LoadContext`](crate::LoadContext).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The bytes are not a module image.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The module was compiled against a library that is not available.
    #[error("module '{module}' references library '{library}' which is not loaded")]
    MissingLibrary {
        /// Module being loaded.
        module: String,
        /// Missing library.
        library: LibraryIdentity,
    },
}

/// Exception name used for cancellation observed inside native code.
pub(crate) const CANCELLED: &str = "OperationCanceledException";

/// A fault raised by native code, before a stack trace is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Exception type name, e.g. `NullReferenceException`.
    pub name: String,
    /// Message.
    pub message: String,
}

impl Fault {
    /// Create a fault.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Member access on `null`.
    pub fn null_reference() -> Self {
        Self::new(
            "NullReferenceException",
            "Object reference not set to an instance of an object.",
        )
    }

    /// A member that does not exist on the receiver.
    pub fn missing_member(type_name: &str, member: &str) -> Self {
        Self::new(
            "MissingMemberException",
            format!("'{type_name}' does not contain a member named '{member}'."),
        )
    }

    /// A call with the wrong number of arguments.
    pub fn argument_count(method: &str, count: usize) -> Self {
        Self::new(
            "MissingMemberException",
            format!("No overload for method '{method}' takes {count} arguments."),
        )
    }

    /// An operation that is not valid for the operands.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new("InvalidOperationException", message)
    }

    /// An invalid argument.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new("ArgumentException", message)
    }

    /// An index past the end of a list or string.
    pub fn index_out_of_range() -> Self {
        Self::new(
            "IndexOutOfRangeException",
            "Index was outside the bounds of the array.",
        )
    }

    /// Integer division by zero.
    pub fn divide_by_zero() -> Self {
        Self::new("DivideByZeroException", "Attempted to divide by zero.")
    }

    /// The run was cancelled while native code was waiting on user code.
    pub fn cancelled() -> Self {
        Self::new(CANCELLED, "The operation was canceled.")
    }

    /// Text that is not a number.
    pub fn format(message: impl Into<String>) -> Self {
        Self::new("FormatException", message)
    }
}

/// One frame of an exception's stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Declaring type.
    pub type_name: String,
    /// Method name.
    pub method: String,
    /// Source file.
    pub file: String,
    /// Line of the executing statement.
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "   at {}.{}() in {}:line {}",
            self.type_name, self.method, self.file, self.line
        )
    }
}

/// An exception that escaped user code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Exception type name.
    pub name: String,
    /// Message.
    pub message: String,
    /// Active frames, innermost first.
    pub trace: Vec<StackFrame>,
}

impl ExceptionInfo {
    /// `Name: message` followed by the stack trace.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)?;
        for frame in &self.trace {
            write!(f, "\n{frame}")?;
        }
        Ok(())
    }
}

/// Why a call into user code did not complete.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// An exception escaped.
    #[error("{0}")]
    Exception(ExceptionInfo),
    /// The run was cancelled.
    #[error("execution was cancelled")]
    Cancelled,
}
