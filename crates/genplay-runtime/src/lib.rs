//! Gen runtime: isolated load contexts, the interpreter and the execution
//! host.
//!
//! Every execution loads its module into a new [`LoadContext`]. The context
//! owns the module, the reference libraries' images and all static state, so
//! a later run can never observe values left behind by an earlier one.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`LoadContext`] | One generation of loaded code and its statics |
//! | [`Interpreter`] | Executes lowered bodies, raises exceptions with stack traces |
//! | [`NativeRegistry`] | `extern` method bindings (`Console`, `Convert`, `Tasks`) |
//! | [`ConsoleCapture`] | Serialized redirection of the process console sink |
//! | [`ExecutionHost`] | Finds `Program.Main`, runs it, returns the captured output |
//!
//! # Example
//!
//! ```
//! use genplay_compiler::{Compilation, CompileOptions, ReferenceSetProvider};
//! use genplay_core::{CancellationToken, SourceUnit};
//! use genplay_runtime::ExecutionHost;
//!
//! let cancel = CancellationToken::new();
//! let references = ReferenceSetProvider::bundled().get_or_resolve(&cancel).unwrap();
//! let compilation = Compilation::create(
//!     "Program",
//!     vec![SourceUnit::new(
//!         "Program.gen",
//!         "type Program { static fn Main() { Console.WriteLine(\"hi\"); } }",
//!     )],
//!     references.clone(),
//!     CompileOptions::executable(),
//!     &cancel,
//! )
//! .unwrap();
//!
//! let output = ExecutionHost::default()
//!     .execute(&compilation.emit().unwrap(), &references)
//!     .unwrap();
//! assert_eq!(output, "hi\n");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builtins;
pub mod console;
pub mod context;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod natives;
mod ops;
pub mod value;

pub use console::ConsoleCapture;
pub use context::LoadContext;
pub use error::{ExceptionInfo, Fault, LoadError, RuntimeError, StackFrame};
pub use host::{EntryPoint, ExecutionError, ExecutionHost, NO_OUTPUT};
pub use interpreter::{ConsoleMode, Interpreter, RuntimeConfig};
pub use natives::{NativeFn, NativeRegistry};
pub use value::{ClassId, HostObject, Object, Value};
