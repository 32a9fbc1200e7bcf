//! The execution host: load, locate `Program.Main`, run with captured
//! output, unload.

use crate::console::ConsoleCapture;
use crate::context::LoadContext;
use crate::error::{ExceptionInfo, LoadError, RuntimeError};
use crate::interpreter::{Interpreter, RuntimeConfig};
use crate::natives::NativeRegistry;
use crate::value::{ClassId, Value};
use genplay_compiler::ir::ReturnShape;
use genplay_compiler::ReferenceSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Output reported when a program wrote nothing.
pub const NO_OUTPUT: &str = "< No program output >";

/// Stack reserved for the thread running user code.
const EXECUTION_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Why a program could not be executed to completion.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The module could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// No `Program` type.
    #[error("Could not find type \"Program\" in program.")]
    ProgramNotFound,
    /// `Program` has no static `Main`.
    #[error("Could not find static method \"Main\" in program.")]
    MainNotFound,
    /// `Main` takes more than one parameter.
    #[error("Method \"Main\" must have 0 or 1 parameters.")]
    MainArity,
    /// `Main` returns a value.
    #[error("Method \"Main\" must have void or awaitable return type.")]
    MainReturnShape,
    /// An exception escaped `Main`.
    #[error("{exception}")]
    Exception {
        /// Output written before the exception.
        output: String,
        /// The exception.
        exception: ExceptionInfo,
    },
    /// The run was cancelled.
    #[error("execution was cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Output captured before the failure, if any was produced.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Self::Exception { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

/// The validated `Program.Main` of a loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// The `Program` class.
    pub class: ClassId,
    /// `Main` declares one parameter and receives `null`.
    pub takes_argument: bool,
    /// `Main` is awaitable.
    pub awaitable: bool,
}

impl EntryPoint {
    /// Locate and validate the entry point of the loaded module.
    pub fn find(context: &LoadContext) -> Result<Self, ExecutionError> {
        let class = context
            .find_class("Program")
            .ok_or(ExecutionError::ProgramNotFound)?;
        let main = context
            .class(class)
            .methods
            .iter()
            .find(|m| m.name == "Main" && m.is_static)
            .ok_or(ExecutionError::MainNotFound)?;
        if main.params.len() > 1 {
            return Err(ExecutionError::MainArity);
        }
        let awaitable = match main.shape {
            ReturnShape::Void => false,
            ReturnShape::Awaitable => true,
            ReturnShape::Value => return Err(ExecutionError::MainReturnShape),
        };
        Ok(Self {
            class,
            takes_argument: main.params.len() == 1,
            awaitable,
        })
    }
}

/// Runs compiled executables in fresh load contexts.
#[derive(Debug, Clone, Default)]
pub struct ExecutionHost {
    natives: Arc<NativeRegistry>,
    config: RuntimeConfig,
}

impl ExecutionHost {
    /// Host with the `System` natives and the given limits.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            natives: Arc::new(NativeRegistry::new()),
            config,
        }
    }

    /// Use a different native registry.
    #[must_use]
    pub fn with_natives(mut self, natives: Arc<NativeRegistry>) -> Self {
        self.natives = natives;
        self
    }

    /// Execute the module in `bytes`, returning its console output.
    ///
    /// The module is loaded into a new generation that is released before
    /// this returns. Console output is captured for the duration of the
    /// call; concurrent executions wait for each other.
    pub fn execute(&self, bytes: &[u8], references: &ReferenceSet) -> Result<String, ExecutionError> {
        std::thread::scope(|scope| {
            let spawned = std::thread::Builder::new()
                .name("genplay-exec".into())
                .stack_size(EXECUTION_STACK_SIZE)
                .spawn_scoped(scope, || self.execute_here(bytes, references));
            match spawned {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                Err(err) => {
                    warn!(error = %err, "could not spawn execution thread, running inline");
                    self.execute_here(bytes, references)
                }
            }
        })
    }

    fn execute_here(&self, bytes: &[u8], references: &ReferenceSet) -> Result<String, ExecutionError> {
        let started = Instant::now();
        let context = LoadContext::load_bytes(bytes, references)?;
        let generation = context.generation();
        let entry = EntryPoint::find(&context)?;
        let released = Rc::downgrade(&context);

        let capture = ConsoleCapture::begin();
        let result = {
            let mut interpreter = Interpreter::new(context, Arc::clone(&self.natives), self.config);
            let args = if entry.takes_argument {
                vec![Value::Null]
            } else {
                Vec::new()
            };
            interpreter
                .invoke_static(entry.class, "Main", args)
                .map(|_| ())
        };
        let output = capture.take();
        drop(capture);

        debug!(
            generation,
            released = released.upgrade().is_none(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "unloaded load context"
        );

        match result {
            Ok(()) if output.is_empty() => Ok(NO_OUTPUT.to_string()),
            Ok(()) => Ok(output),
            Err(RuntimeError::Exception(exception)) => {
                info!(generation, exception = %exception.name, "program threw");
                Err(ExecutionError::Exception { output, exception })
            }
            Err(RuntimeError::Cancelled) => Err(ExecutionError::Cancelled),
        }
    }
}
