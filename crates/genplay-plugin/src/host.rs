//! Host objects handed to generator code.
//!
//! `context` in `Execute(context)` is a [`GeneratorContextObject`]; its
//! `Compilation` property exposes the program's semantic model through
//! read-only view objects.

use genplay_compiler::model::{MethodSymbol, ParamSymbol};
use genplay_compiler::{InvocationInfo, SemanticModel};
use genplay_core::{Diagnostic, Severity, SourceUnit};
use genplay_runtime::{Fault, HostObject, Interpreter, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

/// What one generator produced.
#[derive(Debug, Default)]
pub struct GeneratorOutput {
    /// Added source units, in the order they were added.
    pub sources: Vec<SourceUnit>,
    /// Reported diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    pub(crate) hints: HashSet<String>,
}

fn views<T, F>(items: impl IntoIterator<Item = T>, f: F) -> Value
where
    F: Fn(T) -> Value,
{
    Value::list(items.into_iter().map(f).collect())
}

fn expect_args(method: &str, args: &[Value], count: usize) -> Result<(), Fault> {
    if args.len() == count {
        Ok(())
    } else {
        Err(Fault::argument_count(method, args.len()))
    }
}

/// The `context` argument of `Generator.Execute`.
#[derive(Debug)]
pub struct GeneratorContextObject {
    generator: String,
    model: Arc<SemanticModel>,
    output: Rc<RefCell<GeneratorOutput>>,
}

impl GeneratorContextObject {
    /// Context for the generator type `generator`, collecting into `output`.
    pub fn new(
        generator: impl Into<String>,
        model: Arc<SemanticModel>,
        output: Rc<RefCell<GeneratorOutput>>,
    ) -> Self {
        Self {
            generator: generator.into(),
            model,
            output,
        }
    }

    fn add_source(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, Fault> {
        expect_args("AddSource", args, 2)?;
        let hint = interpreter.display(&args[0])?;
        if hint.trim().is_empty() {
            return Err(Fault::argument("The hintName of 'AddSource' must not be empty."));
        }
        let text = interpreter.display(&args[1])?;
        let mut output = self.output.borrow_mut();
        if !output.hints.insert(hint.clone()) {
            return Err(Fault::argument(format!(
                "The hintName '{hint}' of 'AddSource' must be unique within a generator."
            )));
        }
        let file = if hint.contains('.') {
            hint
        } else {
            format!("{hint}.gen")
        };
        output
            .sources
            .push(SourceUnit::new(format!("{}/{file}", self.generator), text));
        Ok(Value::Null)
    }

    fn report_diagnostic(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, Fault> {
        expect_args("ReportDiagnostic", args, 3)?;
        let severity = interpreter
            .display(&args[0])?
            .parse::<Severity>()
            .map_err(|e| Fault::argument(e.to_string()))?;
        let id = interpreter.display(&args[1])?;
        let message = interpreter.display(&args[2])?;
        self.output
            .borrow_mut()
            .diagnostics
            .push(Diagnostic::new(severity, id, message));
        Ok(Value::Null)
    }
}

impl HostObject for GeneratorContextObject {
    fn type_name(&self) -> &str {
        "GeneratorContext"
    }

    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        match name {
            "Compilation" => Ok(Value::host(CompilationView {
                model: Arc::clone(&self.model),
            })),
            _ => Err(Fault::missing_member(self.type_name(), name)),
        }
    }

    fn call_method(&self, interpreter: &mut Interpreter, name: &str, args: Vec<Value>) -> Result<Value, Fault> {
        match name {
            "AddSource" => self.add_source(interpreter, &args),
            "ReportDiagnostic" => self.report_diagnostic(interpreter, &args),
            "IsCancellationRequested" => {
                expect_args(name, &args, 0)?;
                Ok(Value::Bool(interpreter.cancellation().is_cancelled()))
            }
            _ => Err(Fault::missing_member(self.type_name(), name)),
        }
    }
}

/// `context.Compilation`.
#[derive(Debug)]
pub struct CompilationView {
    model: Arc<SemanticModel>,
}

impl CompilationView {
    fn type_view(&self, name: &str) -> Value {
        Value::host(TypeView {
            model: Arc::clone(&self.model),
            name: name.to_string(),
        })
    }
}

impl HostObject for CompilationView {
    fn type_name(&self) -> &str {
        "Compilation"
    }

    fn call_method(&self, interpreter: &mut Interpreter, name: &str, args: Vec<Value>) -> Result<Value, Fault> {
        match name {
            "Types" => {
                expect_args(name, &args, 0)?;
                Ok(views(self.model.types(), |t| self.type_view(&t.name)))
            }
            "GetType" => {
                expect_args(name, &args, 1)?;
                let wanted = interpreter.display(&args[0])?;
                Ok(match self.model.get_type(&wanted) {
                    Some(symbol) => self.type_view(&symbol.name),
                    None => Value::Null,
                })
            }
            "Implementations" => {
                expect_args(name, &args, 1)?;
                let capability = interpreter.display(&args[0])?;
                Ok(views(self.model.implementations(&capability), |t| {
                    self.type_view(&t.name)
                }))
            }
            "Invocations" => {
                expect_args(name, &args, 0)?;
                Ok(views(self.model.invocations(), |i| {
                    Value::host(InvocationView(i.clone()))
                }))
            }
            "SourceFiles" => {
                expect_args(name, &args, 0)?;
                Ok(views(self.model.source_files(), |unit| {
                    Value::host(SourceFileView(unit.clone()))
                }))
            }
            _ => Err(Fault::missing_member(self.type_name(), name)),
        }
    }
}

/// A type of the program or of a referenced library.
#[derive(Debug)]
pub struct TypeView {
    model: Arc<SemanticModel>,
    name: String,
}

impl HostObject for TypeView {
    fn type_name(&self) -> &str {
        "TypeInfo"
    }

    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        let Some(symbol) = self.model.get_type(&self.name) else {
            return Err(Fault::invalid_operation(format!(
                "Type '{}' is no longer available.",
                self.name
            )));
        };
        Ok(match name {
            "Name" => Value::str(symbol.name.as_str()),
            "IsAbstract" => Value::Bool(symbol.is_abstract),
            "IsCapability" => Value::Bool(symbol.is_capability()),
            "IsStatic" => Value::Bool(symbol.is_static),
            "Library" => Value::opt_str(symbol.library.as_ref().map(|l| l.as_str())),
            "Bases" => views(&symbol.bases, |b| Value::str(b.as_str())),
            "Methods" => views(&symbol.methods, |m| Value::host(MethodView(m.clone()))),
            "Fields" => views(&symbol.fields, |f| Value::str(f.name.as_str())),
            "ConstructorParameters" => match self.model.symbols().constructor(&symbol.name) {
                Some(ctor) => views(&ctor.params, |p| Value::host(ParameterView(p.clone()))),
                None => Value::list(Vec::new()),
            },
            _ => return Err(Fault::missing_member(self.type_name(), name)),
        })
    }

    fn call_method(&self, _: &mut Interpreter, name: &str, args: Vec<Value>) -> Result<Value, Fault> {
        match name {
            "ToString" if args.is_empty() => Ok(Value::str(self.name.as_str())),
            _ => Err(Fault::missing_member(self.type_name(), name)),
        }
    }
}

/// A method of a type view.
#[derive(Debug)]
pub struct MethodView(MethodSymbol);

impl HostObject for MethodView {
    fn type_name(&self) -> &str {
        "MethodInfo"
    }

    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        Ok(match name {
            "Name" => Value::str(self.0.name.as_str()),
            "IsStatic" => Value::Bool(self.0.is_static),
            "IsAsync" => Value::Bool(self.0.is_async),
            "Parameters" => views(&self.0.params, |p| Value::host(ParameterView(p.clone()))),
            "ReturnType" => Value::opt_str(self.0.return_type.as_deref()),
            _ => return Err(Fault::missing_member(self.type_name(), name)),
        })
    }

    fn call_method(&self, _: &mut Interpreter, name: &str, _: Vec<Value>) -> Result<Value, Fault> {
        Err(Fault::missing_member(self.type_name(), name))
    }
}

/// A parameter of a method or constructor.
#[derive(Debug)]
pub struct ParameterView(ParamSymbol);

impl HostObject for ParameterView {
    fn type_name(&self) -> &str {
        "ParameterInfo"
    }

    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        match name {
            "Name" => Ok(Value::str(self.0.name.as_str())),
            "Type" => Ok(Value::opt_str(self.0.ty.as_deref())),
            "HasDefault" => Ok(Value::Bool(self.0.has_default)),
            _ => Err(Fault::missing_member(self.type_name(), name)),
        }
    }

    fn call_method(&self, _: &mut Interpreter, name: &str, _: Vec<Value>) -> Result<Value, Fault> {
        Err(Fault::missing_member(self.type_name(), name))
    }
}

/// A method call observed in the program.
#[derive(Debug)]
pub struct InvocationView(InvocationInfo);

impl HostObject for InvocationView {
    fn type_name(&self) -> &str {
        "InvocationInfo"
    }

    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        Ok(match name {
            "Type" => Value::opt_str(self.0.type_name.as_deref()),
            "Method" => Value::str(self.0.method.as_str()),
            "Arguments" => views(&self.0.arguments, |a| a.as_ref().map(Value::from).unwrap_or_default()),
            "Caller" => Value::str(self.0.caller.as_str()),
            "File" => Value::str(self.0.file.as_str()),
            "Line" => Value::Int(i64::from(self.0.line)),
            _ => return Err(Fault::missing_member(self.type_name(), name)),
        })
    }

    fn call_method(&self, _: &mut Interpreter, name: &str, _: Vec<Value>) -> Result<Value, Fault> {
        Err(Fault::missing_member(self.type_name(), name))
    }
}

/// A source file of the program.
#[derive(Debug)]
pub struct SourceFileView(SourceUnit);

impl HostObject for SourceFileView {
    fn type_name(&self) -> &str {
        "SourceFile"
    }

    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        match name {
            "Name" => Ok(Value::str(self.0.name.as_str())),
            "Text" => Ok(Value::str(&*self.0.text)),
            _ => Err(Fault::missing_member(self.type_name(), name)),
        }
    }

    fn call_method(&self, _: &mut Interpreter, name: &str, _: Vec<Value>) -> Result<Value, Fault> {
        Err(Fault::missing_member(self.type_name(), name))
    }
}
