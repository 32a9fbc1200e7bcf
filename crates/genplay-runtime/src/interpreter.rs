//! Tree-walking interpreter over lowered module bodies.
//!
//! An [`Interpreter`] executes code of exactly one [`LoadContext`]. Static
//! state, host objects and every value it creates belong to that context,
//! so dropping the interpreter together with the context ends the
//! generation.

use crate::builtins;
use crate::console;
use crate::context::LoadContext;
use crate::error::{ExceptionInfo, Fault, RuntimeError, StackFrame, CANCELLED};
use crate::natives::NativeRegistry;
use crate::ops;
use crate::value::{ClassId, Object, Value};
use genplay_compiler::ir::{BinaryOp, Expr, MethodDef, Place, Stmt, StmtKind, TypeRef};
use genplay_core::CancellationToken;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, trace};

/// Interpreter limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Nested calls allowed before `StackOverflowException` is raised.
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
        }
    }
}

/// Where `Console` output of interpreted code goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleMode {
    /// The process console sink, captured by the execution host.
    #[default]
    Sink,
    /// `tracing` events, one per line. Used for generator code so that it
    /// never interleaves with captured program output.
    Log,
}

#[derive(Debug)]
struct Thrown {
    value: Value,
    info: ExceptionInfo,
}

/// Non-local exit from user code.
#[derive(Debug)]
enum Unwind {
    Throw(Box<Thrown>),
    Cancelled,
}

type Exec<T> = Result<T, Unwind>;

enum Flow {
    Next,
    Return(Value),
    Break,
    Continue,
}

#[derive(Debug)]
struct Frame {
    module: u32,
    type_name: String,
    method: String,
    file: String,
    line: u32,
    locals: Vec<Value>,
    this: Option<Value>,
}

/// Executes user code of one load context.
pub struct Interpreter {
    context: Rc<LoadContext>,
    natives: Arc<NativeRegistry>,
    config: RuntimeConfig,
    console: ConsoleMode,
    cancel: CancellationToken,
    frames: Vec<Frame>,
    pending: Option<Unwind>,
    log_buffer: String,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("generation", &self.context.generation())
            .field("depth", &self.frames.len())
            .field("console", &self.console)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Create an interpreter for `context`.
    pub fn new(context: Rc<LoadContext>, natives: Arc<NativeRegistry>, config: RuntimeConfig) -> Self {
        Self {
            context,
            natives,
            config,
            console: ConsoleMode::Sink,
            cancel: CancellationToken::new(),
            frames: Vec::new(),
            pending: None,
            log_buffer: String::new(),
        }
    }

    /// Route console output.
    #[must_use]
    pub fn with_console(mut self, console: ConsoleMode) -> Self {
        self.console = console;
        self
    }

    /// Observe `cancel` at every call and loop iteration.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The load context being executed.
    pub const fn context(&self) -> &Rc<LoadContext> {
        &self.context
    }

    /// The cancellation token.
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Write console output of interpreted code.
    pub fn write_console(&mut self, text: &str) {
        match self.console {
            ConsoleMode::Sink => console::write(text),
            ConsoleMode::Log => {
                self.log_buffer.push_str(text);
                while let Some(end) = self.log_buffer.find('\n') {
                    let line: String = self.log_buffer.drain(..=end).collect();
                    info!(target: "genplay::generator", "{}", line.trim_end_matches(['\r', '\n']));
                }
            }
        }
    }

    /// Text of a value, calling a user `ToString` method when the class
    /// declares one.
    pub fn display(&mut self, value: &Value) -> Result<String, Fault> {
        let result = self.display_value(value);
        result.map_err(|unwind| self.park(unwind))
    }

    /// Create an instance of `class`, running field initializers and `init`.
    pub fn instantiate(&mut self, class: ClassId, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let result = self.construct(class, args);
        result.map_err(into_runtime)
    }

    /// Call a static method.
    pub fn invoke_static(
        &mut self,
        class: ClassId,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let result = self.call_static(class, method, args);
        result.map_err(into_runtime)
    }

    /// Call an instance method, dispatching on the receiver.
    pub fn invoke(&mut self, target: &Value, method: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let result = self.call_value(target, method, args);
        result.map_err(into_runtime)
    }

    // ------------------------------------------------------------------
    // Faults and exceptions
    // ------------------------------------------------------------------

    fn trace(&self) -> Vec<StackFrame> {
        self.frames
            .iter()
            .rev()
            .map(|frame| StackFrame {
                type_name: frame.type_name.clone(),
                method: frame.method.clone(),
                file: frame.file.clone(),
                line: frame.line,
            })
            .collect()
    }

    /// Turn a native fault into an exception thrown at the current frame.
    fn raise(&self, fault: Fault) -> Unwind {
        if fault.name == CANCELLED && self.cancel.is_cancelled() {
            return Unwind::Cancelled;
        }
        let value = self.fault_value(&fault);
        Unwind::Throw(Box::new(Thrown {
            value,
            info: ExceptionInfo {
                name: fault.name,
                message: fault.message,
                trace: self.trace(),
            },
        }))
    }

    /// Exception object handed to `catch` for a native fault.
    fn fault_value(&self, fault: &Fault) -> Value {
        match self.context.find_library_class("System", "Exception") {
            Some(class) => {
                let object = Object::new(class, Rc::from(fault.name.as_str()));
                object.define("Message", Value::str(fault.message.as_str()));
                Value::Object(Rc::new(object))
            }
            None => Value::str(fault.message.as_str()),
        }
    }

    /// Remember an unwind that has to cross native code, returning the
    /// fault native code sees in its place.
    fn park(&mut self, unwind: Unwind) -> Fault {
        let fault = match &unwind {
            Unwind::Throw(thrown) => Fault::new(thrown.info.name.clone(), thrown.info.message.clone()),
            Unwind::Cancelled => Fault::cancelled(),
        };
        self.pending = Some(unwind);
        fault
    }

    /// Result of native code; a parked unwind wins over the fault that
    /// carried it out.
    fn native_result(&mut self, result: Result<Value, Fault>) -> Exec<Value> {
        match result {
            Ok(value) => {
                self.pending = None;
                Ok(value)
            }
            Err(fault) => match self.pending.take() {
                Some(unwind) => Err(unwind),
                None => Err(self.raise(fault)),
            },
        }
    }

    fn check_cancelled(&self) -> Exec<()> {
        if self.cancel.is_cancelled() {
            Err(Unwind::Cancelled)
        } else {
            Ok(())
        }
    }

    fn throw_value(&mut self, value: Value) -> Unwind {
        if matches!(value, Value::Null) {
            return self.raise(Fault::null_reference());
        }
        let context = Rc::clone(&self.context);
        let exception = context.find_library_class("System", "Exception");
        let described = match (&value, exception) {
            (Value::Object(object), Some(base)) if context.is_subclass_of(object.class, base) => {
                let message = object.get("Message").unwrap_or_default();
                self.display_value(&message)
                    .map(|message| (object.class_name.to_string(), message))
            }
            _ => self
                .display_value(&value)
                .map(|message| ("Exception".to_string(), message)),
        };
        match described {
            Ok((name, message)) => Unwind::Throw(Box::new(Thrown {
                value,
                info: ExceptionInfo {
                    name,
                    message,
                    trace: self.trace(),
                },
            })),
            Err(unwind) => unwind,
        }
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    fn frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    fn current_module(&self) -> u32 {
        self.frame()
            .map_or_else(|| self.context.main_index(), |frame| frame.module)
    }

    fn local(&self, slot: u32) -> Value {
        self.frame()
            .and_then(|frame| frame.locals.get(slot as usize))
            .cloned()
            .unwrap_or_default()
    }

    fn set_local(&mut self, slot: u32, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            let slot = slot as usize;
            if frame.locals.len() <= slot {
                frame.locals.resize(slot + 1, Value::Null);
            }
            frame.locals[slot] = value;
        }
    }

    fn set_line(&mut self, line: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
        }
    }

    fn push_frame(&mut self, class: ClassId, method: &str, line: u32, this: Option<Value>, locals: Vec<Value>) {
        let def = self.context.class(class);
        self.frames.push(Frame {
            module: class.module,
            type_name: def.name.clone(),
            method: method.to_string(),
            file: def.file.clone(),
            line,
            locals,
            this,
        });
    }

    fn resolve(&self, ty: &TypeRef) -> Exec<ClassId> {
        self.context
            .resolve(self.current_module(), ty)
            .ok_or_else(|| {
                self.raise(Fault::new(
                    "TypeLoadException",
                    format!("Could not load type '{ty}'."),
                ))
            })
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn call(
        &mut self,
        declaring: ClassId,
        method: &MethodDef,
        this: Option<Value>,
        mut args: Vec<Value>,
    ) -> Exec<Value> {
        self.check_cancelled()?;
        if !method.accepts(args.len()) {
            return Err(self.raise(Fault::argument_count(&method.name, args.len())));
        }
        for param in &method.params[args.len()..] {
            args.push(param.default.as_ref().map(Value::from).unwrap_or_default());
        }

        let context = Rc::clone(&self.context);
        let type_name = &context.class(declaring).name;

        if method.is_extern {
            let Some(native) = self.natives.find(type_name, &method.name) else {
                return Err(self.raise(Fault::new(
                    "MissingMethodException",
                    format!("No native implementation is bound to '{type_name}.{}'.", method.name),
                )));
            };
            if let Some(this) = this {
                args.insert(0, this);
            }
            self.pending = None;
            let result = native(self, args);
            return self.native_result(result);
        }

        let Some(body) = &method.body else {
            return Err(self.raise(Fault::new(
                "MissingMethodException",
                format!("Method '{type_name}.{}' has no implementation.", method.name),
            )));
        };
        if self.frames.len() >= self.config.max_call_depth {
            return Err(self.raise(Fault::new(
                "StackOverflowException",
                "Operation caused a stack overflow.",
            )));
        }

        trace!(method = %format!("{type_name}.{}", method.name), depth = self.frames.len(), "call");
        let mut locals = args;
        let slots = (method.locals as usize).max(locals.len());
        locals.resize(slots, Value::Null);
        self.push_frame(declaring, &method.name, method.line, this, locals);
        let flow = self.exec_block(body);
        self.frames.pop();

        let value = match flow? {
            Flow::Return(value) => value,
            _ => Value::Null,
        };
        Ok(if method.is_async && !matches!(value, Value::Task(_)) {
            Value::Task(Rc::new(value))
        } else {
            value
        })
    }

    fn call_static(&mut self, class: ClassId, name: &str, args: Vec<Value>) -> Exec<Value> {
        let context = Rc::clone(&self.context);
        match context.find_method(class, name) {
            Some((declaring, method)) if method.is_static => self.call(declaring, method, None, args),
            _ => Err(self.raise(Fault::missing_member(&context.class(class).name, name))),
        }
    }

    fn call_value(&mut self, target: &Value, name: &str, args: Vec<Value>) -> Exec<Value> {
        match target {
            Value::Null => Err(self.raise(Fault::null_reference())),
            Value::Object(object) => {
                let context = Rc::clone(&self.context);
                match context.find_method(object.class, name) {
                    Some((declaring, method)) if !method.is_static => {
                        self.call(declaring, method, Some(target.clone()), args)
                    }
                    Some(_) => Err(self.raise(Fault::missing_member(&object.class_name, name))),
                    None => self.call_builtin(target, name, args),
                }
            }
            Value::Host(host) => {
                let host = Rc::clone(host);
                self.check_cancelled()?;
                self.pending = None;
                let result = host.call_method(self, name, args);
                self.native_result(result)
            }
            Value::Type(class, _) => self.call_static(*class, name, args),
            _ => self.call_builtin(target, name, args),
        }
    }

    fn call_builtin(&mut self, target: &Value, name: &str, args: Vec<Value>) -> Exec<Value> {
        self.pending = None;
        let result = builtins::call_method(self, target, name, args);
        self.native_result(result)
    }

    // ------------------------------------------------------------------
    // Objects and statics
    // ------------------------------------------------------------------

    fn construct(&mut self, class: ClassId, args: Vec<Value>) -> Exec<Value> {
        self.check_cancelled()?;
        let context = Rc::clone(&self.context);
        let def = context.class(class);
        if !def.is_activatable() {
            return Err(self.raise(Fault::invalid_operation(format!(
                "Cannot create an instance of '{}'.",
                def.name
            ))));
        }

        let object = Rc::new(Object::new(class, Rc::from(def.name.as_str())));
        let chain: Vec<ClassId> = context.ancestors(class).into_iter().rev().collect();
        for &id in &chain {
            for field in context.class(id).fields.iter().filter(|f| !f.is_static) {
                object.define(&field.name, Value::Null);
            }
        }
        let this = Value::Object(Rc::clone(&object));
        for &id in &chain {
            for field in context.class(id).fields.iter().filter(|f| !f.is_static) {
                if let Some(init) = &field.init {
                    self.push_frame(id, "init", field.line, Some(this.clone()), Vec::new());
                    let value = self.eval(init);
                    self.frames.pop();
                    object.define(&field.name, value?);
                }
            }
        }

        match context.find_method(class, "init") {
            Some((declaring, method)) if !method.is_static => {
                self.call(declaring, method, Some(this.clone()), args)?;
            }
            _ if !args.is_empty() => {
                return Err(self.raise(Fault::new(
                    "MissingMemberException",
                    format!(
                        "'{}' does not contain a constructor that takes {} arguments.",
                        def.name,
                        args.len()
                    ),
                )));
            }
            _ => {}
        }
        Ok(this)
    }

    /// Run static initializers of `class` once per generation.
    fn ensure_statics(&mut self, class: ClassId) -> Exec<()> {
        if self.context.statics().borrow().contains_key(&class) {
            return Ok(());
        }
        self.context.statics().borrow_mut().entry(class).or_default();

        let context = Rc::clone(&self.context);
        for field in context.class(class).fields.iter().filter(|f| f.is_static) {
            let value = match &field.init {
                Some(init) => {
                    self.push_frame(class, ".cctor", field.line, None, Vec::new());
                    let value = self.eval(init);
                    self.frames.pop();
                    value?
                }
                None => Value::Null,
            };
            context
                .statics()
                .borrow_mut()
                .entry(class)
                .or_default()
                .values
                .insert(field.name.clone(), value);
        }
        Ok(())
    }

    fn static_owner(&self, class: ClassId, name: &str) -> Option<ClassId> {
        self.context.ancestors(class).into_iter().find(|&id| {
            self.context
                .class(id)
                .find_field(name)
                .is_some_and(|field| field.is_static)
        })
    }

    fn read_static(&mut self, class: ClassId, name: &str) -> Exec<Value> {
        let Some(owner) = self.static_owner(class, name) else {
            return Err(self.raise(Fault::missing_member(&self.context.class(class).name, name)));
        };
        self.ensure_statics(owner)?;
        let value = self
            .context
            .statics()
            .borrow()
            .get(&owner)
            .and_then(|statics| statics.values.get(name).cloned())
            .unwrap_or_default();
        Ok(value)
    }

    fn write_static(&mut self, class: ClassId, name: &str, value: Value) -> Exec<()> {
        let Some(owner) = self.static_owner(class, name) else {
            return Err(self.raise(Fault::missing_member(&self.context.class(class).name, name)));
        };
        self.ensure_statics(owner)?;
        self.context
            .statics()
            .borrow_mut()
            .entry(owner)
            .or_default()
            .values
            .insert(name.to_string(), value);
        Ok(())
    }

    fn get_member(&mut self, target: &Value, name: &str) -> Exec<Value> {
        match target {
            Value::Null => Err(self.raise(Fault::null_reference())),
            Value::Object(object) => match object.get(name) {
                Some(value) => Ok(value),
                None => Err(self.raise(Fault::missing_member(&object.class_name, name))),
            },
            Value::Host(host) => {
                let result = host.get_member(name);
                result.map_err(|fault| self.raise(fault))
            }
            Value::Type(class, _) => self.read_static(*class, name),
            _ => builtins::get_member(target, name).map_err(|fault| self.raise(fault)),
        }
    }

    fn display_value(&mut self, value: &Value) -> Exec<String> {
        match value {
            Value::Object(object) => {
                let context = Rc::clone(&self.context);
                match context.find_method(object.class, "ToString") {
                    Some((declaring, method)) if !method.is_static && method.accepts(0) => {
                        let result = self.call(declaring, method, Some(value.clone()), Vec::new())?;
                        Ok(result.to_string())
                    }
                    _ => Ok(object.class_name.to_string()),
                }
            }
            Value::List(items) => {
                let snapshot = items.borrow().clone();
                let mut parts = Vec::with_capacity(snapshot.len());
                for item in &snapshot {
                    parts.push(self.display_value(item)?);
                }
                Ok(format!("[{}]", parts.join(", ")))
            }
            other => Ok(other.to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn exec_block(&mut self, stmts: &[Stmt]) -> Exec<Flow> {
        for stmt in stmts {
            match self.exec(stmt)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &Stmt) -> Exec<Flow> {
        self.set_line(stmt.line);
        match &stmt.kind {
            StmtKind::Local { slot, init } => {
                let value = match init {
                    Some(init) => self.eval(init)?,
                    None => Value::Null,
                };
                self.set_local(*slot, value);
            }
            StmtKind::Assign { place, value } => self.assign(place, value)?,
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let branch = if self.eval(cond)?.is_truthy() {
                    then_body
                } else {
                    else_body
                };
                return self.exec_block(branch);
            }
            StmtKind::While { cond, body } => loop {
                self.check_cancelled()?;
                self.set_line(stmt.line);
                if !self.eval(cond)?.is_truthy() {
                    break;
                }
                match self.exec_block(body)? {
                    Flow::Break => break,
                    flow @ Flow::Return(_) => return Ok(flow),
                    Flow::Next | Flow::Continue => {}
                }
            },
            StmtKind::ForEach {
                slot,
                iterable,
                body,
            } => {
                let iterable = self.eval(iterable)?;
                let items = match &iterable {
                    Value::List(items) => items.borrow().clone(),
                    Value::Str(text) => text.chars().map(|c| Value::str(c.to_string())).collect(),
                    Value::Null => return Err(self.raise(Fault::null_reference())),
                    other => {
                        return Err(self.raise(Fault::invalid_operation(format!(
                            "foreach cannot operate on a value of type '{}'.",
                            other.type_name()
                        ))))
                    }
                };
                for item in items {
                    self.check_cancelled()?;
                    self.set_local(*slot, item);
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                        Flow::Next | Flow::Continue => {}
                    }
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Throw(expr) => {
                let value = self.eval(expr)?;
                return Err(self.throw_value(value));
            }
            StmtKind::Try {
                body,
                slot,
                handler,
            } => {
                let depth = self.frames.len();
                return match self.exec_block(body) {
                    Err(Unwind::Throw(thrown)) => {
                        self.frames.truncate(depth);
                        if let Some(slot) = slot {
                            self.set_local(*slot, thrown.value);
                        }
                        self.exec_block(handler)
                    }
                    other => other,
                };
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Block(stmts) => return self.exec_block(stmts),
        }
        Ok(Flow::Next)
    }

    fn assign(&mut self, place: &Place, value: &Expr) -> Exec<()> {
        match place {
            Place::Local(slot) => {
                let value = self.eval(value)?;
                self.set_local(*slot, value);
            }
            Place::Field { target, name } => {
                let target = self.eval(target)?;
                let value = self.eval(value)?;
                match &target {
                    Value::Null => return Err(self.raise(Fault::null_reference())),
                    Value::Object(object) => {
                        if !object.set(name, value) {
                            return Err(self.raise(Fault::missing_member(&object.class_name, name)));
                        }
                    }
                    Value::Type(class, _) => self.write_static(*class, name, value)?,
                    other => {
                        return Err(self.raise(Fault::invalid_operation(format!(
                            "Cannot assign to member '{name}' of a value of type '{}'.",
                            other.type_name()
                        ))))
                    }
                }
            }
            Place::StaticField { owner, name } => {
                let class = self.resolve(owner)?;
                let value = self.eval(value)?;
                self.write_static(class, name, value)?;
            }
            Place::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                let value = self.eval(value)?;
                ops::set_index(&target, &index, value).map_err(|fault| self.raise(fault))?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval_all(&mut self, exprs: &[Expr]) -> Exec<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn eval(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Const(constant) => Ok(Value::from(constant)),
            Expr::Local(slot) => Ok(self.local(*slot)),
            Expr::SelfRef => Ok(self.frame().and_then(|f| f.this.clone()).unwrap_or_default()),
            Expr::Type(ty) => {
                let class = self.resolve(ty)?;
                Ok(Value::Type(class, Rc::from(ty.name.as_str())))
            }
            Expr::List(items) => Ok(Value::list(self.eval_all(items)?)),
            Expr::New { ty, args } => {
                let class = self.resolve(ty)?;
                let args = self.eval_all(args)?;
                self.construct(class, args)
            }
            Expr::Field { target, name } => {
                let target = self.eval(target)?;
                self.get_member(&target, name)
            }
            Expr::StaticField { owner, name } => {
                let class = self.resolve(owner)?;
                self.read_static(class, name)
            }
            Expr::Call {
                target,
                method,
                args,
            } => {
                let target = self.eval(target)?;
                let args = self.eval_all(args)?;
                self.call_value(&target, method, args)
            }
            Expr::StaticCall {
                owner,
                method,
                args,
            } => {
                let class = self.resolve(owner)?;
                let args = self.eval_all(args)?;
                self.call_static(class, method, args)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                ops::index(&target, &index).map_err(|fault| self.raise(fault))
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                ops::unary(*op, &operand).map_err(|fault| self.raise(fault))
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
            Expr::Await(inner) => match self.eval(inner)? {
                Value::Task(result) => Ok((*result).clone()),
                other => Ok(other),
            },
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Exec<Value> {
        let left = self.eval(lhs)?;
        match op {
            BinaryOp::And if !left.is_truthy() => return Ok(Value::Bool(false)),
            BinaryOp::Or if left.is_truthy() => return Ok(Value::Bool(true)),
            _ => {}
        }
        let right = self.eval(rhs)?;
        if op == BinaryOp::Add && (matches!(left, Value::Str(_)) || matches!(right, Value::Str(_))) {
            let mut text = self.display_value(&left)?;
            text.push_str(&self.display_value(&right)?);
            return Ok(Value::str(text));
        }
        ops::binary(op, &left, &right).map_err(|fault| self.raise(fault))
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        if self.console == ConsoleMode::Log && !self.log_buffer.is_empty() {
            info!(target: "genplay::generator", "{}", self.log_buffer);
        }
    }
}

fn into_runtime(unwind: Unwind) -> RuntimeError {
    match unwind {
        Unwind::Throw(thrown) => RuntimeError::Exception(thrown.info),
        Unwind::Cancelled => RuntimeError::Cancelled,
    }
}
