//! Native implementations of `extern` methods.

use crate::error::Fault;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Signature of a native method. Instance methods receive the receiver as
/// the first argument.
pub type NativeFn = fn(&mut Interpreter, Vec<Value>) -> Result<Value, Fault>;

/// Native methods keyed by declaring type and method name.
#[derive(Clone)]
pub struct NativeRegistry {
    methods: HashMap<(String, String), NativeFn>,
}

impl fmt::Debug for NativeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .methods
            .keys()
            .map(|(ty, m)| format!("{ty}.{m}"))
            .collect();
        keys.sort();
        f.debug_struct("NativeRegistry").field("methods", &keys).finish()
    }
}

impl NativeRegistry {
    /// Registry holding the `System` library natives.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("Console", "WriteLine", console_write_line);
        registry.register("Console", "Write", console_write);
        registry.register("Convert", "ToString", convert_to_string);
        registry.register("Convert", "ToInt", convert_to_int);
        registry.register("Tasks", "FromResult", tasks_from_result);
        registry
    }

    /// Registry without any natives.
    pub fn empty() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Bind `type_name.method` to `native`, replacing any earlier binding.
    pub fn register(&mut self, type_name: &str, method: &str, native: NativeFn) {
        self.methods
            .insert((type_name.to_string(), method.to_string()), native);
    }

    /// Look up a native.
    pub fn find(&self, type_name: &str, method: &str) -> Option<NativeFn> {
        self.methods
            .get(&(type_name.to_string(), method.to_string()))
            .copied()
    }

    /// Number of registered natives.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn first(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or_default()
}

fn console_write_line(interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let mut text = interpreter.display(&first(args))?;
    text.push('\n');
    interpreter.write_console(&text);
    Ok(Value::Null)
}

fn console_write(interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    let text = interpreter.display(&first(args))?;
    interpreter.write_console(&text);
    Ok(Value::Null)
}

fn convert_to_string(interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::str(interpreter.display(&first(args))?))
}

fn convert_to_int(_: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    match first(args) {
        Value::Null => Ok(Value::Int(0)),
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Str(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Fault::format("Input string was not in a correct format.")),
        other => Err(Fault::new(
            "InvalidCastException",
            format!("Unable to cast object of type '{}' to 'Int'.", other.type_name()),
        )),
    }
}

fn tasks_from_result(_: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Task(Rc::new(first(args))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_natives_registered() {
        let registry = NativeRegistry::new();
        assert_eq!(registry.len(), 5);
        assert!(registry.find("Console", "WriteLine").is_some());
        assert!(registry.find("Console", "Beep").is_none());
        assert!(NativeRegistry::empty().is_empty());
    }

    #[test]
    fn test_register_replaces() {
        fn nothing(_: &mut Interpreter, _: Vec<Value>) -> Result<Value, Fault> {
            Ok(Value::Null)
        }
        let mut registry = NativeRegistry::new();
        registry.register("Console", "WriteLine", nothing);
        assert_eq!(registry.len(), 5);
    }
}
