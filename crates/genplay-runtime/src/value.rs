//! Runtime values.

use crate::error::Fault;
use crate::interpreter::Interpreter;
use genplay_compiler::ir::Const;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A loaded class: module index and type index inside that module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId {
    /// Module index in the load context.
    pub module: u32,
    /// Type index in the module.
    pub index: u32,
}

/// An instance of a user or library class.
#[derive(Debug)]
pub struct Object {
    /// Runtime class.
    pub class: ClassId,
    /// Class name, kept for display.
    pub class_name: Rc<str>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Object {
    pub(crate) fn new(class: ClassId, class_name: Rc<str>) -> Self {
        Self {
            class,
            class_name,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Read a field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    /// Write a field; returns false if the object has no such field.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.fields.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn define(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

/// An object implemented by the host, such as a generator context.
///
/// Host objects live only inside one interpreter generation.
pub trait HostObject: fmt::Debug {
    /// Type name shown to user code.
    fn type_name(&self) -> &str;

    /// Read a property.
    fn get_member(&self, name: &str) -> Result<Value, Fault> {
        Err(Fault::missing_member(self.type_name(), name))
    }

    /// Invoke a method.
    fn call_method(
        &self,
        interpreter: &mut Interpreter,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, Fault>;
}

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// `null`
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Immutable string.
    Str(Rc<str>),
    /// Mutable, shared list.
    List(Rc<RefCell<Vec<Value>>>),
    /// Class instance.
    Object(Rc<Object>),
    /// A class used as a value.
    Type(ClassId, Rc<str>),
    /// Completed task from an `async` method or `Tasks.FromResult`.
    Task(Rc<Value>),
    /// Host-provided object.
    Host(Rc<dyn HostObject>),
}

impl Value {
    /// A string value.
    pub fn str(text: impl Into<Rc<str>>) -> Self {
        Self::Str(text.into())
    }

    /// A list value.
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    /// A host object value.
    pub fn host(object: impl HostObject + 'static) -> Self {
        Self::Host(Rc::new(object))
    }

    /// Convert an optional string, mapping `None` to `null`.
    pub fn opt_str(text: Option<&str>) -> Self {
        text.map_or(Self::Null, Self::str)
    }

    /// Name of the value's type as shown in messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "Bool".into(),
            Self::Int(_) => "Int".into(),
            Self::Float(_) => "Float".into(),
            Self::Str(_) => "String".into(),
            Self::List(_) => "List".into(),
            Self::Object(object) => object.class_name.to_string(),
            Self::Type(_, name) => format!("Type<{name}>"),
            Self::Task(_) => "Task".into(),
            Self::Host(host) => host.type_name().to_string(),
        }
    }

    /// Truthiness: `null`, `false`, `0`, `0.0` and `""` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Language equality: numeric across int/float, by value for strings,
    /// by identity for lists, objects and host objects.
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Type(a, _), Self::Type(b, _)) => a == b,
            (Self::Task(a), Self::Task(b)) => Rc::ptr_eq(a, b),
            (Self::Host(a), Self::Host(b)) => {
                std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
            }
            _ => false,
        }
    }
}

impl From<&Const> for Value {
    fn from(constant: &Const) -> Self {
        match constant {
            Const::Null => Self::Null,
            Const::Bool(b) => Self::Bool(*b),
            Const::Int(n) => Self::Int(*n),
            Const::Float(f) => Self::Float(*f),
            Const::Str(s) => Self::str(s.as_str()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::str(s)
    }
}

/// Display without calling user `ToString` methods.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(object) => f.write_str(&object.class_name),
            Self::Type(_, name) => f.write_str(name),
            Self::Task(_) => f.write_str("Task"),
            Self::Host(host) => f.write_str(host.type_name()),
        }
    }
}
