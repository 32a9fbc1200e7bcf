//! Members of built-in values: strings, lists and tasks.

use crate::error::Fault;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::ops::Range;

fn expect_args(method: &str, args: &[Value], min: usize, max: usize) -> Result<(), Fault> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(Fault::argument_count(method, args.len()))
    }
}

fn str_arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a str, Fault> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        Fault::argument(format!(
            "Argument {} of '{method}' must be a String.",
            index + 1
        ))
    })
}

fn int_arg(method: &str, args: &[Value], index: usize) -> Result<i64, Fault> {
    args.get(index).and_then(Value::as_int).ok_or_else(|| {
        Fault::argument(format!("Argument {} of '{method}' must be an Int.", index + 1))
    })
}

/// `start..start + length` within `len` characters, or `None` when any
/// part is negative or out of bounds. A missing length runs to the end.
fn char_range(len: usize, start: i64, length: Option<i64>) -> Option<Range<usize>> {
    let start = usize::try_from(start).ok().filter(|&start| start <= len)?;
    let end = match length {
        Some(length) => start.checked_add(usize::try_from(length).ok()?)?,
        None => len,
    };
    (end <= len).then_some(start..end)
}

fn char_index(text: &str, byte: usize) -> i64 {
    text[..byte].chars().count() as i64
}

/// Read a property of a built-in value.
pub(crate) fn get_member(target: &Value, name: &str) -> Result<Value, Fault> {
    match (target, name) {
        (Value::Str(text), "Length") => Ok(Value::Int(text.chars().count() as i64)),
        (Value::List(items), "Count") => Ok(Value::Int(items.borrow().len() as i64)),
        (Value::Task(result), "Result") => Ok((**result).clone()),
        (target, name) => Err(Fault::missing_member(&target.type_name(), name)),
    }
}

/// Call a method on a built-in value.
pub(crate) fn call_method(
    interpreter: &mut Interpreter,
    target: &Value,
    method: &str,
    args: Vec<Value>,
) -> Result<Value, Fault> {
    match (target, method) {
        (_, "ToString") => {
            expect_args(method, &args, 0, 0)?;
            Ok(Value::str(interpreter.display(target)?))
        }
        (_, "Equals") => {
            expect_args(method, &args, 1, 1)?;
            Ok(Value::Bool(target.equals(&args[0])))
        }
        (Value::Str(text), _) => string_method(interpreter, text, method, &args),
        (Value::List(_), _) => list_method(interpreter, target, method, args),
        (target, method) => Err(Fault::missing_member(&target.type_name(), method)),
    }
}

fn string_method(
    interpreter: &mut Interpreter,
    text: &str,
    method: &str,
    args: &[Value],
) -> Result<Value, Fault> {
    match method {
        "ToUpper" => {
            expect_args(method, args, 0, 0)?;
            Ok(Value::str(text.to_uppercase()))
        }
        "ToLower" => {
            expect_args(method, args, 0, 0)?;
            Ok(Value::str(text.to_lowercase()))
        }
        "Trim" => {
            expect_args(method, args, 0, 0)?;
            Ok(Value::str(text.trim()))
        }
        "Contains" => {
            expect_args(method, args, 1, 1)?;
            Ok(Value::Bool(text.contains(str_arg(method, args, 0)?)))
        }
        "StartsWith" => {
            expect_args(method, args, 1, 1)?;
            Ok(Value::Bool(text.starts_with(str_arg(method, args, 0)?)))
        }
        "EndsWith" => {
            expect_args(method, args, 1, 1)?;
            Ok(Value::Bool(text.ends_with(str_arg(method, args, 0)?)))
        }
        "IndexOf" => {
            expect_args(method, args, 1, 1)?;
            let needle = str_arg(method, args, 0)?;
            Ok(Value::Int(
                text.find(needle).map_or(-1, |byte| char_index(text, byte)),
            ))
        }
        "Replace" => {
            expect_args(method, args, 2, 2)?;
            let from = str_arg(method, args, 0)?;
            if from.is_empty() {
                return Err(Fault::argument("String cannot be of zero length."));
            }
            let to = interpreter.display(&args[1])?;
            Ok(Value::str(text.replace(from, &to)))
        }
        "Split" => {
            expect_args(method, args, 1, 1)?;
            let separator = str_arg(method, args, 0)?;
            let parts: Vec<Value> = if separator.is_empty() {
                vec![Value::str(text)]
            } else {
                text.split(separator).map(Value::str).collect()
            };
            Ok(Value::list(parts))
        }
        "Substring" => {
            expect_args(method, args, 1, 2)?;
            let chars: Vec<char> = text.chars().collect();
            let start = int_arg(method, args, 0)?;
            let length = match args.get(1) {
                Some(_) => Some(int_arg(method, args, 1)?),
                None => None,
            };
            let range = char_range(chars.len(), start, length).ok_or_else(|| {
                Fault::new(
                    "ArgumentOutOfRangeException",
                    "Index and length must refer to a location within the string.",
                )
            })?;
            Ok(Value::str(chars[range].iter().collect::<String>()))
        }
        _ => Err(Fault::missing_member("String", method)),
    }
}

fn list_method(
    interpreter: &mut Interpreter,
    target: &Value,
    method: &str,
    args: Vec<Value>,
) -> Result<Value, Fault> {
    let Value::List(items) = target else {
        return Err(Fault::missing_member(&target.type_name(), method));
    };
    match method {
        "Add" => {
            expect_args(method, &args, 1, 1)?;
            items.borrow_mut().extend(args);
            Ok(Value::Null)
        }
        "Contains" => {
            expect_args(method, &args, 1, 1)?;
            Ok(Value::Bool(items.borrow().iter().any(|v| v.equals(&args[0]))))
        }
        "IndexOf" => {
            expect_args(method, &args, 1, 1)?;
            let position = items.borrow().iter().position(|v| v.equals(&args[0]));
            Ok(Value::Int(position.map_or(-1, |p| p as i64)))
        }
        "RemoveAt" => {
            expect_args(method, &args, 1, 1)?;
            let index = int_arg(method, &args, 0)?;
            let mut items = items.borrow_mut();
            match usize::try_from(index) {
                Ok(i) if i < items.len() => {
                    items.remove(i);
                    Ok(Value::Null)
                }
                _ => Err(Fault::index_out_of_range()),
            }
        }
        "Join" => {
            expect_args(method, &args, 1, 1)?;
            let separator = str_arg(method, &args, 0)?.to_string();
            let snapshot = items.borrow().clone();
            let mut parts = Vec::with_capacity(snapshot.len());
            for item in &snapshot {
                parts.push(interpreter.display(item)?);
            }
            Ok(Value::str(parts.join(&separator)))
        }
        _ => Err(Fault::missing_member("List", method)),
    }
}
