//! Operators and indexing.

use crate::error::Fault;
use crate::value::Value;
use genplay_compiler::ir::{BinaryOp, UnaryOp};
use std::cmp::Ordering;

const fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "||",
        BinaryOp::And => "&&",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
    }
}

fn operand_error(op: &str, lhs: &Value, rhs: &Value) -> Fault {
    Fault::invalid_operation(format!(
        "Operator '{op}' cannot be applied to operands of type '{}' and '{}'.",
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Apply a prefix operator.
pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Result<Value, Fault> {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, other) => Err(Fault::invalid_operation(format!(
            "Operator '-' cannot be applied to operand of type '{}'.",
            other.type_name()
        ))),
    }
}

/// Apply an infix operator to evaluated operands.
///
/// String concatenation is handled by the interpreter, which may call
/// user `ToString` methods.
pub(crate) fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Fault> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(lhs.equals(rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!lhs.equals(rhs))),
        BinaryOp::And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare(lhs, rhs).ok_or_else(|| operand_error(symbol(op), lhs, rhs))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, lhs, rhs)
        }
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => as_float(lhs)?.partial_cmp(&as_float(rhs)?),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Fault> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let (a, b) = (*a, *b);
        return match op {
            BinaryOp::Add => Ok(Value::Int(a.wrapping_add(b))),
            BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
            BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
            BinaryOp::Div if b == 0 => Err(Fault::divide_by_zero()),
            BinaryOp::Div => Ok(Value::Int(a.wrapping_div(b))),
            BinaryOp::Rem if b == 0 => Err(Fault::divide_by_zero()),
            _ => Ok(Value::Int(a.wrapping_rem(b))),
        };
    }
    if let (Value::List(a), Value::List(b), BinaryOp::Add) = (lhs, rhs, op) {
        let mut items = a.borrow().clone();
        items.extend(b.borrow().iter().cloned());
        return Ok(Value::list(items));
    }
    let (Some(a), Some(b)) = (as_float(lhs), as_float(rhs)) else {
        return Err(operand_error(symbol(op), lhs, rhs));
    };
    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}

/// `target[index]`.
pub(crate) fn index(target: &Value, index: &Value) -> Result<Value, Fault> {
    match (target, index) {
        (Value::Null, _) => Err(Fault::null_reference()),
        (Value::List(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.borrow().get(i).cloned())
            .ok_or_else(Fault::index_out_of_range),
        (Value::Str(text), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| text.chars().nth(i))
            .map(|c| Value::str(c.to_string()))
            .ok_or_else(Fault::index_out_of_range),
        (target, index) => Err(Fault::invalid_operation(format!(
            "Cannot apply indexing with '{}' to a value of type '{}'.",
            index.type_name(),
            target.type_name()
        ))),
    }
}

/// `target[index] = value`.
pub(crate) fn set_index(target: &Value, index: &Value, value: Value) -> Result<(), Fault> {
    match (target, index) {
        (Value::Null, _) => Err(Fault::null_reference()),
        (Value::List(items), Value::Int(i)) => {
            let mut items = items.borrow_mut();
            let slot = usize::try_from(*i)
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(Fault::index_out_of_range)?;
            *slot = value;
            Ok(())
        }
        (target, _) => Err(Fault::invalid_operation(format!(
            "Cannot assign to an element of a value of type '{}'.",
            target.type_name()
        ))),
    }
}
