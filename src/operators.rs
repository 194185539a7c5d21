//! Arithmetic, relational, and logical operators.
//!
//! Pulled out of the dispatch loop as pure functions, the way
//! `littrs`'s `apply_binop`/`apply_cmpop` factor operator semantics out of
//! its `Vm::dispatch_op`. Every function here takes already-resolved
//! [`Value`]s — frame/stack lookups happen in [`crate::engine`].

use crate::error::{Error, Result};
use crate::value::Value;

fn operand_mismatch(op: &str, a: &Value, b: &Value) -> Error {
    Error::InvalidOperand(format!(
        "{} requires matching int operands, got {} and {}",
        op,
        a.type_name(),
        b.type_name()
    ))
}

pub fn add(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_add(*y))),
        _ => Err(operand_mismatch("ADD", a, b)),
    }
}

pub fn sub(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_sub(*y))),
        _ => Err(operand_mismatch("SUB", a, b)),
    }
}

pub fn mul(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_mul(*y))),
        _ => Err(operand_mismatch("MUL", a, b)),
    }
}

/// Integer division truncating toward zero. Division by zero is an
/// arithmetic-range error, not a crash.
pub fn idiv(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) => Err(Error::ArithmeticRange("division by zero".to_string())),
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x / y)),
        _ => Err(operand_mismatch("IDIV", a, b)),
    }
}

/// Shared ordering for `LT`/`GT`. Operands must share a type among
/// `int`/`string`/`bool`; `nil` on either side is always an error, unlike
/// `EQ`.
fn ordering(a: &Value, b: &Value) -> Result<std::cmp::Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        // false < true.
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        _ => Err(Error::InvalidOperand(format!(
            "relational comparison of {} and {} is not ordered",
            a.type_name(),
            b.type_name()
        ))),
    }
}

pub fn lt(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::Bool(ordering(a, b)? == std::cmp::Ordering::Less))
}

pub fn gt(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::Bool(ordering(a, b)? == std::cmp::Ordering::Greater))
}

/// `EQ`: unlike `LT`/`GT`, `nil` is permitted — `nil` equals `nil` and
/// nothing else. Otherwise both operands must share a type.
pub fn eq(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ok(Value::Bool(true)),
        (Value::Nil, _) | (_, Value::Nil) => Ok(Value::Bool(false)),
        (Value::Int(x), Value::Int(y)) => Ok(Value::Bool(x == y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x == y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x == y)),
        _ => Err(Error::InvalidOperand(format!(
            "EQ of {} and {} is not defined",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn as_bool(op: &str, v: &Value) -> Result<bool> {
    v.as_bool()
        .ok_or_else(|| Error::InvalidOperand(format!("{} requires a bool operand, got {}", op, v.type_name())))
}

pub fn and(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::Bool(as_bool("AND", a)? && as_bool("AND", b)?))
}

pub fn or(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::Bool(as_bool("OR", a)? || as_bool("OR", b)?))
}

pub fn not(a: &Value) -> Result<Value> {
    Ok(Value::Bool(!as_bool("NOT", a)?))
}
