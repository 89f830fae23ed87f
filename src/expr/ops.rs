use std::cmp::Ordering;

use crate::expr::ast::{BinOp, CmpOp};
use crate::expr::error::EvalError;
use crate::expr::value::Value;

/// Largest string, list or tuple a single `*` may produce.
pub const MAX_SEQUENCE_LEN: usize = 100_000;

fn mismatch(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "unsupported operand types for {op}: {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

/// Apply an arithmetic or bitwise/set operator.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => sub(left, right),
        BinOp::Mul => mul(left, right),
        BinOp::Div => div(left, right),
        BinOp::FloorDiv => floor_div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => bitwise(op, left, right),
    }
}

fn ints(left: &Value, right: &Value) -> Option<(i64, i64)> {
    Some((left.as_int()?, right.as_int()?))
}

fn floats(left: &Value, right: &Value) -> Option<(f64, f64)> {
    Some((left.as_f64()?, right.as_f64()?))
}

fn add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some((a, b)) = ints(left, right) {
        return a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow);
    }
    if let Some((a, b)) = floats(left, right) {
        return Ok(Value::Float(a + b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => Ok(Value::List(a.iter().chain(b).cloned().collect())),
        (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(a.iter().chain(b).cloned().collect())),
        _ => Err(mismatch("+", left, right)),
    }
}

fn sub(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some((a, b)) = ints(left, right) {
        return a.checked_sub(b).map(Value::Int).ok_or(EvalError::Overflow);
    }
    if let Some((a, b)) = floats(left, right) {
        return Ok(Value::Float(a - b));
    }
    match (left, right) {
        (Value::Set(a), Value::Set(b)) => Ok(Value::Set(a.difference(b).cloned().collect())),
        _ => Err(mismatch("-", left, right)),
    }
}

fn repeat(items: &[Value], times: i64) -> Vec<Value> {
    let times = times.max(0) as usize;
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    out
}

fn mul(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some((a, b)) = ints(left, right) {
        return a.checked_mul(b).map(Value::Int).ok_or(EvalError::Overflow);
    }
    if let Some((a, b)) = floats(left, right) {
        return Ok(Value::Float(a * b));
    }

    let (seq, times) = match (left.as_int(), right.as_int()) {
        (None, Some(n)) => (left, n),
        (Some(n), None) => (right, n),
        _ => return Err(mismatch("*", left, right)),
    };
    let produced = seq
        .len()
        .ok()
        .and_then(|len| len.checked_mul(times.max(0) as usize))
        .ok_or_else(|| mismatch("*", left, right))?;
    if produced > MAX_SEQUENCE_LEN {
        return Err(EvalError::Overflow);
    }
    match seq {
        Value::List(items) => Ok(Value::List(repeat(items, times))),
        Value::Tuple(items) => Ok(Value::Tuple(repeat(items, times))),
        Value::Str(s) => Ok(Value::Str(s.repeat(times.max(0) as usize))),
        _ => Err(mismatch("*", left, right)),
    }
}

fn div(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (a, b) = floats(left, right).ok_or_else(|| mismatch("/", left, right))?;
    if b == 0.0 {
        return Err(EvalError::ZeroDivision);
    }
    Ok(Value::Float(a / b))
}

fn floor_div(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some((a, b)) = ints(left, right) {
        if b == 0 {
            return Err(EvalError::ZeroDivision);
        }
        let q = a.checked_div(b).ok_or(EvalError::Overflow)?;
        let floored = if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q };
        return Ok(Value::Int(floored));
    }
    let (a, b) = floats(left, right).ok_or_else(|| mismatch("//", left, right))?;
    if b == 0.0 {
        return Err(EvalError::ZeroDivision);
    }
    Ok(Value::Float((a / b).floor()))
}

fn modulo(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some((a, b)) = ints(left, right) {
        if b == 0 {
            return Err(EvalError::ZeroDivision);
        }
        let r = a.checked_rem(b).ok_or(EvalError::Overflow)?;
        // Result takes the sign of the divisor.
        let r = if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r };
        return Ok(Value::Int(r));
    }
    let (a, b) = floats(left, right).ok_or_else(|| mismatch("%", left, right))?;
    if b == 0.0 {
        return Err(EvalError::ZeroDivision);
    }
    Ok(Value::Float(a - b * (a / b).floor()))
}

fn bitwise(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let symbol = match op {
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        _ => "^",
    };
    match (left, right) {
        (Value::Set(a), Value::Set(b)) => {
            let set = match op {
                BinOp::BitAnd => a.intersection(b).cloned().collect(),
                BinOp::BitOr => a.union(b).cloned().collect(),
                _ => a.symmetric_difference(b).cloned().collect(),
            };
            Ok(Value::Set(set))
        }
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinOp::BitAnd => a & b,
            BinOp::BitOr => a | b,
            _ => a ^ b,
        })),
        _ => {
            let (a, b) = ints(left, right).ok_or_else(|| mismatch(symbol, left, right))?;
            Ok(Value::Int(match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                _ => a ^ b,
            }))
        }
    }
}

/// Ordering for `<`-style comparisons. Sets compare by inclusion and are
/// handled separately in [`compare`].
pub fn order(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let comparable = (left.is_number() && right.is_number())
        || matches!(
            (left, right),
            (Value::Str(_), Value::Str(_))
                | (Value::List(_), Value::List(_))
                | (Value::Tuple(_), Value::Tuple(_))
        );
    if !comparable {
        return Err(mismatch("<", left, right));
    }
    Ok(left.cmp(right))
}

pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    if let (Value::Set(a), Value::Set(b)) = (left, right) {
        return Ok(match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a.is_subset(b) && a.len() < b.len(),
            CmpOp::Le => a.is_subset(b),
            CmpOp::Gt => a.is_superset(b) && a.len() > b.len(),
            CmpOp::Ge => a.is_superset(b),
            CmpOp::In => contains(right, left)?,
            CmpOp::NotIn => !contains(right, left)?,
        });
    }

    Ok(match op {
        CmpOp::Eq => left == right,
        CmpOp::Ne => left != right,
        CmpOp::Lt => order(left, right)? == Ordering::Less,
        CmpOp::Le => order(left, right)? != Ordering::Greater,
        CmpOp::Gt => order(left, right)? == Ordering::Greater,
        CmpOp::Ge => order(left, right)? != Ordering::Less,
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
    })
}

/// `item in container`.
pub fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::List(items) | Value::Tuple(items) => Ok(items.contains(item)),
        Value::Set(items) => Ok(items.contains(item)),
        Value::Map(map) => Ok(map.entries.contains_key(item)),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::TypeMismatch(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        other => Err(EvalError::TypeMismatch(format!(
            "argument of type {} is not a container",
            other.type_name()
        ))),
    }
}
