//! Numbers, comparison, and equality.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use std::cmp::Ordering;

use moorhen_foundation::{Error, ErrorKind, Result, Type, Value};

use super::type_error;

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(Self::Int(*n)),
            Value::Float(n) => Ok(Self::Float(*n)),
            other => Err(type_error(Type::Float, other)),
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(n) => *n as f64,
            Self::Float(n) => *n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(n) => Value::Int(n),
            Self::Float(n) => Value::Float(n),
        }
    }
}

fn overflow() -> Error {
    Error::raised("integer overflow")
}

/// Folds a binary numeric operation over `args`, staying integral while
/// every operand is an integer.
fn fold(
    args: &[Value],
    init: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    let mut acc = init;
    for arg in args {
        acc = match (acc, Number::of(arg)?) {
            (Number::Int(a), Number::Int(b)) => Number::Int(int_op(a, b).ok_or_else(overflow)?),
            (a, b) => Number::Float(float_op(a.as_f64(), b.as_f64())),
        };
    }
    Ok(acc.into_value())
}

pub(super) fn add(args: &[Value]) -> Result<Value> {
    fold(args, Number::Int(0), i64::checked_add, |a, b| a + b)
}

pub(super) fn mul(args: &[Value]) -> Result<Value> {
    fold(args, Number::Int(1), i64::checked_mul, |a, b| a * b)
}

pub(super) fn sub(args: &[Value]) -> Result<Value> {
    if let [only] = args {
        return match Number::of(only)? {
            Number::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
            Number::Float(n) => Ok(Value::Float(-n)),
        };
    }
    let first = Number::of(&args[0])?;
    fold(&args[1..], first, i64::checked_sub, |a, b| a - b)
}

pub(super) fn div(args: &[Value]) -> Result<Value> {
    let mut acc = Number::of(&args[0])?;
    for arg in &args[1..] {
        let divisor = Number::of(arg)?;
        if divisor.as_f64() == 0.0 {
            return Err(Error::new(ErrorKind::DivisionByZero));
        }
        acc = match (acc, divisor) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.checked_div(b).ok_or_else(overflow)?),
            (a, b) => Number::Float(a.as_f64() / b.as_f64()),
        };
    }
    Ok(acc.into_value())
}

pub(super) fn modulo(args: &[Value]) -> Result<Value> {
    match (Number::of(&args[0])?, Number::of(&args[1])?) {
        (_, Number::Int(0)) => Err(Error::new(ErrorKind::DivisionByZero)),
        (Number::Int(a), Number::Int(b)) => a.checked_rem_euclid(b).map(Value::Int).ok_or_else(overflow),
        (a, b) => {
            let b = b.as_f64();
            if b == 0.0 {
                Err(Error::new(ErrorKind::DivisionByZero))
            } else {
                Ok(Value::Float(a.as_f64().rem_euclid(b)))
            }
        }
    }
}

fn extreme(args: &[Value], keep: Ordering) -> Result<Value> {
    let mut best = &args[0];
    Number::of(best)?;
    for arg in &args[1..] {
        Number::of(arg)?;
        if arg.partial_cmp(best) == Some(keep) {
            best = arg;
        }
    }
    Ok(best.clone())
}

pub(super) fn min(args: &[Value]) -> Result<Value> {
    extreme(args, Ordering::Less)
}

pub(super) fn max(args: &[Value]) -> Result<Value> {
    extreme(args, Ordering::Greater)
}

pub(super) fn abs(args: &[Value]) -> Result<Value> {
    match Number::of(&args[0])? {
        Number::Int(n) => n.checked_abs().map(Value::Int).ok_or_else(overflow),
        Number::Float(n) => Ok(Value::Float(n.abs())),
    }
}

/// Numbers compare by value across int and float; everything else
/// structurally.
pub(super) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Checks `pred` holds for every adjacent pair.
pub(super) fn compare_chain(args: &[Value], pred: fn(Ordering) -> bool) -> Result<Value> {
    for pair in args.windows(2) {
        let ordering = pair[0].partial_cmp(&pair[1]).ok_or_else(|| {
            Error::raised(format!(
                "cannot compare {} with {}",
                pair[0].value_type(),
                pair[1].value_type()
            ))
        })?;
        if !pred(ordering) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub(super) fn to_int(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => Ok(Value::Int(n.trunc() as i64)),
        Value::String(s) => Ok(s.trim().parse::<i64>().map_or(Value::Nil, Value::Int)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        other => Err(type_error(Type::Int, other)),
    }
}
