//! Lists and counting.

use moorhen_foundation::{Error, ListVec, Result, Type, Value};

use super::arithmetic::values_equal;
use super::string::char_count;
use super::{expect_int, expect_list, type_error};

/// First item, or nil for an empty list or nil.
pub(super) fn first(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        other => Ok(expect_list(other)?.first().cloned().unwrap_or(Value::Nil)),
    }
}

pub(super) fn rest(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::List(ListVec::new())),
        other => Ok(Value::List(expect_list(other)?.skip(1))),
    }
}

/// Item at a zero-based index, or nil when out of range.
pub(super) fn nth(args: &[Value]) -> Result<Value> {
    let items = expect_list(&args[0])?;
    let index = expect_int(&args[1])?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or(Value::Nil))
}

/// Length of a list or string; nil counts as empty.
pub(super) fn count(args: &[Value]) -> Result<Value> {
    let n = match &args[0] {
        Value::Nil => 0,
        Value::List(items) => items.len(),
        other => char_count(other)?,
    };
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| Error::raised("count too large"))
}

pub(super) fn append(args: &[Value]) -> Result<Value> {
    let items = match &args[0] {
        Value::Nil => ListVec::new(),
        other => expect_list(other)?.clone(),
    };
    Ok(Value::List(items.push_back(args[1].clone())))
}

pub(super) fn concat(args: &[Value]) -> Result<Value> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::Nil => {}
            other => out.extend(expect_list(other)?.iter().cloned()),
        }
    }
    Ok(Value::list(out))
}

pub(super) fn is_empty(args: &[Value]) -> Result<Value> {
    let empty = match &args[0] {
        Value::Nil => true,
        Value::List(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        other => return Err(type_error(Type::List, other)),
    };
    Ok(Value::Bool(empty))
}

/// List membership, or substring search when both sides are strings.
pub(super) fn contains(args: &[Value]) -> Result<Value> {
    match (&args[0], &args[1]) {
        (Value::String(haystack), Value::String(needle)) => {
            Ok(Value::Bool(haystack.contains(&**needle)))
        }
        (Value::Nil, _) => Ok(Value::Bool(false)),
        (list, needle) => Ok(Value::Bool(
            expect_list(list)?
                .iter()
                .any(|item| values_equal(item, needle)),
        )),
    }
}

pub(super) fn reverse(args: &[Value]) -> Result<Value> {
    let items = expect_list(&args[0])?;
    let mut out: Vec<Value> = items.iter().cloned().collect();
    out.reverse();
    Ok(Value::list(out))
}

/// `(range end)` or `(range start end)`, end exclusive.
pub(super) fn range(args: &[Value]) -> Result<Value> {
    let (start, end) = match args {
        [end] => (0, expect_int(end)?),
        [start, end, ..] => (expect_int(start)?, expect_int(end)?),
        [] => return Err(Error::arity_mismatch("1 to 2".to_string(), 0)),
    };
    Ok(Value::list((start..end).map(Value::Int)))
}
