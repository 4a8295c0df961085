//! String manipulation.

use moorhen_foundation::{Result, Type, Value};

use super::{expect_int, expect_list, expect_str, text_of, type_error};

pub(super) fn concat(args: &[Value]) -> Value {
    Value::from(text_of(args))
}

pub(super) fn upper(args: &[Value]) -> Result<Value> {
    Ok(Value::from(expect_str(&args[0])?.to_uppercase()))
}

pub(super) fn lower(args: &[Value]) -> Result<Value> {
    Ok(Value::from(expect_str(&args[0])?.to_lowercase()))
}

pub(super) fn trim(args: &[Value]) -> Result<Value> {
    Ok(Value::from(expect_str(&args[0])?.trim()))
}

/// Splits on whitespace, or on the given separator.
pub(super) fn split(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0])?;
    let parts: Vec<Value> = match args.get(1) {
        Some(sep) => {
            let sep = expect_str(sep)?;
            if sep.is_empty() {
                text.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                text.split(sep).map(Value::from).collect()
            }
        }
        None => text.split_whitespace().map(Value::from).collect(),
    };
    Ok(Value::list(parts))
}

/// Joins list items with a separator (a single space by default).
pub(super) fn join(args: &[Value]) -> Result<Value> {
    let items = expect_list(&args[0])?;
    let sep = match args.get(1) {
        Some(sep) => expect_str(sep)?,
        None => " ",
    };
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    Ok(Value::from(parts.join(sep)))
}

/// `(substring s start end?)` over characters, clamped to the string.
pub(super) fn substring(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0])?;
    let len = text.chars().count();
    let clamp = |n: i64| usize::try_from(n.max(0)).map_or(len, |n| n.min(len));
    let start = clamp(expect_int(&args[1])?);
    let end = match args.get(2) {
        Some(end) => clamp(expect_int(end)?),
        None => len,
    };
    if end <= start {
        return Ok(Value::from(""));
    }
    let out: String = text.chars().skip(start).take(end - start).collect();
    Ok(Value::from(out))
}

pub(super) fn starts_with(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(
        expect_str(&args[0])?.starts_with(expect_str(&args[1])?),
    ))
}

pub(super) fn ends_with(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(
        expect_str(&args[0])?.ends_with(expect_str(&args[1])?),
    ))
}

/// Character count of a string, or a type error.
pub(super) fn char_count(value: &Value) -> Result<usize> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        other => Err(type_error(Type::String, other)),
    }
}
