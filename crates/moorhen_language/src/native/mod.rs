//! Pure builtin implementations.
//!
//! - `arithmetic`: numbers, comparison, equality
//! - `string`: string manipulation
//! - `collection`: lists, counting, type queries

#[allow(clippy::unnecessary_wraps)]
mod arithmetic;
#[allow(clippy::unnecessary_wraps)]
mod collection;
#[allow(clippy::unnecessary_wraps)]
mod string;

use moorhen_foundation::{Error, ListVec, Result, Type, Value};

use crate::builtin::Builtin;

/// Evaluates a pure builtin.
///
/// # Errors
///
/// Returns `ArityMismatch` for a wrong argument count, the builtin's type
/// or arithmetic error, or `Internal` when called with a host builtin.
pub(crate) fn call(builtin: Builtin, args: &[Value]) -> Result<Value> {
    let arity = builtin.arity();
    if !arity.accepts(args.len()) {
        return Err(Error::arity_mismatch(arity.to_string(), args.len()));
    }
    match builtin {
        Builtin::Add => arithmetic::add(args),
        Builtin::Sub => arithmetic::sub(args),
        Builtin::Mul => arithmetic::mul(args),
        Builtin::Div => arithmetic::div(args),
        Builtin::Mod => arithmetic::modulo(args),
        Builtin::Min => arithmetic::min(args),
        Builtin::Max => arithmetic::max(args),
        Builtin::Abs => arithmetic::abs(args),
        Builtin::Eq => Ok(Value::Bool(
            args.windows(2).all(|w| arithmetic::values_equal(&w[0], &w[1])),
        )),
        Builtin::NotEq => Ok(Value::Bool(!arithmetic::values_equal(&args[0], &args[1]))),
        Builtin::Lt => arithmetic::compare_chain(args, std::cmp::Ordering::is_lt),
        Builtin::Le => arithmetic::compare_chain(args, std::cmp::Ordering::is_le),
        Builtin::Gt => arithmetic::compare_chain(args, std::cmp::Ordering::is_gt),
        Builtin::Ge => arithmetic::compare_chain(args, std::cmp::Ordering::is_ge),
        Builtin::Not => Ok(Value::Bool(!args[0].is_truthy())),

        Builtin::Str => Ok(string::concat(args)),
        Builtin::Upper => string::upper(args),
        Builtin::Lower => string::lower(args),
        Builtin::Trim => string::trim(args),
        Builtin::Split => string::split(args),
        Builtin::Join => string::join(args),
        Builtin::Substring => string::substring(args),
        Builtin::StartsWith => string::starts_with(args),
        Builtin::EndsWith => string::ends_with(args),

        Builtin::List => Ok(Value::list(args.iter().cloned())),
        Builtin::First => collection::first(args),
        Builtin::Rest => collection::rest(args),
        Builtin::Nth => collection::nth(args),
        Builtin::Count => collection::count(args),
        Builtin::Append => collection::append(args),
        Builtin::Concat => collection::concat(args),
        Builtin::IsEmpty => collection::is_empty(args),
        Builtin::Contains => collection::contains(args),
        Builtin::Reverse => collection::reverse(args),
        Builtin::Range => collection::range(args),
        Builtin::TypeOf => Ok(Value::from(args[0].value_type().to_string())),
        Builtin::IsNil => Ok(Value::Bool(args[0].is_nil())),
        Builtin::ToInt => arithmetic::to_int(args),

        Builtin::Error => Err(Error::raised(text_of(args))),

        host => Err(Error::internal(format!("{host} is not a pure builtin"))),
    }
}

/// Lists nested deeper than this are refused by the sized builtins.
const MAX_WEIGHED_NESTING: usize = 64;

/// Ticks a builtin costs on top of the one charged for the call: one per
/// byte or item it will produce, worked out from the arguments before
/// anything is built.
///
/// Counting stops once it passes `cap`, so the caller can reject an
/// oversized call without walking all of its input.
pub(crate) fn cost(builtin: Builtin, args: &[Value], cap: u64) -> u64 {
    match builtin {
        Builtin::Range => range_len(args),
        Builtin::Str | Builtin::Error | Builtin::Tell | Builtin::Notify => weigh_all(args, cap),
        Builtin::Join => {
            let sep = args.get(1).and_then(Value::as_str).map_or(1, str::len);
            let items = args.first().and_then(Value::as_list).map_or(0, ListVec::len);
            weigh_all(&args[..args.len().min(1)], cap)
                .saturating_add(to_u64(items.saturating_mul(sep)))
        }
        Builtin::Concat | Builtin::Reverse => args
            .iter()
            .filter_map(Value::as_list)
            .fold(0, |total: u64, items| total.saturating_add(to_u64(items.len()))),
        Builtin::Upper
        | Builtin::Lower
        | Builtin::Trim
        | Builtin::Split
        | Builtin::Substring
        | Builtin::Eq
        | Builtin::NotEq
        | Builtin::Contains => weigh_all(args, cap),
        Builtin::List => to_u64(args.len()),
        _ => 0,
    }
}

fn range_len(args: &[Value]) -> u64 {
    let bounds = match args {
        [end] => end.as_int().map(|end| (0, end)),
        [start, end, ..] => start.as_int().zip(end.as_int()),
        [] => None,
    };
    bounds.map_or(0, |(start, end)| {
        u64::try_from((i128::from(end) - i128::from(start)).max(0)).unwrap_or(u64::MAX)
    })
}

fn weigh_all(args: &[Value], cap: u64) -> u64 {
    let mut total = 0u64;
    for arg in args {
        if total > cap {
            break;
        }
        total = total.saturating_add(weigh(arg, cap - total, 0));
    }
    total
}

/// Bytes of string plus items of list reachable from `value`.
fn weigh(value: &Value, cap: u64, nesting: usize) -> u64 {
    match value {
        Value::String(s) => to_u64(s.len()),
        Value::List(items) => {
            if nesting >= MAX_WEIGHED_NESTING {
                return u64::MAX;
            }
            let mut total = to_u64(items.len());
            for item in items.iter() {
                if total > cap {
                    break;
                }
                total = total.saturating_add(weigh(item, cap - total, nesting + 1));
            }
            total
        }
        _ => 0,
    }
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Joins values the way `str` and `tell` display them.
pub(crate) fn text_of(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect()
}

pub(crate) fn type_error(expected: Type, actual: &Value) -> Error {
    Error::type_mismatch(expected, actual.value_type())
}

pub(crate) fn expect_str(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| type_error(Type::String, value))
}

pub(crate) fn expect_int(value: &Value) -> Result<i64> {
    value.as_int().ok_or_else(|| type_error(Type::Int, value))
}

pub(crate) fn expect_list(value: &Value) -> Result<&ListVec<Value>> {
    value.as_list().ok_or_else(|| type_error(Type::List, value))
}
