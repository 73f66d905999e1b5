//! Built-in namespace functions and value methods.
//!
//! This is the complete list of callables reachable from an expression; an
//! expression cannot define or import anything else.

use rand::Rng;
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::error::EvalError;
use crate::path::lookup;
use crate::value::{Namespace, Value, format_number};

static NULL: Value = Value::Null;

/// Call `namespace.name(args)`.
pub fn call_namespace(ns: Namespace, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match ns {
        Namespace::Collections => collections(name, args),
        Namespace::Math => math(name, args),
    }
}

/// Call `value.name(args)` on a string, array or number.
pub fn call_method(value: &Value, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match value {
        Value::String(s) => string_method(s, name, args),
        Value::Array(items) => array_method(items, name, args),
        Value::Number(n) => number_method(*n, name, args),
        _ => Err(EvalError::NotCallable {
            target: name.to_string(),
        }),
    }
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

fn array_arg<'v>(function: &str, value: &'v Value) -> Result<&'v [Value], EvalError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(&[]),
        _ => Err(EvalError::TypeMismatch {
            function: function.to_string(),
            expected: "an array",
        }),
    }
}

fn string_arg<'v>(function: &str, value: &'v Value) -> Result<&'v str, EvalError> {
    value.as_str().ok_or_else(|| EvalError::TypeMismatch {
        function: function.to_string(),
        expected: "a string",
    })
}

fn collections(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let first = arg(args, 0);
    let function = format!("_.{name}");
    Ok(match name {
        "sample" => array_arg(&function, first)?
            .choose(&mut thread_rng())
            .cloned()
            .unwrap_or(Value::Null),
        "shuffle" => {
            let mut items = array_arg(&function, first)?.to_vec();
            items.shuffle(&mut thread_rng());
            Value::Array(items)
        }
        "random" => random_between(&function, args)?,
        "size" => Value::Number(size(first) as f64),
        "first" => array_arg(&function, first)?
            .first()
            .cloned()
            .unwrap_or(Value::Null),
        "last" => array_arg(&function, first)?
            .last()
            .cloned()
            .unwrap_or(Value::Null),
        "join" => Value::String(join(array_arg(&function, first)?, arg(args, 1))),
        "map" => {
            let key = string_arg(&function, arg(args, 1))?;
            Value::Array(
                array_arg(&function, first)?
                    .iter()
                    .map(|item| lookup(item, key))
                    .collect(),
            )
        }
        "filter" => {
            let key = string_arg(&function, arg(args, 1))?;
            Value::Array(
                array_arg(&function, first)?
                    .iter()
                    .filter(|item| lookup(item, key).is_truthy())
                    .cloned()
                    .collect(),
            )
        }
        "get" => {
            let found = lookup(first, &arg(args, 1).to_string());
            if found.is_null() {
                arg(args, 2).clone()
            } else {
                found
            }
        }
        "includes" => Value::Bool(includes(first, arg(args, 1))),
        "uniq" => {
            let mut unique: Vec<Value> = Vec::new();
            for item in array_arg(&function, first)? {
                if !unique.iter().any(|u| u.strict_eq(item)) {
                    unique.push(item.clone());
                }
            }
            Value::Array(unique)
        }
        "reverse" => Value::Array(array_arg(&function, first)?.iter().rev().cloned().collect()),
        "sum" => Value::Number(
            array_arg(&function, first)?
                .iter()
                .map(Value::to_number)
                .sum(),
        ),
        "min" | "max" => {
            let numbers = array_arg(&function, first)?.iter().map(Value::to_number);
            let extreme = if name == "min" {
                numbers.reduce(f64::min)
            } else {
                numbers.reduce(f64::max)
            };
            extreme.map_or(Value::Null, Value::Number)
        }
        "round" | "floor" | "ceil" => {
            let precision = arg(args, 1).to_number();
            let precision = if precision.is_finite() { precision } else { 0.0 };
            let factor = 10f64.powf(precision);
            let scaled = first.to_number() * factor;
            let rounded = match name {
                "round" => round_half_up(scaled),
                "floor" => scaled.floor(),
                _ => scaled.ceil(),
            };
            Value::Number(rounded / factor)
        }
        "upperFirst" => Value::String(upper_first(&first.to_string())),
        "capitalize" => Value::String(upper_first(&first.to_string().to_lowercase())),
        "toUpper" => Value::String(first.to_string().to_uppercase()),
        "toLower" => Value::String(first.to_string().to_lowercase()),
        "isNil" => Value::Bool(first.is_null()),
        "isEmpty" => Value::Bool(size(first) == 0),
        _ => {
            return Err(EvalError::UnknownFunction {
                namespace: "_".to_string(),
                name: name.to_string(),
            });
        }
    })
}

fn math(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let x = arg(args, 0).to_number();
    Ok(Value::Number(match name {
        "random" => thread_rng().r#gen::<f64>(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => round_half_up(x),
        "abs" => x.abs(),
        "sqrt" => x.sqrt(),
        "pow" => x.powf(arg(args, 1).to_number()),
        "min" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::INFINITY, f64::min),
        "max" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::NEG_INFINITY, f64::max),
        _ => {
            return Err(EvalError::UnknownFunction {
                namespace: "Math".to_string(),
                name: name.to_string(),
            });
        }
    }))
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let first = arg(args, 0);
    Ok(match name {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "toString" => Value::String(s.to_string()),
        "includes" => Value::Bool(s.contains(&first.to_string())),
        "startsWith" => Value::Bool(s.starts_with(&first.to_string())),
        "endsWith" => Value::Bool(s.ends_with(&first.to_string())),
        "indexOf" => Value::Number(
            s.find(&first.to_string())
                .map_or(-1.0, |byte| s[..byte].chars().count() as f64),
        ),
        "charAt" => Value::String(
            usize_arg(first)
                .and_then(|i| s.chars().nth(i))
                .map(String::from)
                .unwrap_or_default(),
        ),
        "split" => {
            let separator = first.to_string();
            if first.is_null() {
                Value::Array(vec![Value::String(s.to_string())])
            } else if separator.is_empty() {
                Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect())
            } else {
                Value::Array(s.split(separator.as_str()).map(Value::from).collect())
            }
        }
        "replace" => Value::String(s.replacen(&first.to_string(), &arg(args, 1).to_string(), 1)),
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), first, arg(args, 1));
            Value::String(chars[start..end].iter().collect())
        }
        _ => {
            return Err(EvalError::UnknownFunction {
                namespace: "string".to_string(),
                name: name.to_string(),
            });
        }
    })
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let first = arg(args, 0);
    Ok(match name {
        "join" => Value::String(join(items, first)),
        "includes" => Value::Bool(items.iter().any(|item| item.strict_eq(first))),
        "indexOf" => Value::Number(
            items
                .iter()
                .position(|item| item.strict_eq(first))
                .map_or(-1.0, |i| i as f64),
        ),
        "slice" => {
            let (start, end) = slice_bounds(items.len(), first, arg(args, 1));
            Value::Array(items[start..end].to_vec())
        }
        "reverse" => Value::Array(items.iter().rev().cloned().collect()),
        "concat" => {
            let mut joined = items.to_vec();
            for extra in args {
                match extra {
                    Value::Array(more) => joined.extend(more.iter().cloned()),
                    other => joined.push(other.clone()),
                }
            }
            Value::Array(joined)
        }
        "toString" => Value::String(join(items, &NULL)),
        _ => {
            return Err(EvalError::UnknownFunction {
                namespace: "array".to_string(),
                name: name.to_string(),
            });
        }
    })
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "toFixed" => {
            let digits = usize_arg(arg(args, 0)).unwrap_or(0).min(100);
            Ok(Value::String(format!("{n:.digits$}")))
        }
        "toString" => Ok(Value::String(format_number(n))),
        _ => Err(EvalError::UnknownFunction {
            namespace: "number".to_string(),
            name: name.to_string(),
        }),
    }
}

/// `_.random(lower, upper)`: inclusive; floating when either bound is fractional.
fn random_between(function: &str, args: &[Value]) -> Result<Value, EvalError> {
    let (mut lower, mut upper) = match args.len() {
        0 => (0.0, 1.0),
        1 => (0.0, arg(args, 0).to_number()),
        _ => (arg(args, 0).to_number(), arg(args, 1).to_number()),
    };
    if !lower.is_finite() || !upper.is_finite() {
        return Err(EvalError::TypeMismatch {
            function: function.to_string(),
            expected: "numeric bounds",
        });
    }
    if lower > upper {
        (lower, upper) = (upper, lower);
    }
    let mut rng = thread_rng();
    if lower.fract() == 0.0 && upper.fract() == 0.0 {
        Ok(Value::Number(
            rng.gen_range(lower as i64..=upper as i64) as f64,
        ))
    } else {
        Ok(Value::Number(lower + rng.r#gen::<f64>() * (upper - lower)))
    }
}

/// Round half towards positive infinity, like script hosts do.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn usize_arg(value: &Value) -> Option<usize> {
    let n = value.to_number();
    (n.is_finite() && n >= 0.0).then_some(n as usize)
}

/// Resolve `slice(start, end)` arguments, with negative offsets counted
/// from the end.
fn slice_bounds(len: usize, start: &Value, end: &Value) -> (usize, usize) {
    let resolve = |value: &Value, default: usize| -> usize {
        if value.is_null() {
            return default;
        }
        let n = value.to_number();
        if n.is_nan() {
            0
        } else if n < 0.0 {
            len.saturating_sub((-n) as usize)
        } else {
            (n as usize).min(len)
        }
    };
    let start = resolve(start, 0);
    let end = resolve(end, len);
    (start.min(end), end)
}

fn join(items: &[Value], separator: &Value) -> String {
    let separator = if separator.is_null() {
        ",".to_string()
    } else {
        separator.to_string()
    };
    items
        .iter()
        .map(|item| {
            if item.is_null() {
                String::new()
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(&separator)
}

fn size(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

fn includes(collection: &Value, needle: &Value) -> bool {
    match collection {
        Value::String(s) => s.contains(&needle.to_string()),
        Value::Array(items) => items.iter().any(|item| item.strict_eq(needle)),
        Value::Object(map) => map.values().any(|item| item.strict_eq(needle)),
        _ => false,
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn sample_of_empty_array_is_null() {
        let result = call_namespace(Namespace::Collections, "sample", &[strings(&[])]).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn random_swaps_reversed_bounds() {
        for _ in 0..20 {
            let n = call_namespace(
                Namespace::Collections,
                "random",
                &[Value::Number(5.0), Value::Number(1.0)],
            )
            .unwrap()
            .to_number();
            assert!((1.0..=5.0).contains(&n));
            assert_eq!(n.fract(), 0.0);
        }
    }

    #[test]
    fn round_with_precision() {
        let result = call_namespace(
            Namespace::Collections,
            "round",
            &[Value::Number(4.006), Value::Number(2.0)],
        )
        .unwrap();
        assert_eq!(result, Value::Number(4.01));
    }

    #[test]
    fn string_slice_handles_negative_offsets() {
        let result = call_method(&Value::from("streamer"), "slice", &[Value::Number(-3.0)]).unwrap();
        assert_eq!(result, Value::from("mer"));
    }

    #[test]
    fn unknown_method_is_an_error() {
        let err = call_method(&Value::from("x"), "eval", &[]).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownFunction {
                namespace: "string".to_string(),
                name: "eval".to_string(),
            }
        );
    }
}
