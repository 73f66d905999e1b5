use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde_json::{Map, Number, Value as Json};

/// Built-in function namespaces reachable from every expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// `_`: collection utilities.
    Collections,
    /// `Math`: numeric helpers.
    Math,
}

impl Namespace {
    pub fn name(self) -> &'static str {
        match self {
            Namespace::Collections => "_",
            Namespace::Math => "Math",
        }
    }
}

/// A runtime value produced while evaluating an expression.
///
/// The model mirrors the handful of types a chat script needs: scalars,
/// arrays and string-keyed records. Conversions from `serde_json::Value`
/// let collaborators hand in HTTP responses and user records directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Namespace(Namespace),
}

impl Value {
    /// Script truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Namespace(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion. Strings are parsed after trimming (empty is `0`);
    /// anything that cannot be read as a number is `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(_) | Value::Object(_) | Value::Namespace(_) => f64::NAN,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Read a property the way member access does. Missing keys are `null`.
    pub fn property(&self, name: &str) -> Value {
        match (self, name) {
            (Value::String(s), "length") => Value::Number(s.chars().count() as f64),
            (Value::Array(items), "length") => Value::Number(items.len() as f64),
            (Value::Object(map), key) => map.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Index into an array, string or record.
    pub fn index(&self, key: &Value) -> Value {
        match self {
            Value::Array(items) => as_index(key)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null),
            Value::String(s) => as_index(key)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null),
            Value::Object(_) => self.property(&key.to_string()),
            _ => Value::Null,
        }
    }

    /// `==`: values of different scalar types are compared numerically.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(_) | Value::Number(_) | Value::String(_), _)
            | (_, Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self == other,
        }
    }

    /// `===`: same type and same value.
    pub fn strict_eq(&self, other: &Value) -> bool {
        self == other
    }

    /// Ordering for `<`, `<=`, `>`, `>=`. Two strings compare lexically,
    /// everything else numerically; `None` when either side is `NaN`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }

    /// Convert to JSON for rendering records.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Value::Namespace(ns) => Json::String(ns.name().to_string()),
        }
    }
}

fn as_index(key: &Value) -> Option<usize> {
    let n = key.to_number();
    (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

/// Render a number the way script hosts print them: integral values without
/// a fractional part, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        if n == 0.0 {
            "0".to_string()
        } else {
            format!("{n:.0}")
        }
    } else {
        format!("{n}")
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "{}", self.to_json()),
            Value::Namespace(ns) => write!(f, "[namespace {}]", ns.name()),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
