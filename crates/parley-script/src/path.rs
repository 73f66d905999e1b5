//! Dotted property paths such as `data.items[0].name`.

use crate::value::Value;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Split a path into segments. Bracketed parts that are not integers are
/// treated as keys, so `a[b]` behaves like `a.b`.
pub fn segments(path: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let (name, mut rest) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if !name.is_empty() {
            result.push(Segment::Key(name));
        }
        while let Some(stripped) = rest.strip_prefix('[') {
            let Some(close) = stripped.find(']') else {
                if !stripped.is_empty() {
                    result.push(Segment::Key(stripped));
                }
                break;
            };
            let inner = stripped[..close].trim_matches(|c| c == '"' || c == '\'');
            match inner.parse::<usize>() {
                Ok(i) => result.push(Segment::Index(i)),
                Err(_) => result.push(Segment::Key(inner)),
            }
            rest = &stripped[close + 1..];
        }
    }
    result
}

/// Follow `path` through `value`. Any missing step yields `null`.
pub fn lookup(value: &Value, path: &str) -> Value {
    let mut current = value.clone();
    for segment in segments(path) {
        current = match segment {
            Segment::Key(key) => match current.as_array() {
                Some(_) => current.index(&Value::from(key)),
                None => current.property(key),
            },
            Segment::Index(i) => current.index(&Value::Number(i as f64)),
        };
        if current.is_null() {
            break;
        }
    }
    current
}
