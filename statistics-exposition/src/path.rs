//! Lookup of values nested inside a statistics snapshot.

use serde_json::Value;

/// Resolves `path` against `record`, returning the value found at that nested location.
///
/// Objects are descended by key and arrays by a key that parses as an index. Descending into a
/// scalar, a missing key, or a `null` at any level yields `None`; this never panics. Present but
/// falsy values such as `0`, `""` or `false` are returned as-is.
pub fn resolve<'a, S>(record: Option<&'a Value>, path: &[S]) -> Option<&'a Value>
where
    S: AsRef<str>,
{
    let mut current = record?;
    for key in path {
        current = match current {
            Value::Object(map) => map.get(key.as_ref())?,
            Value::Array(items) => items.get(key.as_ref().parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Null => None,
        value => Some(value),
    }
}

/// Whether a resolved value counts as observed.
///
/// Absent values, `false`, numeric zero and the empty string are not; everything else is.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
