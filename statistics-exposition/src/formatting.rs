//! Helpers for rendering metrics in the Prometheus exposition format.

use std::fmt;

use serde_json::{Number, Value};

/// Writes a help (description) line in the Prometheus [exposition format].
///
/// [exposition format]: https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md#text-format-details
pub fn write_help_line(buffer: &mut String, name: &str, desc: &str) {
    buffer.push_str("# HELP ");
    buffer.push_str(name);
    buffer.push(' ');
    let desc = sanitize_description(desc);
    buffer.push_str(&desc);
    buffer.push('\n');
}

/// Writes a metric type line in the Prometheus [exposition format].
///
/// [exposition format]: https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md#text-format-details
pub fn write_type_line(buffer: &mut String, name: &str, metric_type: &str) {
    buffer.push_str("# TYPE ");
    buffer.push_str(name);
    buffer.push(' ');
    buffer.push_str(metric_type);
    buffer.push('\n');
}

/// Writes a metric in the Prometheus [exposition format].
///
/// When `suffix` is specified, it is appended to the `name`, which is how the `_bucket`, `_count`
/// and `_sum` series of a histogram are written. `label` would typically be the `le` label of a
/// histogram bucket.
///
/// [exposition format]: https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md#text-format-details
pub fn write_metric_line<T, T2>(
    buffer: &mut String,
    name: &str,
    suffix: Option<&'static str>,
    label: Option<(&'static str, T)>,
    value: T2,
) where
    T: fmt::Display,
    T2: fmt::Display,
{
    buffer.push_str(name);
    if let Some(suffix) = suffix {
        buffer.push('_');
        buffer.push_str(suffix);
    }

    if let Some((name, value)) = label {
        buffer.push('{');
        buffer.push_str(name);
        buffer.push_str("=\"");
        buffer.push_str(value.to_string().as_str());
        buffer.push_str("\"}");
    }

    buffer.push(' ');
    buffer.push_str(value.to_string().as_str());
    buffer.push('\n');
}

/// Writes a sample line for a series whose labels were fixed at registration time.
///
/// `series` is written verbatim, e.g. `arango_threads{status="running"}`.
pub fn write_series_line<T>(buffer: &mut String, series: &str, value: T)
where
    T: fmt::Display,
{
    buffer.push_str(series);
    buffer.push(' ');
    buffer.push_str(value.to_string().as_str());
    buffer.push('\n');
}

/// A scalar snapshot value, displayed the way it appears on a sample line.
#[derive(Clone, Copy, Debug)]
pub struct SampleValue<'a>(&'a Value);

impl<'a> SampleValue<'a> {
    /// Wraps `value`, or returns `None` if it has no scalar rendering.
    pub fn new(value: &'a Value) -> Option<SampleValue<'a>> {
        match value {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Some(SampleValue(value)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for SampleValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Number(n) => write_number(f, n),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            // `SampleValue::new` only admits scalars.
            _ => Ok(()),
        }
    }
}

/// A snapshot number, displayed the way it appears on a sample line.
#[derive(Clone, Copy, Debug)]
pub struct SampleNumber<'a>(pub &'a Number);

impl fmt::Display for SampleNumber<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_number(f, self.0)
    }
}

/// A bucket bound, displayed without a trailing `.0` when integral.
///
/// Magnitudes below `1e-6` or from `1e21` up use exponent notation, such as `1e-7` or `1e+21`.
#[derive(Clone, Copy, Debug)]
pub struct Bound(pub f64);

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_float(f, self.0)
    }
}

/// A running total over snapshot numbers.
///
/// Stays integral for as long as every added number is an unsigned integer and the total fits,
/// so large bucket counts do not lose precision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tally {
    /// Exact integral total.
    Integer(u64),
    /// Floating point total.
    Float(f64),
}

impl Default for Tally {
    fn default() -> Self {
        Tally::Integer(0)
    }
}

impl Tally {
    /// Returns the total after adding `n`.
    pub fn add(self, n: &Number) -> Tally {
        match (self, n.as_u64()) {
            (Tally::Integer(acc), Some(v)) => match acc.checked_add(v) {
                Some(total) => Tally::Integer(total),
                None => Tally::Float(acc as f64 + v as f64),
            },
            (tally, _) => Tally::Float(tally.as_f64() + n.as_f64().unwrap_or(0.0)),
        }
    }

    /// The total as a float.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Tally::Integer(v) => v as f64,
            Tally::Float(v) => v,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tally::Integer(v) => write!(f, "{}", v),
            Tally::Float(v) => write_float(f, *v),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: &Number) -> fmt::Result {
    if let Some(v) = n.as_u64() {
        write!(f, "{}", v)
    } else if let Some(v) = n.as_i64() {
        write!(f, "{}", v)
    } else {
        write_float(f, n.as_f64().unwrap_or(f64::NAN))
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    let magnitude = v.abs();
    if v == 0.0 || !v.is_finite() || (1e-6..1e21).contains(&magnitude) {
        // Shortest round-trip, without a trailing `.0`.
        return write!(f, "{}", v);
    }

    let text = format!("{:e}", v);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            write!(f, "{}e+{}", mantissa, exponent)
        }
        _ => f.write_str(&text),
    }
}

/// Sanitizes a metric description to be valid under the Prometheus [exposition format].
///
/// [exposition format]: https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md#text-format-details
pub fn sanitize_description(value: &str) -> String {
    // All Unicode characters are valid, but backslashes and line feeds must be escaped.
    let mut sanitized = String::with_capacity(value.len());

    let mut previous_backslash = false;
    for c in value.chars() {
        match c {
            // Any raw newlines get escaped, period.
            '\n' => {
                if previous_backslash {
                    previous_backslash = false;
                    sanitized.push_str("\\\\");
                }
                sanitized.push_str("\\n");
            }
            // A backslash is either escaping another backslash or standing on its own. Hold on
            // to it until the next character tells us which.
            '\\' => {
                if previous_backslash {
                    sanitized.push_str("\\\\");
                }
                previous_backslash = !previous_backslash;
            }
            c => {
                if previous_backslash {
                    previous_backslash = false;
                    sanitized.push_str("\\\\");
                }
                sanitized.push(c);
            }
        }
    }

    // Handle any dangling backslash by writing it out in an escaped fashion.
    if previous_backslash {
        sanitized.push_str("\\\\");
    }

    sanitized
}
