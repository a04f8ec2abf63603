//! Scientific notation encoder
//!
//! Renders a [`serde_json::Value`] tree as text, writing every number above
//! 1000 in exponential form (`1.200000e+04`). The output is meant for logs and
//! generated documentation; it is not guaranteed to parse back as JSON.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Number, Value};

/// Indentation width used when none is configured
pub const DEFAULT_INDENT: usize = 4;

/// Numbers strictly above this threshold are written in exponential form
pub const SCIENTIFIC_THRESHOLD: f64 = 1e3;

/// Separator between chunks of a fallback (string / null) encoding
pub const FALLBACK_SEPARATOR: &str = "\n, ";

/// Recursive encoder for config dumps
///
/// Mappings are spread over several lines, one item per line, while sequences
/// stay on a single line. Elements of a sequence are always encoded as if they
/// were at the top level, so a mapping inside a list is indented from column 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScientificEncoder {
    indent: Option<usize>,
}

impl ScientificEncoder {
    /// Create encoder with the default indent
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { indent: None }
    }

    /// Create encoder with a custom indent width
    #[inline]
    #[must_use]
    pub fn with_indent(indent: usize) -> Self {
        Self {
            indent: Some(indent),
        }
    }

    /// Effective indent width
    #[inline]
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent.unwrap_or(DEFAULT_INDENT)
    }

    /// Encode a value tree
    #[must_use]
    pub fn encode(&self, value: &Value) -> String {
        self.encode_at(value, 0)
    }

    fn encode_at(&self, value: &Value, level: usize) -> String {
        let indent = self.indent();
        match value {
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => format_number(number),
            Value::Object(map) => {
                let prefix_close = " ".repeat(level * indent);
                let prefix = " ".repeat((level + 1) * indent);
                let items: Vec<String> = map
                    .iter()
                    .map(|(key, item)| {
                        format!("\n{prefix}\"{key}\": {}", self.encode_at(item, level + 1))
                    })
                    .collect();
                format!("{{{}\n{prefix_close}}}", items.join(", "))
            }
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|item| self.encode_at(item, 0)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::String(_) | Value::Null => {
                // The standard encoding of a scalar is always a single chunk
                let chunks = [standard_encoding(value)];
                chunks.join(FALLBACK_SEPARATOR)
            }
        }
    }
}

/// Encode a value tree with the default indent
///
/// # Examples
/// ```
/// # use cfgkit_encode::encode_scientific;
/// # use serde_json::json;
/// assert_eq!(encode_scientific(&json!(12000)), "1.200000e+04");
/// assert_eq!(encode_scientific(&json!(500)), "500");
/// assert_eq!(encode_scientific(&json!(true)), "true");
/// ```
#[inline]
#[must_use]
pub fn encode_scientific(value: &Value) -> String {
    ScientificEncoder::new().encode(value)
}

/// Serialize any value and encode it with the default indent
///
/// Fields keep their serialization order.
///
/// # Errors
/// Returns error if `value` cannot be represented as a JSON tree
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let tree = serde_json::to_value(value)?;
    Ok(encode_scientific(&tree))
}

/// Format a number: exponential above the threshold, plain otherwise
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_number(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return if int > 1000 {
            exponential(int as f64)
        } else {
            int.to_string()
        };
    }
    if let Some(uint) = number.as_u64() {
        return if uint > 1000 {
            exponential(uint as f64)
        } else {
            uint.to_string()
        };
    }
    match number.as_f64() {
        Some(float) if float > SCIENTIFIC_THRESHOLD => exponential(float),
        Some(float) => float_repr(float),
        None => number.to_string(),
    }
}

/// Six fractional digits, lowercase `e`, signed exponent of at least two digits
fn exponential(value: f64) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }
    let raw = format!("{value:.6e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => with_signed_exponent(mantissa, exponent),
        None => raw,
    }
}

/// Shortest round-trip form; exponential outside `1e-4 <= |x| < 1e16`
fn float_repr(value: f64) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }
    if value == 0.0 {
        let zero = if value.is_sign_negative() { "-0.0" } else { "0.0" };
        return zero.to_string();
    }

    let shortest = format!("{value:e}");
    let Some((mantissa, exponent)) = shortest.split_once('e') else {
        return shortest;
    };
    let magnitude: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&magnitude) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        with_signed_exponent(mantissa, exponent)
    }
}

fn with_signed_exponent(mantissa: &str, exponent: &str) -> String {
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_sign_negative() {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

/// Standard JSON encoding of a scalar, escaped to ASCII
fn standard_encoding(value: &Value) -> String {
    match value {
        Value::String(text) => ascii_string(text),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn ascii_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // Writing to a String cannot fail
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
        }
    }
    out.push('"');
    out
}
