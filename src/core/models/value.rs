//! Coercions for attribute values
//!
//! Metadata attributes and constraint options are plain JSON values. Rules
//! written against DICOM data routinely compare a numeric tag with a string
//! option (or the reverse), so comparisons coerce the way the protocol
//! documents expect: numeric strings equal their numbers, absent equals null.

use serde_json::Value;

/// Coerce a value to a number
///
/// Numbers pass through, numeric strings are parsed (an empty string is 0),
/// booleans become 0/1 and null becomes 0. Anything else is not a number.
#[must_use]
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        },
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse the leading integer of a value
///
/// `"12abc"` gives 12, `2.7` gives 2, `"abc"` gives `None`.
#[must_use]
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Loose equality between an attribute value and an option value
///
/// `None` stands for an absent attribute and equals only null or absent.
#[must_use]
pub fn loose_eq(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (None | Some(Value::Null), _) | (_, None | Some(Value::Null)) => false,
        (Some(a), Some(b)) => values_loose_eq(a, b),
    }
}

#[allow(clippy::float_cmp)]
fn values_loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => a == b,
        (Value::Array(_), scalar) | (scalar, Value::Array(_)) => {
            let joined = if let Value::Array(_) = a { display(a) } else { display(b) };
            values_loose_eq(&Value::String(joined), scalar)
        },
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Render a value the way it reads in messages and joined lists
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// `left <= right` with numeric coercion (string pairs compare as text)
///
/// Returns `false` when either side is not comparable.
#[must_use]
pub fn less_or_equal(left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return a <= b;
    }
    match (to_number(left), to_number(right)) {
        (Some(a), Some(b)) => a <= b,
        _ => false,
    }
}
