//! Helpers over `serde_json::Value`

use serde_json::Value;

/// Whether a value counts as "missing" for defaulting and required checks:
/// null or the empty string. `0` and `false` are not blank.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Same as [`is_blank`], treating an absent value as blank.
#[must_use]
pub fn is_blank_opt(value: Option<&Value>) -> bool {
    value.is_none_or(is_blank)
}

/// Textual form of a scalar value. Arrays, objects and null have none.
#[must_use]
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric view of a value; numeric strings are parsed.
#[must_use]
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Name of the JSON type, for messages
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert an `f64` into a JSON number, preferring an integer representation
/// when the value has no fractional part.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Value::from(value as i64);
    }
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}
