//! String transforms
//!
//! Null passes through every string transform unchanged. Numbers and
//! booleans are treated as their text form; arrays and objects are rejected.

use rowmap_schema::value::{as_text, is_blank};
use rowmap_schema::{FunctionError, FunctionResult};
use serde_json::Value;

use super::row_field;
use crate::numeric::{arg_text, arg_usize, opt_arg_text};
use crate::registry::FunctionRegistry;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_transform("trim", |v, _| transform_trim(v))
        .register_value_transform("upper", |v, _| transform_uppercase(v))
        .register_value_transform("uppercase", |v, _| transform_uppercase(v))
        .register_value_transform("lower", |v, _| transform_lowercase(v))
        .register_value_transform("lowercase", |v, _| transform_lowercase(v))
        .register_value_transform("titleCase", |v, _| transform_title_case(v))
        .register_value_transform("capitalize", |v, _| transform_capitalize(v))
        .register_value_transform("normalizeWhitespace", |v, _| {
            transform_normalize_whitespace(v)
        })
        .register_value_transform("normalizeEmail", |v, _| transform_normalize_email(v))
        .register_value_transform("emailDomain", |v, _| transform_email_domain(v))
        .register_value_transform("normalizePhone", |v, args| {
            let country = opt_arg_text(args, 0).unwrap_or_else(|| "+1".to_string());
            transform_normalize_phone(v, &country)
        })
        .register_value_transform("replace", |v, args| {
            let from = arg_text(args, 0, "replace")?;
            let to = opt_arg_text(args, 1).unwrap_or_default();
            transform_replace(v, &from, &to)
        })
        .register_value_transform("truncate", |v, args| {
            transform_truncate(v, arg_usize(args, 0, "truncate")?)
        })
        .register_value_transform("slug", |v, _| transform_slug(v))
        .register_transform("concat", |_, row, _, args| transform_concat(row, args))
        .register_transform("field", |_, row, _, args| {
            let path = arg_text(args, 0, "field")?;
            Ok(row_field(row, &path)?.cloned().unwrap_or(Value::Null))
        });
}

fn map_text(value: &Value, func: &str, f: impl FnOnce(&str) -> String) -> FunctionResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(f(s))),
        other => as_text(other)
            .map(|s| Value::String(f(&s)))
            .ok_or_else(|| FunctionError::new(format!("{func} expects a string"))),
    }
}

/// Trim surrounding whitespace
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_trim(value: &Value) -> FunctionResult<Value> {
    map_text(value, "trim", |s| s.trim().to_string())
}

/// Convert string to uppercase
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_uppercase(value: &Value) -> FunctionResult<Value> {
    map_text(value, "upper", str::to_uppercase)
}

/// Convert string to lowercase
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_lowercase(value: &Value) -> FunctionResult<Value> {
    map_text(value, "lower", str::to_lowercase)
}

/// Upper-case the first letter of every word and lower-case the rest.
/// Words are separated by whitespace, `-` or `'`.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_title_case(value: &Value) -> FunctionResult<Value> {
    map_text(value, "titleCase", |s| {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for ch in s.chars() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = ch.is_whitespace() || ch == '-' || ch == '\'';
        }
        out
    })
}

/// Upper-case the first character only
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_capitalize(value: &Value) -> FunctionResult<Value> {
    map_text(value, "capitalize", |s| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

/// Collapse whitespace runs into single spaces and trim
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_normalize_whitespace(value: &Value) -> FunctionResult<Value> {
    map_text(value, "normalizeWhitespace", |s| {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    })
}

/// Trim and lower-case an email address
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_normalize_email(value: &Value) -> FunctionResult<Value> {
    map_text(value, "normalizeEmail", |s| s.trim().to_lowercase())
}

/// Domain part of an email address, lower-cased; null without an `@`
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_email_domain(value: &Value) -> FunctionResult<Value> {
    let text = map_text(value, "emailDomain", |s| s.trim().to_lowercase())?;
    Ok(match text.as_str().and_then(|s| s.rsplit_once('@')) {
        Some((_, domain)) if !domain.is_empty() => Value::String(domain.to_string()),
        _ => Value::Null,
    })
}

/// Keep digits and a leading `+`. Ten-digit national numbers get the
/// `country` prefix. Values without digits become null.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_normalize_phone(value: &Value, country: &str) -> FunctionResult<Value> {
    let text = map_text(value, "normalizePhone", |s| s.trim().to_string())?;
    let Some(raw) = text.as_str() else {
        return Ok(Value::Null);
    };

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(Value::Null);
    }

    let normalized = if raw.starts_with('+') {
        format!("+{digits}")
    } else if digits.len() == 10 {
        let prefix = if country.starts_with('+') {
            country.to_string()
        } else {
            format!("+{country}")
        };
        format!("{prefix}{digits}")
    } else {
        digits
    };
    Ok(Value::String(normalized))
}

/// Replace every occurrence of `from` with `to`
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_replace(value: &Value, from: &str, to: &str) -> FunctionResult<Value> {
    map_text(value, "replace", |s| s.replace(from, to))
}

/// Keep at most `max_chars` characters
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_truncate(value: &Value, max_chars: usize) -> FunctionResult<Value> {
    map_text(value, "truncate", |s| s.chars().take(max_chars).collect())
}

/// URL-friendly identifier: lower-case alphanumerics joined by `-`
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_slug(value: &Value) -> FunctionResult<Value> {
    map_text(value, "slug", |s| {
        s.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    })
}

/// Join the text of other row fields with a space. Blank fields are
/// skipped; null when nothing is left.
///
/// # Errors
///
/// Returns an error if a path argument is malformed.
pub fn transform_concat(row: &Value, paths: &[Value]) -> FunctionResult<Value> {
    if paths.is_empty() {
        return Err(FunctionError::new("concat requires at least one field path"));
    }

    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        let path = as_text(path)
            .ok_or_else(|| FunctionError::new("concat arguments must be field paths"))?;
        let text = row_field(row, &path)?
            .filter(|value| !is_blank(value))
            .and_then(as_text);
        if let Some(text) = text {
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }

    if parts.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::String(parts.join(" ")))
    }
}
