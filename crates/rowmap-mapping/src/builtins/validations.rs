//! Built-in row validations
//!
//! Every validation except `required` passes on a null, absent, or empty
//! value, so optional fields are only checked when present.

use chrono::Utc;
use rowmap_schema::constraint::{is_date, is_date_time, is_email, is_phone, is_url};
use rowmap_schema::value::{as_f64, as_text, is_blank};
use rowmap_schema::{FunctionError, FunctionResult};
use serde_json::Value;

use super::conditions::{matches_pattern, pattern_arg};
use super::dates::parse_temporal;
use super::lists::contains_loosely;
use crate::numeric::{arg_f64, arg_usize};
use crate::registry::FunctionRegistry;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_validation("required", |v, _| Ok(is_present(v)))
        .register_value_validation("email", |v, _| Ok(check_text(v, is_email)))
        .register_value_validation("phone", |v, _| Ok(check_text(v, is_phone)))
        .register_value_validation("url", |v, _| Ok(check_text(v, is_url)))
        .register_value_validation("date", |v, _| {
            Ok(check_text(v, |s| is_date(s) || is_date_time(s)))
        })
        .register_value_validation("number", |v, _| Ok(is_blank(v) || as_f64(v).is_some()))
        .register_value_validation("integer", |v, _| {
            Ok(is_blank(v) || as_f64(v).is_some_and(|n| n.fract() == 0.0))
        })
        .register_value_validation("boolean", |v, _| {
            Ok(match v {
                Value::Bool(_) => true,
                Value::String(s) => s.is_empty() || s == "true" || s == "false",
                other => other.is_null(),
            })
        })
        .register_value_validation("minLength", |v, args| {
            let min = arg_usize(args, 0, "minLength")?;
            Ok(length(v).is_none_or(|len| len >= min))
        })
        .register_value_validation("maxLength", |v, args| {
            let max = arg_usize(args, 0, "maxLength")?;
            Ok(length(v).is_none_or(|len| len <= max))
        })
        .register_value_validation("pattern", |v, args| {
            let pattern = pattern_arg(args, "pattern")?;
            if is_blank(v) {
                return Ok(true);
            }
            matches_pattern(v, &pattern)
        })
        .register_value_validation("min", |v, args| {
            let min = arg_f64(args, 0, "min")?;
            check_number(v, |n| n >= min)
        })
        .register_value_validation("max", |v, args| {
            let max = arg_f64(args, 0, "max")?;
            check_number(v, |n| n <= max)
        })
        .register_value_validation("range", |v, args| {
            let min = arg_f64(args, 0, "range")?;
            let max = arg_f64(args, 1, "range")?;
            check_number(v, |n| (min..=max).contains(&n))
        })
        .register_value_validation("oneOf", |v, args| {
            Ok(is_blank(v) || contains_loosely(args, v))
        })
        .register_value_validation("positive", |v, _| check_number(v, |n| n > 0.0))
        .register_value_validation("futureDate", |v, _| {
            if is_blank(v) {
                return Ok(true);
            }
            Ok(parse_temporal(v).is_some_and(|t| t.instant() > Utc::now()))
        });
}

/// Not null, absent, empty, or whitespace-only
#[must_use]
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        other => !is_blank(other),
    }
}

fn check_text(value: &Value, check: impl Fn(&str) -> bool) -> bool {
    if is_blank(value) {
        return true;
    }
    as_text(value).is_some_and(|s| check(s.trim()))
}

/// Characters of a string or items of an array; `None` when blank
fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn check_number(value: &Value, check: impl Fn(f64) -> bool) -> FunctionResult<bool> {
    if is_blank(value) {
        return Ok(true);
    }
    as_f64(value)
        .map(check)
        .ok_or_else(|| FunctionError::new(format!("{value} is not a number")))
}
