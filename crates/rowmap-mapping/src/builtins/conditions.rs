//! Built-in conditions
//!
//! Conditions decide whether a field mapping applies and which rows a
//! `filter` global transform keeps.

use dashmap::DashMap;
use regex::Regex;
use rowmap_schema::constraint::is_email;
use rowmap_schema::value::{as_f64, as_text, is_blank};
use rowmap_schema::{FunctionError, FunctionResult};
use serde_json::Value;
use std::sync::LazyLock;

use super::lists::{contains_loosely, path_arg};
use super::{loosely_equal, row_field};
use crate::numeric::arg_text;
use crate::registry::FunctionRegistry;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_condition("exists", |v, _| Ok(!v.is_null()))
        .register_value_condition("notEmpty", |v, _| Ok(!is_empty(v)))
        .register_value_condition("isEmpty", |v, _| Ok(is_empty(v)))
        .register_value_condition("equals", |v, args| {
            Ok(args.first().is_some_and(|expected| loosely_equal(v, expected)))
        })
        .register_value_condition("notEquals", |v, args| {
            Ok(!args.first().is_some_and(|expected| loosely_equal(v, expected)))
        })
        .register_value_condition("in", |v, args| Ok(contains_loosely(args, v)))
        .register_value_condition("matches", |v, args| {
            matches_pattern(v, &pattern_arg(args, "matches")?)
        })
        .register_value_condition("isNumber", |v, _| Ok(as_f64(v).is_some()))
        .register_value_condition("isEmail", |v, _| {
            Ok(as_text(v).is_some_and(|s| is_email(s.trim())))
        })
        .register_condition("fieldEquals", |_, row, _, args| {
            let path = path_arg(args, "fieldEquals")?;
            let expected = args
                .get(1)
                .ok_or_else(|| FunctionError::new("fieldEquals requires a value"))?;
            Ok(row_field(row, &path)?.is_some_and(|found| loosely_equal(found, expected)))
        })
        .register_condition("fieldExists", |_, row, _, args| {
            let path = path_arg(args, "fieldExists")?;
            Ok(row_field(row, &path)?.is_some_and(|found| !found.is_null()))
        })
        .register_value_condition("always", |_, _| Ok(true))
        .register_value_condition("never", |_, _| Ok(false));
}

/// Blank, whitespace-only, or an empty array/object
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        other => is_blank(other),
    }
}

/// Whether the text of `value` matches `pattern`; non-text never matches
///
/// # Errors
///
/// Returns an error if the pattern is not a valid regex.
pub fn matches_pattern(value: &Value, pattern: &str) -> FunctionResult<bool> {
    let re = compiled(pattern)?;
    Ok(as_text(value).is_some_and(|text| re.is_match(&text)))
}

/// Compiled patterns, shared by every run in the process
static PATTERNS: LazyLock<DashMap<String, Regex>> = LazyLock::new(DashMap::new);

fn compiled(pattern: &str) -> FunctionResult<Regex> {
    if let Some(re) = PATTERNS.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)
        .map_err(|e| FunctionError::new(format!("Invalid pattern '{pattern}': {e}")))?;
    PATTERNS.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// The pattern argument of `func`
///
/// Reference arguments are split on `,`, so a pattern such as `^\d{2,3}$`
/// arrives in pieces; they are joined back together here.
pub(crate) fn pattern_arg(args: &[Value], func: &str) -> FunctionResult<String> {
    if args.is_empty() {
        return Err(FunctionError::new(format!("{func} requires a pattern")));
    }
    let parts = (0..args.len())
        .map(|index| arg_text(args, index, func))
        .collect::<FunctionResult<Vec<_>>>()?;
    Ok(parts.join(","))
}
