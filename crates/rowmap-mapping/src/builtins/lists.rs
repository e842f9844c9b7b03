//! Array, boolean, default-value, and lookup transforms

use rowmap_schema::value::{as_text, is_blank};
use rowmap_schema::{FunctionError, FunctionResult, TransformContext};
use serde_json::Value;

use super::{loosely_equal, row_field};
use crate::numeric::{arg_text, opt_arg_text};
use crate::registry::FunctionRegistry;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_transform("split", |v, args| {
            let delimiter = opt_arg_text(args, 0).unwrap_or_else(|| ",".to_string());
            transform_split(v, &delimiter)
        })
        .register_value_transform("join", |v, args| {
            let separator = opt_arg_text(args, 0).unwrap_or_else(|| ", ".to_string());
            transform_join(v, &separator)
        })
        .register_value_transform("unique", |v, _| Ok(transform_unique(v)))
        .register_value_transform("first", |v, _| Ok(transform_first(v)))
        .register_value_transform("toBoolean", |v, _| transform_to_boolean(v))
        .register_value_transform("default", |v, args| {
            let fallback = args
                .first()
                .ok_or_else(|| FunctionError::new("default requires a value"))?;
            Ok(transform_default(v, fallback))
        })
        .register_transform("coalesce", |v, row, _, args| transform_coalesce(v, row, args))
        .register_value_transform("nullIfEmpty", |v, _| Ok(transform_null_if_empty(v)))
        .register_transform("lookup", |v, _, ctx, args| transform_lookup(v, ctx, args));
}

/// Split text into trimmed, non-empty parts; arrays pass through
///
/// # Errors
///
/// Returns an error for objects.
pub fn transform_split(value: &Value, delimiter: &str) -> FunctionResult<Value> {
    match value {
        Value::Null | Value::Array(_) => Ok(value.clone()),
        Value::Object(_) => Err(FunctionError::new("split expects a string")),
        other => {
            let text = as_text(other).unwrap_or_default();
            let parts = text
                .split(delimiter)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect();
            Ok(Value::Array(parts))
        }
    }
}

/// Join the scalar items of an array; null items are skipped
///
/// # Errors
///
/// Returns an error for arrays holding objects or arrays.
pub fn transform_join(value: &Value, separator: &str) -> FunctionResult<Value> {
    let Value::Array(items) = value else {
        return Ok(value.clone());
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items.iter().filter(|item| !item.is_null()) {
        parts.push(
            as_text(item).ok_or_else(|| FunctionError::new("join expects scalar items"))?,
        );
    }
    Ok(Value::String(parts.join(separator)))
}

/// Drop repeated array items, keeping the first occurrence
#[must_use]
pub fn transform_unique(value: &Value) -> Value {
    let Value::Array(items) = value else {
        return value.clone();
    };
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(item) {
            unique.push(item.clone());
        }
    }
    Value::Array(unique)
}

/// First array item, or null for an empty array
#[must_use]
pub fn transform_first(value: &Value) -> Value {
    match value {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Interpret common yes/no spellings. Blank becomes null.
///
/// # Errors
///
/// Returns an error for text that is not a recognized spelling.
pub fn transform_to_boolean(value: &Value) -> FunctionResult<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|n| n != 0.0))),
        _ if is_blank(value) => Ok(Value::Null),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "0" | "off" => Ok(Value::Bool(false)),
            _ => Err(FunctionError::new(format!("Cannot interpret '{s}' as a boolean"))),
        },
        _ => Err(FunctionError::new("toBoolean expects a scalar")),
    }
}

/// Replace a null or empty value
#[must_use]
pub fn transform_default(value: &Value, fallback: &Value) -> Value {
    if is_blank(value) {
        fallback.clone()
    } else {
        value.clone()
    }
}

/// The value if it is not blank, else the first non-blank row field
///
/// # Errors
///
/// Returns an error if a path argument is malformed.
pub fn transform_coalesce(value: &Value, row: &Value, paths: &[Value]) -> FunctionResult<Value> {
    if !is_blank(value) {
        return Ok(value.clone());
    }
    for path in paths {
        let path = as_text(path)
            .ok_or_else(|| FunctionError::new("coalesce arguments must be field paths"))?;
        if let Some(found) = row_field(row, &path)?.filter(|v| !is_blank(v)) {
            return Ok(found.clone());
        }
    }
    Ok(Value::Null)
}

/// Null for empty or whitespace-only text and empty arrays
#[must_use]
pub fn transform_null_if_empty(value: &Value) -> Value {
    match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::Array(items) if items.is_empty() => Value::Null,
        other => other.clone(),
    }
}

/// Map a value through `key=value` pairs, matching keys case-insensitively.
/// A `*=fallback` pair catches everything else; without it unmatched values
/// pass through. Results are memoized in the row cache.
///
/// # Errors
///
/// Returns an error if an argument is not a `key=value` pair.
pub fn transform_lookup(
    value: &Value,
    context: &mut TransformContext<'_>,
    pairs: &[Value],
) -> FunctionResult<Value> {
    if pairs.is_empty() {
        return Err(FunctionError::new("lookup requires at least one key=value pair"));
    }
    let Some(needle) = as_text(value) else {
        return Ok(value.clone());
    };
    let needle = needle.trim().to_lowercase();

    let table: Vec<String> = pairs.iter().filter_map(as_text).collect();
    let cache_key = format!("lookup:{}:{needle}", table.join(","));
    let original = value.clone();

    context.cached(cache_key, move || {
        let mut fallback = None;
        for (index, pair) in table.iter().enumerate() {
            let (key, mapped) = pair.split_once('=').ok_or_else(|| {
                FunctionError::new(format!("lookup argument #{} must be key=value", index + 1))
            })?;
            let key = key.trim();
            if key == "*" {
                fallback = Some(mapped.trim());
            } else if key.to_lowercase() == needle {
                return Ok(Value::String(mapped.trim().to_string()));
            }
        }
        Ok(fallback.map_or(original, |f| Value::String(f.to_string())))
    })
}

/// Whether `value` equals any candidate, comparing scalars by text too
pub(crate) fn contains_loosely(candidates: &[Value], value: &Value) -> bool {
    candidates.iter().any(|c| loosely_equal(c, value))
}

/// Read a required path argument
pub(crate) fn path_arg(args: &[Value], func: &str) -> FunctionResult<String> {
    arg_text(args, 0, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_split_and_join() {
        assert_eq!(
            transform_split(&json!(" a, b,,c "), ",").unwrap(),
            json!(["a", "b", "c"])
        );
        assert_eq!(transform_split(&json!("a|b"), "|").unwrap(), json!(["a", "b"]));
        assert_eq!(
            transform_join(&json!(["a", null, 2]), "-").unwrap(),
            json!("a-2")
        );
        assert!(transform_join(&json!([{"a": 1}]), ",").is_err());
    }

    #[test]
    fn test_unique_and_first() {
        assert_eq!(transform_unique(&json!([1, 2, 1, 3, 2])), json!([1, 2, 3]));
        assert_eq!(transform_first(&json!(["x", "y"])), json!("x"));
        assert_eq!(transform_first(&json!([])), Value::Null);
    }

    #[test]
    fn test_to_boolean() {
        assert_eq!(transform_to_boolean(&json!("Yes")).unwrap(), json!(true));
        assert_eq!(transform_to_boolean(&json!("off")).unwrap(), json!(false));
        assert_eq!(transform_to_boolean(&json!(0)).unwrap(), json!(false));
        assert_eq!(transform_to_boolean(&json!("")).unwrap(), Value::Null);
        assert!(transform_to_boolean(&json!("maybe")).is_err());
    }

    #[test]
    fn test_default_and_coalesce() {
        assert_eq!(transform_default(&json!(""), &json!("x")), json!("x"));
        assert_eq!(transform_default(&json!(0), &json!("x")), json!(0));

        let row = json!({"nick": "", "alias": "Ace"});
        assert_eq!(
            transform_coalesce(&Value::Null, &row, &[json!("nick"), json!("alias")]).unwrap(),
            json!("Ace")
        );
        assert_eq!(
            transform_coalesce(&json!("Bo"), &row, &[json!("alias")]).unwrap(),
            json!("Bo")
        );
    }

    #[test]
    fn test_null_if_empty() {
        assert_eq!(transform_null_if_empty(&json!("  ")), Value::Null);
        assert_eq!(transform_null_if_empty(&json!([])), Value::Null);
        assert_eq!(transform_null_if_empty(&json!("a")), json!("a"));
    }

    #[test]
    fn test_lookup_with_fallback_and_cache() {
        let rows = [json!({})];
        let mut metadata = Map::new();
        let mut ctx = TransformContext::new(&rows, &rows[0], 0, &[], &mut metadata);
        let pairs = [json!("GK=goalkeeper"), json!("FW=forward"), json!("*=unknown")];

        assert_eq!(
            transform_lookup(&json!(" gk "), &mut ctx, &pairs).unwrap(),
            json!("goalkeeper")
        );
        assert_eq!(
            transform_lookup(&json!("xx"), &mut ctx, &pairs).unwrap(),
            json!("unknown")
        );
        assert_eq!(ctx.cache.len(), 2);
    }

    #[test]
    fn test_lookup_passes_through_without_fallback() {
        let rows = [json!({})];
        let mut metadata = Map::new();
        let mut ctx = TransformContext::new(&rows, &rows[0], 0, &[], &mut metadata);
        assert_eq!(
            transform_lookup(&json!("other"), &mut ctx, &[json!("a=b")]).unwrap(),
            json!("other")
        );
        assert!(transform_lookup(&json!("a"), &mut ctx, &[json!("nope")]).is_err());
    }
}
