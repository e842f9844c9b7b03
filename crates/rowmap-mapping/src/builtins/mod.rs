//! Built-in functions
//!
//! Each submodule exposes its functions as plain `transform_*` /
//! `is_*` helpers and registers them under their schema names.

pub mod conditions;
pub mod dates;
pub mod domain;
pub mod lists;
pub mod numbers;
pub mod strings;
pub mod validations;

use rowmap_schema::{FieldPath, FunctionError, FunctionResult};
use serde_json::Value;

use crate::registry::FunctionRegistry;

/// Register every built-in transform, condition, and validation
pub fn register_all(registry: &mut FunctionRegistry) {
    strings::register(registry);
    numbers::register(registry);
    dates::register(registry);
    lists::register(registry);
    domain::register(registry);
    conditions::register(registry);
    validations::register(registry);
}

/// Read another field of the row; absent fields read as `None`
pub(crate) fn row_field<'v>(row: &'v Value, path: &str) -> FunctionResult<Option<&'v Value>> {
    let path = FieldPath::parse(path).map_err(|e| FunctionError::new(e.to_string()))?;
    Ok(path.get(row))
}

/// Equality that also matches scalars with the same text (`"1"` and `1`)
pub(crate) fn loosely_equal(a: &Value, b: &Value) -> bool {
    use rowmap_schema::value::as_text;

    if a == b {
        return true;
    }
    match (as_text(a), as_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FunctionKind;
    use serde_json::json;

    #[test]
    fn test_register_all_covers_each_kind() {
        let registry = FunctionRegistry::with_builtins();
        for name in ["trim", "upper", "uppercase", "mapRole", "parseDate", "lookup", "concat"] {
            assert!(registry.contains(FunctionKind::Transform, name), "{name}");
        }
        for name in ["exists", "notEmpty", "fieldExists", "always"] {
            assert!(registry.contains(FunctionKind::Condition, name), "{name}");
        }
        for name in ["required", "email", "minLength", "futureDate"] {
            assert!(registry.contains(FunctionKind::Validation, name), "{name}");
        }
    }

    #[test]
    fn test_row_field() {
        let row = json!({"a": {"b": 1}});
        assert_eq!(row_field(&row, "a.b").unwrap(), Some(&json!(1)));
        assert_eq!(row_field(&row, "a.c").unwrap(), None);
        assert!(row_field(&row, "a..b").is_err());
    }

    #[test]
    fn test_loosely_equal() {
        assert!(loosely_equal(&json!(1), &json!("1")));
        assert!(loosely_equal(&json!(true), &json!("true")));
        assert!(!loosely_equal(&json!(null), &json!("null")));
        assert!(!loosely_equal(&json!([1]), &json!("1")));
    }
}
