//! Numeric transforms

use rowmap_schema::value::{is_blank, number, type_name};
use rowmap_schema::{FunctionError, FunctionResult};
use serde_json::Value;

use crate::numeric::{arg_f64, value_to_f64};
use crate::registry::FunctionRegistry;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_transform("parseNumber", |v, _| transform_parse_number(v))
        .register_value_transform("parseInt", |v, _| transform_parse_int(v))
        .register_value_transform("round", |v, args| {
            let digits = match args.first() {
                Some(_) => arg_f64(args, 0, "round")?,
                None => 0.0,
            };
            transform_round(v, digits)
        })
        .register_value_transform("clamp", |v, args| {
            transform_clamp(v, arg_f64(args, 0, "clamp")?, arg_f64(args, 1, "clamp")?)
        })
        .register_value_transform("abs", |v, _| map_number(v, "abs", f64::abs))
        .register_value_transform("multiply", |v, args| {
            let factor = arg_f64(args, 0, "multiply")?;
            map_number(v, "multiply", |n| n * factor)
        });
}

fn map_number(value: &Value, func: &str, f: impl FnOnce(f64) -> f64) -> FunctionResult<Value> {
    if is_blank(value) {
        return Ok(Value::Null);
    }
    let n = f(value_to_f64(value, func)?);
    if !n.is_finite() {
        return Err(FunctionError::new(format!("{func} result is out of range")));
    }
    Ok(number(n))
}

fn parse_f64(value: &Value) -> FunctionResult<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            match cleaned.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(FunctionError::new(format!("Cannot parse '{s}' as number"))),
            }
        }
        other => Err(FunctionError::new(format!(
            "Cannot parse {} as number",
            type_name(other)
        ))),
    }
}

/// Parse a number; thousands separators are ignored. Blank becomes null.
///
/// # Errors
///
/// Returns an error for text that is not a number.
pub fn transform_parse_number(value: &Value) -> FunctionResult<Value> {
    Ok(parse_f64(value)?.map_or(Value::Null, number))
}

/// Parse a number and drop its fractional part
///
/// # Errors
///
/// Returns an error for text that is not a number.
pub fn transform_parse_int(value: &Value) -> FunctionResult<Value> {
    Ok(parse_f64(value)?.map_or(Value::Null, |n| number(n.trunc())))
}

/// Round to `digits` decimal places
///
/// # Errors
///
/// Returns an error if the value is not numeric.
pub fn transform_round(value: &Value, digits: f64) -> FunctionResult<Value> {
    let factor = 10f64.powf(digits.trunc());
    map_number(value, "round", |n| (n * factor).round() / factor)
}

/// Limit a number to `[min, max]`
///
/// # Errors
///
/// Returns an error if the value is not numeric or `min > max`.
pub fn transform_clamp(value: &Value, min: f64, max: f64) -> FunctionResult<Value> {
    if min > max {
        return Err(FunctionError::new(format!(
            "clamp bounds are inverted: {min} > {max}"
        )));
    }
    map_number(value, "clamp", |n| n.clamp(min, max))
}
