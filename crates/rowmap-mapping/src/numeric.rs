//! Argument coercion shared by the built-in functions

use rowmap_schema::value::{as_f64, as_text};
use rowmap_schema::{FunctionError, FunctionResult};
use serde_json::Value;

/// Read a numeric argument; numeric strings are accepted
pub(crate) fn value_to_f64(value: &Value, arg_label: &str) -> FunctionResult<f64> {
    as_f64(value).ok_or_else(|| {
        FunctionError::new(format!("Cannot parse {arg_label} argument as number"))
    })
}

/// Required argument at `index`, as text
pub(crate) fn arg_text(args: &[Value], index: usize, func: &str) -> FunctionResult<String> {
    args.get(index)
        .and_then(as_text)
        .ok_or_else(|| FunctionError::new(format!("{func} requires argument #{}", index + 1)))
}

/// Optional argument at `index`, as text
pub(crate) fn opt_arg_text(args: &[Value], index: usize) -> Option<String> {
    args.get(index).and_then(as_text)
}

/// Required numeric argument at `index`
pub(crate) fn arg_f64(args: &[Value], index: usize, func: &str) -> FunctionResult<f64> {
    let value = args
        .get(index)
        .ok_or_else(|| FunctionError::new(format!("{func} requires argument #{}", index + 1)))?;
    value_to_f64(value, &format!("{func} #{}", index + 1))
}

/// Required non-negative integer argument at `index`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn arg_usize(args: &[Value], index: usize, func: &str) -> FunctionResult<usize> {
    let n = arg_f64(args, index, func)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(FunctionError::new(format!(
            "{func} argument #{} must be a non-negative integer",
            index + 1
        )));
    }
    Ok(n as usize)
}
