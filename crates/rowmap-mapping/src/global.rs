//! Global transform stage
//!
//! Reshapes the whole input collection before any row is mapped. Row
//! numbers reported later refer to the collection this stage returns.

use rowmap_schema::{
    ConditionRef, DataMappingSchema, FieldPath, GlobalTransform, SortDirection, TransformContext,
};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::registry::FunctionRegistry;
use crate::{Error, Result};

/// Apply the schema's global transforms in order
///
/// # Errors
///
/// Returns [`Error::GlobalTransform`] when a filter condition is unknown
/// or fails. No partial collection is returned in that case.
pub fn apply_global_transforms(
    registry: &FunctionRegistry,
    schema: &DataMappingSchema,
    rows: &[Value],
    metadata: &mut Map<String, Value>,
) -> Result<Vec<Value>> {
    let mut working = rows.to_vec();

    for transform in &schema.global_transforms {
        let before = working.len();
        working = match transform {
            GlobalTransform::Filter { condition } => {
                filter(registry, condition, working, schema, metadata).map_err(|source| {
                    Error::GlobalTransform {
                        kind: transform.kind(),
                        source: Box::new(source),
                    }
                })?
            }
            GlobalTransform::Sort { field, direction } => sort(working, field, *direction),
            GlobalTransform::Deduplicate { field } => deduplicate(working, field),
            GlobalTransform::Group { parameters } => {
                debug!(
                    "Group transform is reserved; ignoring {} parameter(s)",
                    parameters.len()
                );
                working
            }
        };
        trace!(
            "Global transform '{}': {} -> {} rows",
            transform.kind(),
            before,
            working.len()
        );
    }

    Ok(working)
}

fn filter(
    registry: &FunctionRegistry,
    condition: &ConditionRef,
    rows: Vec<Value>,
    schema: &DataMappingSchema,
    metadata: &mut Map<String, Value>,
) -> Result<Vec<Value>> {
    let mut keep = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let mut context = TransformContext::new(&rows, row, index, &schema.fields, metadata);
        keep.push(registry.evaluate_condition(condition, row, row, &mut context)?);
    }

    Ok(rows
        .into_iter()
        .zip(keep)
        .filter_map(|(row, kept)| kept.then_some(row))
        .collect())
}

fn sort(mut rows: Vec<Value>, field: &FieldPath, direction: SortDirection) -> Vec<Value> {
    rows.sort_by(|a, b| {
        let ordering = compare_keys(field.get(a), field.get(b));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    rows
}

fn deduplicate(rows: Vec<Value>, field: &FieldPath) -> Vec<Value> {
    let mut seen: HashSet<Option<String>> = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(field.get(row).map(Value::to_string)))
        .collect()
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_) | Value::Object(_)) => 4,
    }
}

/// Sort key order: absent and null first, then booleans, numbers, and
/// strings. Arrays and objects sort last and compare equal to each other.
fn compare_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
