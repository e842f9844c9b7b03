//! Per-row execution context

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::function::FunctionResult;
use crate::model::FieldMapping;

/// Context handed to every function while one row is processed
///
/// A context is created fresh for each row and dropped afterwards. The
/// `metadata` bag is borrowed from the run, so values written there by one
/// row are visible to the rows after it. `cache` lives only as long as the
/// row does.
#[derive(Debug)]
pub struct TransformContext<'a> {
    /// The working collection (after global transforms)
    pub collection: &'a [Value],

    /// The row being processed
    pub row: &'a Value,

    /// 0-based index of `row` in `collection`
    pub index: usize,

    /// Field mappings of the schema being applied
    pub field_mappings: &'a [FieldMapping],

    /// Run-wide metadata shared across rows
    pub metadata: &'a mut Map<String, Value>,

    /// Memoized lookups for this row only
    pub cache: HashMap<String, Value>,
}

impl<'a> TransformContext<'a> {
    /// Create a context for one row
    pub fn new(
        collection: &'a [Value],
        row: &'a Value,
        index: usize,
        field_mappings: &'a [FieldMapping],
        metadata: &'a mut Map<String, Value>,
    ) -> Self {
        Self {
            collection,
            row,
            index,
            field_mappings,
            metadata,
            cache: HashMap::new(),
        }
    }

    /// 1-based row number used in error reports
    #[must_use]
    pub fn row_number(&self) -> usize {
        self.index + 1
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the error from `compute`; nothing is cached in that case.
    pub fn cached(
        &mut self,
        key: impl Into<String>,
        compute: impl FnOnce() -> FunctionResult<Value>,
    ) -> FunctionResult<Value> {
        let key = key.into();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let value = compute()?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionError;
    use serde_json::json;

    #[test]
    fn test_row_number_is_one_based() {
        let rows = vec![json!({"a": 1}), json!({"a": 2})];
        let mut metadata = Map::new();
        let context = TransformContext::new(&rows, &rows[1], 1, &[], &mut metadata);
        assert_eq!(context.row_number(), 2);
        assert_eq!(context.row, &json!({"a": 2}));
    }

    #[test]
    fn test_cached_computes_once() {
        let rows = vec![json!({})];
        let mut metadata = Map::new();
        let mut context = TransformContext::new(&rows, &rows[0], 0, &[], &mut metadata);

        let mut calls = 0;
        let first = context
            .cached("k", || {
                calls += 1;
                Ok(json!("v"))
            })
            .unwrap();
        let second = context
            .cached("k", || Err(FunctionError::new("should not run")))
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_metadata_outlives_context() {
        let rows = vec![json!({})];
        let mut metadata = Map::new();
        {
            let mut context = TransformContext::new(&rows, &rows[0], 0, &[], &mut metadata);
            context.metadata.insert("seen".to_string(), json!(1));
        }
        assert_eq!(metadata.get("seen"), Some(&json!(1)));
    }
}
