//! Row transformer
//!
//! Applies a schema's field mappings, in declared order, to one row.

use rowmap_schema::value::is_blank_opt;
use rowmap_schema::{DataMappingSchema, FieldMapping, TransformContext};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::registry::FunctionRegistry;
use crate::{Error, Result};

/// Runtime for mapping single rows
pub struct RowTransformer<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> RowTransformer<'r> {
    /// Create a transformer resolving functions through `registry`
    #[must_use]
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Registry used to resolve function names
    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        self.registry
    }

    /// Map `context.row` into a new record
    ///
    /// Errors in optional mappings drop that field and are logged at debug
    /// level. Errors in required mappings, and unknown function names in
    /// any mapping, reject the whole row.
    ///
    /// # Errors
    ///
    /// Returns the row-fatal error, tagged with the target field path.
    pub fn transform_row(
        &self,
        schema: &DataMappingSchema,
        context: &mut TransformContext<'_>,
    ) -> Result<Value> {
        let mut record = Value::Object(Map::new());

        for mapping in &schema.fields {
            if let Err(err) = self.apply_mapping(mapping, &mut record, context) {
                let err = err.in_field(mapping.target.as_str());
                if mapping.required || err.is_configuration() {
                    return Err(err);
                }
                debug!(
                    "Row {}: dropping optional field '{}': {}",
                    context.row_number(),
                    mapping.target,
                    err
                );
            }
        }

        Ok(record)
    }

    /// Apply one mapping, writing into `record`
    fn apply_mapping(
        &self,
        mapping: &FieldMapping,
        record: &mut Value,
        context: &mut TransformContext<'_>,
    ) -> Result<()> {
        let row = context.row;
        let mut value = mapping.source.get(row).cloned();

        if let Some(condition) = &mapping.condition {
            let probe = value.clone().unwrap_or(Value::Null);
            if !self
                .registry
                .evaluate_condition(condition, &probe, row, context)?
            {
                trace!("Condition '{}' skipped '{}'", condition, mapping.target);
                return Ok(());
            }
        }

        if is_blank_opt(value.as_ref()) {
            if let Some(default) = &mapping.default_value {
                value = Some(default.clone());
            }
        }

        if let Some(transform) = &mapping.transform {
            let input = value.unwrap_or(Value::Null);
            value = Some(
                self.registry
                    .apply_transform(transform, input, row, context)?,
            );
        }

        if mapping.required && is_blank_opt(value.as_ref()) {
            return Err(Error::RequiredField {
                field: mapping.target.to_string(),
            });
        }

        if let Some(constraint) = &mapping.validation {
            let result = constraint.check(value.as_ref());
            if !result.is_valid {
                return Err(Error::InvalidField {
                    field: mapping.target.to_string(),
                    message: result
                        .message
                        .unwrap_or_else(|| "Value failed validation".to_string()),
                    value: value.unwrap_or(Value::Null),
                });
            }
        }

        match value {
            Some(value) => mapping.target.set(record, value)?,
            None => trace!("No value for '{}'", mapping.target),
        }
        Ok(())
    }
}
