//! Row validator
//!
//! Runs a schema's row-level rules against a transformed record. Rule
//! failures and rule errors are both reported as issues; validation itself
//! never fails.

use rowmap_mapping::FunctionRegistry;
use rowmap_schema::{Severity, TransformContext, ValidationRule};
use serde_json::Value;
use tracing::trace;

use crate::reporter::{TransformationError, TransformationWarning};

/// Issues produced for one row
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<TransformationError>,
    pub warnings: Vec<TransformationWarning>,
}

impl ValidationResult {
    /// Check if there are any errors
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if there are any warnings
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Route an issue by its severity
    pub fn push(&mut self, issue: TransformationError) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

/// Validator for transformed records
pub struct RowValidator<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> RowValidator<'r> {
    #[must_use]
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Check every rule against `record`
    ///
    /// Fields missing from the record are checked as null. Issues carry
    /// the row number of `context`.
    pub fn validate_row(
        &self,
        rules: &[ValidationRule],
        record: &Value,
        context: &mut TransformContext<'_>,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();
        let row = context.row_number();

        for rule in rules {
            let value = rule.field.get(record).cloned().unwrap_or(Value::Null);
            match self
                .registry
                .evaluate_validation(&rule.rule, &value, record, context)
            {
                Ok(true) => {}
                Ok(false) => {
                    trace!("Row {}: rule '{}' failed on '{}'", row, rule.rule, rule.field);
                    result.push(
                        TransformationError::new(row, rule.message.clone())
                            .with_field(rule.field.as_str())
                            .with_severity(rule.severity)
                            .with_value(value),
                    );
                }
                Err(err) => {
                    result.push(
                        TransformationError::new(
                            row,
                            format!("Validation rule '{}' could not run: {err}", rule.rule),
                        )
                        .with_field(rule.field.as_str())
                        .with_value(value),
                    );
                }
            }
        }

        result
    }
}
