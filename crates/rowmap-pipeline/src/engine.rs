//! Transformation orchestration
//!
//! A run moves through `Init → GlobalTransform → (TransformRow →
//! ValidateRow)×N → Finalize`. It never returns an error: every problem is
//! collected into the [`TransformationResult`], and a run that has to stop
//! early still returns what it produced so far.

use std::borrow::Cow;
use std::sync::LazyLock;
use std::time::Instant;

use rowmap_mapping::{FunctionKind, FunctionRegistry, RowTransformer, apply_global_transforms};
use rowmap_schema::{DataMappingSchema, FunctionResult, TransformContext};
use rowmap_validation::{RowValidator, TransformationError};
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use crate::options::TransformOptions;
use crate::result::TransformationResult;

static DEFAULT_ENGINE: LazyLock<TransformEngine> = LazyLock::new(TransformEngine::new);

/// Run `schema` over `rows` with the built-in functions only
///
/// Uses a shared engine that cannot be extended. Build a
/// [`TransformEngine`] to register custom functions.
#[must_use]
pub fn transform_data(
    rows: &[Value],
    schema: &DataMappingSchema,
    options: &TransformOptions,
) -> TransformationResult {
    DEFAULT_ENGINE.transform_data(rows, schema, options)
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    GlobalTransform,
    /// 1-based row number
    TransformRow(usize),
    ValidateRow(usize),
    Finalize,
}

/// Applies schemas to row collections
///
/// Owns its function registry. Clone an engine to run it from several
/// threads with different registrations.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    registry: FunctionRegistry,
}

impl TransformEngine {
    /// Engine with every built-in function registered
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::with_builtins())
    }

    #[must_use]
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Register a transform, replacing any function with the same name
    pub fn register_transform(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<Value>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.registry.register_transform(name, func);
        self
    }

    /// Register a condition, replacing any function with the same name
    pub fn register_condition(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.registry.register_condition(name, func);
        self
    }

    /// Register a validation, replacing any function with the same name
    pub fn register_validation(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.registry.register_validation(name, func);
        self
    }

    /// Function names `schema` references that this engine cannot resolve
    #[must_use]
    pub fn check_schema(&self, schema: &DataMappingSchema) -> Vec<(FunctionKind, String)> {
        self.registry.check_schema(schema)
    }

    /// Apply `schema` to `rows`
    #[must_use]
    pub fn transform_data(
        &self,
        rows: &[Value],
        schema: &DataMappingSchema,
        options: &TransformOptions,
    ) -> TransformationResult {
        let mut run = Run::new(rows.len());
        info!(
            "Transforming {} row(s) with schema '{}'",
            rows.len(),
            schema.id
        );

        if let Err(problem) = options.check() {
            run.result
                .errors
                .push(TransformationError::run_level(format!("Invalid options: {problem}")));
            run.stop(format_args!("{problem}"));
            return run.finish();
        }

        if options.fail_fast {
            let unknown = self.check_schema(schema);
            if !unknown.is_empty() {
                for (kind, name) in &unknown {
                    run.result.errors.push(TransformationError::run_level(format!(
                        "Unknown {kind} function '{name}'"
                    )));
                }
                run.stop(format_args!(
                    "schema references {} unknown function(s)",
                    unknown.len()
                ));
                return run.finish();
            }
        }

        run.enter(RunState::GlobalTransform);
        let mut metadata = Map::new();
        let working: Cow<'_, [Value]> = if schema.global_transforms.is_empty() {
            Cow::Borrowed(rows)
        } else {
            match apply_global_transforms(&self.registry, schema, rows, &mut metadata) {
                Ok(working) => Cow::Owned(working),
                Err(err) => {
                    run.result
                        .errors
                        .push(TransformationError::run_level(err.to_string()));
                    run.stop(format_args!("global transforms failed: {err}"));
                    return run.finish();
                }
            }
        };

        let transformer = RowTransformer::new(&self.registry);
        let validator = RowValidator::new(&self.registry);

        for (index, row) in working.iter().enumerate() {
            let row_number = index + 1;
            run.result.metadata.processed_records += 1;
            let mut context =
                TransformContext::new(&working, row, index, &schema.fields, &mut metadata);

            run.enter(RunState::TransformRow(row_number));
            match transformer.transform_row(schema, &mut context) {
                Ok(record) => {
                    run.enter(RunState::ValidateRow(row_number));
                    let outcome = validator.validate_row(&schema.validation, &record, &mut context);
                    let rejected = outcome.has_errors();
                    run.result.errors.extend(outcome.errors);
                    run.result.warnings.extend(outcome.warnings);

                    if rejected {
                        debug!("Row {}: rejected by validation", row_number);
                        run.result.metadata.skipped_records += 1;
                    } else if !options.validate_only {
                        debug!("Row {}: transformed", row_number);
                        run.result.data.push(record);
                        run.result.metadata.transformed_records += 1;
                    }
                }
                Err(err) => {
                    debug!("Row {}: {}", row_number, err);
                    let mut issue =
                        TransformationError::new(row_number, err.to_string()).with_value(row.clone());
                    if let Some(field) = err.field() {
                        issue = issue.with_field(field);
                    }
                    if let Some(value) = err.invalid_value() {
                        issue = issue.with_transformed_value(value.clone());
                    }
                    run.result.errors.push(issue);
                    run.result.metadata.skipped_records += 1;

                    if !options.skip_errors {
                        run.stop(format_args!("row {row_number} failed to transform"));
                        break;
                    }
                }
            }

            if let Some(max_errors) = options.max_errors {
                if run.result.errors.len() >= max_errors {
                    run.result.errors.truncate(max_errors);
                    run.stop(format_args!("reached the limit of {max_errors} error(s)"));
                    break;
                }
            }
        }

        run.finish()
    }
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state of one run
struct Run {
    state: RunState,
    started: Instant,
    result: TransformationResult,
}

impl Run {
    fn new(total_records: usize) -> Self {
        let mut result = TransformationResult {
            success: true,
            ..TransformationResult::default()
        };
        result.metadata.total_records = total_records;
        Self {
            state: RunState::Init,
            started: Instant::now(),
            result,
        }
    }

    fn enter(&mut self, state: RunState) {
        trace!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn stop(&mut self, reason: std::fmt::Arguments<'_>) {
        warn!("Stopping run during {:?}: {}", self.state, reason);
        self.result.success = false;
    }

    fn finish(mut self) -> TransformationResult {
        self.enter(RunState::Finalize);
        let result = &mut self.result;
        result.success = result.success && result.errors.is_empty();
        result.metadata.duration_ms =
            u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            "Run finished: success={}, processed={}, transformed={}, skipped={}, errors={}, warnings={}",
            result.success,
            result.metadata.processed_records,
            result.metadata.transformed_records,
            result.metadata.skipped_records,
            result.errors.len(),
            result.warnings.len()
        );
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_schema::{
        FieldConstraint, FieldMapping, FunctionError, GlobalTransform, Severity, SortDirection,
        SourceType, TargetType, ValidationRule, ValueFormat,
    };
    use serde_json::json;

    fn schema() -> DataMappingSchema {
        DataMappingSchema::new("test", "Test", SourceType::Json, TargetType::User)
    }

    fn email_schema() -> DataMappingSchema {
        schema()
            .with_field(FieldMapping::new("email", "email").unwrap())
            .with_rule(
                ValidationRule::new("email", "required", "Email is required", Severity::Error)
                    .unwrap(),
            )
    }

    fn rows(count: usize, missing: &[usize]) -> Vec<Value> {
        (1..=count)
            .map(|n| {
                if missing.contains(&n) {
                    json!({"name": n})
                } else {
                    json!({"email": format!("u{n}@x.io")})
                }
            })
            .collect()
    }

    #[test]
    fn test_identity_schema() {
        let s = schema()
            .with_field(FieldMapping::new("a", "a").unwrap())
            .with_field(FieldMapping::new("b.c", "b.c").unwrap());
        let input = vec![json!({"a": 1, "b": {"c": "x"}}), json!({"a": 2, "b": {"c": null}})];

        let result = TransformEngine::new().transform_data(&input, &s, &TransformOptions::default());
        assert!(result.success);
        assert_eq!(result.data, input);
        assert_eq!(result.metadata.transformed_records, 2);
    }

    #[test]
    fn test_validation_failure_skips_only_that_row() {
        let result = transform_data(&rows(5, &[3]), &email_schema(), &TransformOptions::default());

        assert!(!result.success);
        assert_eq!(result.metadata.total_records, 5);
        assert_eq!(result.metadata.processed_records, 5);
        assert_eq!(result.metadata.transformed_records, 4);
        assert_eq!(result.metadata.skipped_records, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(result.errors[0].field.as_deref(), Some("email"));
    }

    #[test]
    fn test_warnings_do_not_exclude_rows() {
        let s = schema()
            .with_field(FieldMapping::new("name", "name").unwrap())
            .with_rule(ValidationRule::new("name", "minLength:3", "Short", Severity::Warning).unwrap());
        let result = transform_data(&[json!({"name": "Al"})], &s, &TransformOptions::default());

        assert!(result.success);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_transform_failure_stops_without_skip_errors() {
        let s = schema().with_field(FieldMapping::new("email", "email").unwrap().required());
        let result = transform_data(&rows(5, &[2]), &s, &TransformOptions::default());

        assert!(!result.success);
        assert_eq!(result.metadata.processed_records, 2);
        assert_eq!(result.metadata.transformed_records, 1);
        assert_eq!(result.metadata.skipped_records, 1);
        assert_eq!(result.errors.len(), 1);

        let error = &result.errors[0];
        assert_eq!(error.row, 2);
        assert_eq!(error.field.as_deref(), Some("email"));
        assert_eq!(error.value, Some(json!({"name": 2})));
    }

    #[test]
    fn test_transform_failure_continues_with_skip_errors() {
        let s = schema().with_field(FieldMapping::new("email", "email").unwrap().required());
        let options = TransformOptions::default().skip_errors();
        let result = transform_data(&rows(5, &[2, 4]), &s, &options);

        assert!(!result.success);
        assert_eq!(result.metadata.processed_records, 5);
        assert_eq!(result.metadata.transformed_records, 3);
        assert_eq!(result.metadata.skipped_records, 2);
        let failed: Vec<usize> = result.errors.iter().map(|e| e.row).collect();
        assert_eq!(failed, vec![2, 4]);
    }

    #[test]
    fn test_max_errors_caps_the_run() {
        let options = TransformOptions::default().skip_errors().with_max_errors(2);
        let result = transform_data(&rows(5, &[1, 2, 3, 4, 5]), &email_schema(), &options);

        assert!(!result.success);
        assert!(result.errors.len() <= 2);
        assert!(result.metadata.processed_records <= 5);
        assert_eq!(result.metadata.processed_records, 2);
    }

    #[test]
    fn test_max_errors_truncates_a_row_with_many_errors() {
        let s = email_schema().with_rule(
            ValidationRule::new("name", "required", "Name is required", Severity::Error).unwrap(),
        );
        let options = TransformOptions::default().with_max_errors(1);
        let result = transform_data(&[json!({}), json!({})], &s, &options);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.metadata.processed_records, 1);
    }

    #[test]
    fn test_zero_error_cap_is_rejected_before_any_row() {
        let options = TransformOptions::default().with_max_errors(0);
        let result = transform_data(&rows(2, &[]), &email_schema(), &options);

        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(result.metadata.processed_records, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].is_run_level());
        assert!(result.errors[0].message.contains("max_errors"));
    }

    #[test]
    fn test_field_constraint_failure_isolates_the_row() {
        let s = schema().with_field(
            FieldMapping::new("email", "email")
                .unwrap()
                .with_transform("trim|lower")
                .unwrap()
                .required()
                .with_validation(FieldConstraint::new().format(ValueFormat::Email)),
        );
        let mut input = rows(5, &[]);
        input[2] = json!({"email": "not an email"});
        let options = TransformOptions::default().skip_errors();
        let result = transform_data(&input, &s, &options);

        assert_eq!(result.metadata.processed_records, 5);
        assert_eq!(result.metadata.transformed_records, 4);
        assert_eq!(result.metadata.skipped_records, 1);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.row, 3);
        assert_eq!(error.field.as_deref(), Some("email"));
        assert_eq!(error.transformed_value, Some(json!("not an email")));
    }

    #[test]
    fn test_validate_only_collects_no_data() {
        let options = TransformOptions::default().validate_only();
        let result = transform_data(&rows(3, &[2]), &email_schema(), &options);

        assert!(result.data.is_empty());
        assert_eq!(result.metadata.transformed_records, 0);
        assert_eq!(result.metadata.skipped_records, 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_fail_fast_reports_unknown_functions() {
        let s = schema()
            .with_field(FieldMapping::new("a", "a").unwrap().with_transform("trim|shout").unwrap())
            .with_field(FieldMapping::new("b", "b").unwrap().with_transform("shout").unwrap())
            .with_rule(ValidationRule::new("a", "isPrime", "not prime", Severity::Error).unwrap());
        let options = TransformOptions::default().fail_fast();
        let result = transform_data(&[json!({"a": "x"})], &s, &options);

        assert!(!result.success);
        assert_eq!(result.metadata.processed_records, 0);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().all(TransformationError::is_run_level));
        assert_eq!(result.errors[0].message, "Unknown transform function 'shout'");
        assert_eq!(result.errors[1].message, "Unknown validation function 'isPrime'");
    }

    #[test]
    fn test_unknown_function_without_fail_fast_is_row_fatal() {
        let s = schema()
            .with_field(FieldMapping::new("a", "a").unwrap().with_transform("shout").unwrap());
        let options = TransformOptions::default().skip_errors();
        let result = transform_data(&[json!({"a": "x"}), json!({"a": "y"})], &s, &options);

        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field.as_deref(), Some("a"));
        assert!(result.errors[0].message.contains("Unknown transform function 'shout'"));
    }

    #[test]
    fn test_global_failure_is_run_level() {
        let s = email_schema().with_global_transform(GlobalTransform::filter("isVip").unwrap());
        let result = transform_data(&rows(2, &[]), &s, &TransformOptions::default());

        assert!(!result.success);
        assert_eq!(result.metadata.total_records, 2);
        assert_eq!(result.metadata.processed_records, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].is_run_level());
    }

    #[test]
    fn test_rows_are_numbered_after_global_transforms() {
        let s = email_schema().with_global_transform(GlobalTransform::filter("fieldExists:keep").unwrap());
        let input = vec![
            json!({"email": "a@x.io"}),
            json!({"keep": true, "name": "no email"}),
        ];
        let result = transform_data(&input, &s, &TransformOptions::default());

        assert_eq!(result.metadata.total_records, 2);
        assert_eq!(result.metadata.processed_records, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 1);
    }

    #[test]
    fn test_metadata_is_shared_across_rows() {
        let mut engine = TransformEngine::new();
        engine.register_transform("sequence", |_, _, ctx, _| {
            let next = ctx.metadata.get("seq").and_then(Value::as_u64).unwrap_or(0) + 1;
            ctx.metadata.insert("seq".to_string(), json!(next));
            Ok(json!(next))
        });
        let s = schema().with_field(
            FieldMapping::new("", "seq")
                .unwrap()
                .with_transform("sequence")
                .unwrap(),
        );

        let result = engine.transform_data(&[json!({}), json!({}), json!({})], &s, &TransformOptions::default());
        let seqs: Vec<Value> = result.data.iter().map(|r| r["seq"].clone()).collect();
        assert_eq!(seqs, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_registration_overwrites() {
        let mut engine = TransformEngine::new();
        engine.register_transform("upper", |_, _, _, _| Ok(json!("replaced")));
        engine.register_validation("even", |value, _, _, _| {
            value
                .as_i64()
                .map(|n| n % 2 == 0)
                .ok_or_else(|| FunctionError::new("not a number"))
        });

        let s = schema()
            .with_field(FieldMapping::new("a", "a").unwrap().with_transform("upper").unwrap())
            .with_field(FieldMapping::new("n", "n").unwrap())
            .with_rule(ValidationRule::new("n", "even", "odd", Severity::Warning).unwrap());
        let result = engine.transform_data(&[json!({"a": "x", "n": 3})], &s, &TransformOptions::default());

        assert_eq!(result.data, vec![json!({"a": "replaced", "n": 3})]);
        assert_eq!(result.warnings.len(), 1);
        assert!(engine.check_schema(&s).is_empty());
    }

    #[test]
    fn test_sorted_input() {
        let s = schema()
            .with_field(FieldMapping::new("n", "n").unwrap())
            .with_global_transform(GlobalTransform::sort("n", SortDirection::Desc).unwrap());
        let result = transform_data(
            &[json!({"n": 1}), json!({"n": 3}), json!({"n": 2})],
            &s,
            &TransformOptions::default(),
        );
        assert_eq!(
            result.data,
            vec![json!({"n": 3}), json!({"n": 2}), json!({"n": 1})]
        );
    }
}
