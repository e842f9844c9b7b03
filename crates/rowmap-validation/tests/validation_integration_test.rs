//! Row validation of records produced by the factory schemas.

use rowmap_mapping::{FunctionRegistry, RowTransformer};
use rowmap_schema::factories::{team_import_schema, user_import_schema};
use rowmap_schema::{DataMappingSchema, Severity, SourceType, TransformContext};
use rowmap_validation::{RowValidator, ValidationReporter, ValidationResult};
use serde_json::{Map, Value, json};

fn transform_and_validate(schema: &DataMappingSchema, row: &Value) -> (Value, ValidationResult) {
    let registry = FunctionRegistry::with_builtins();
    let rows = std::slice::from_ref(row);
    let mut metadata = Map::new();
    let mut context = TransformContext::new(rows, &rows[0], 0, &schema.fields, &mut metadata);

    let record = RowTransformer::new(&registry)
        .transform_row(schema, &mut context)
        .expect("row transforms");
    let result = RowValidator::new(&registry).validate_row(&schema.validation, &record, &mut context);
    (record, result)
}

#[test]
fn test_user_without_first_name_gets_warning() -> anyhow::Result<()> {
    let schema = user_import_schema(SourceType::Csv)?;
    let (record, result) = transform_and_validate(&schema, &json!({"email": "a@b.io"}));

    assert_eq!(record["email"], json!("a@b.io"));
    assert!(!result.has_errors());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].field.as_deref(), Some("firstName"));
    assert_eq!(result.warnings[0].severity, Severity::Warning);
    Ok(())
}

#[test]
fn test_short_team_name_is_an_error() -> anyhow::Result<()> {
    let schema = team_import_schema(SourceType::Json)?;
    let (_, result) = transform_and_validate(&schema, &json!({"teamName": "X"}));

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field.as_deref(), Some("name"));
    assert_eq!(result.errors[0].row, 1);
    // no coach email
    assert_eq!(result.warnings.len(), 1);

    let report = ValidationReporter::new().render(&result.errors, &result.warnings);
    assert!(report.contains("Team name must have at least 2 characters"));
    Ok(())
}
