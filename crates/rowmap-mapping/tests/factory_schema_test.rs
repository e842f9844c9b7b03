//! Factory schemas run through the global stage and the row transformer.

use rowmap_mapping::{FunctionRegistry, RowTransformer, apply_global_transforms};
use rowmap_schema::factories::{
    field_import_schema, payment_import_schema, reservation_import_schema, team_import_schema,
    user_import_schema,
};
use rowmap_schema::{DataMappingSchema, SourceType, TransformContext};
use serde_json::{Map, Value, json};

fn map_all(schema: &DataMappingSchema, rows: &[Value]) -> Vec<rowmap_mapping::Result<Value>> {
    let registry = FunctionRegistry::with_builtins();
    let mut metadata = Map::new();
    let working = apply_global_transforms(&registry, schema, rows, &mut metadata)
        .expect("global transforms succeed");
    let transformer = RowTransformer::new(&registry);

    working
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut context =
                TransformContext::new(&working, row, index, &schema.fields, &mut metadata);
            transformer.transform_row(schema, &mut context)
        })
        .collect()
}

#[test]
fn test_user_csv_row() -> anyhow::Result<()> {
    let schema = user_import_schema(SourceType::Csv)?;
    let rows = vec![json!({
        "email": " Jane.Doe@Example.COM ",
        "first_name": "jane",
        "last_name": "DOE",
        "phone": "(555) 010-2000",
        "role": "Administrator"
    })];

    let out = map_all(&schema, &rows).remove(0)?;
    assert_eq!(
        out,
        json!({
            "email": "jane.doe@example.com",
            "firstName": "Jane",
            "lastName": "Doe",
            "displayName": "Jane Doe",
            "phone": "+15550102000",
            "role": "admin"
        })
    );
    Ok(())
}

#[test]
fn test_user_external_api_row_uses_nested_keys() -> anyhow::Result<()> {
    let schema = user_import_schema(SourceType::ExternalApi)?;
    let rows = vec![json!({
        "contact": {"email": "coach@club.org"},
        "profile": {"firstName": "sam"},
        "membership": {"role": ""}
    })];

    let out = map_all(&schema, &rows).remove(0)?;
    assert_eq!(out["email"], json!("coach@club.org"));
    assert_eq!(out["displayName"], json!("Sam"));
    assert_eq!(out["role"], json!("member"));
    assert!(out.get("lastName").is_some());
    Ok(())
}

#[test]
fn test_user_without_email_is_rejected() -> anyhow::Result<()> {
    let schema = user_import_schema(SourceType::Json)?;
    let rows = vec![json!({"firstName": "no mail"})];

    let err = map_all(&schema, &rows).remove(0).unwrap_err();
    assert_eq!(err.field(), Some("email"));
    Ok(())
}

#[test]
fn test_team_defaults_and_clamp() -> anyhow::Result<()> {
    let schema = team_import_schema(SourceType::Json)?;
    let rows = vec![
        json!({"teamName": "  Red   Lions ", "maxPlayers": "250"}),
        json!({"teamName": "Blue Birds", "sport": "Soccer"}),
    ];

    let results = map_all(&schema, &rows);
    let first = results[0].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(first["name"], json!("Red Lions"));
    assert_eq!(first["maxPlayers"], json!(100));
    assert_eq!(first["sport"], json!("other"));

    let second = results[1].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(second["maxPlayers"], json!(20));
    assert_eq!(second["sport"], json!("soccer"));
    Ok(())
}

#[test]
fn test_field_row_builds_nested_target() -> anyhow::Result<()> {
    let schema = field_import_schema(SourceType::Csv)?;
    let rows = vec![json!({
        "name": "North Park",
        "field_type": "Indoor Basketball Court",
        "indoor": "yes",
        "hourly_rate": "45.456",
        "city": "springfield",
        "postal_code": "ab1 2cd"
    })];

    let out = map_all(&schema, &rows).remove(0)?;
    assert_eq!(out["type"], json!("basketball"));
    assert_eq!(out["indoor"], json!(true));
    assert_eq!(out["pricing"], json!({"hourlyRate": 45.46}));
    assert_eq!(out["address"], json!({"city": "Springfield", "postalCode": "AB1 2CD"}));
    Ok(())
}

#[test]
fn test_reservations_are_deduplicated_and_sorted() -> anyhow::Result<()> {
    let schema = reservation_import_schema(SourceType::Csv)?;
    let rows = vec![
        json!({"reservation_id": "R2", "field_id": "F1", "user_email": "b@x.io",
               "start_time": "2024-06-02 10:00", "status": "booked"}),
        json!({"reservation_id": "R1", "field_id": "F1", "user_email": "a@x.io",
               "start_time": "2024-06-01 09:00"}),
        json!({"reservation_id": "R2", "field_id": "F9", "user_email": "dup@x.io",
               "start_time": "2024-05-01 09:00"}),
    ];

    let results = map_all(&schema, &rows);
    assert_eq!(results.len(), 2);
    let ids: Vec<Value> = results
        .iter()
        .map(|r| r.as_ref().map(|rec| rec["externalId"].clone()).unwrap_or(Value::Null))
        .collect();
    assert_eq!(ids, vec![json!("R1"), json!("R2")]);

    let second = results[1].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(second["startTime"], json!("2024-06-02T10:00:00Z"));
    assert_eq!(second["status"], json!("confirmed"));
    Ok(())
}

#[test]
fn test_payments_without_amount_are_filtered() -> anyhow::Result<()> {
    let schema = payment_import_schema(SourceType::Json)?;
    let rows = vec![
        json!({"amount": "19.999", "currency": " eur "}),
        json!({"currency": "usd"}),
        json!({"amount": 5, "currency": "dollars"}),
    ];

    let results = map_all(&schema, &rows);
    assert_eq!(results.len(), 2);

    let first = results[0].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(first["amount"], json!(20));
    assert_eq!(first["currency"], json!("EUR"));
    assert_eq!(first["method"], json!("card"));

    let second = results[1].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
    assert!(second.get("currency").is_none());
    Ok(())
}
