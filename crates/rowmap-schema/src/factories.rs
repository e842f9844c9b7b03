//! Ready-made schemas for known source format / target entity pairs
//!
//! Every factory builds a fresh schema on each call. Source key naming
//! follows the conventions of each format:
//!
//! | source                          | style       | example            |
//! |---------------------------------|-------------|--------------------|
//! | csv                             | snake_case  | `first_name`       |
//! | json, xml, integration          | camelCase   | `firstName`        |
//! | external-api                    | nested      | `profile.firstName`|

use serde_json::json;

use crate::constraint::{FieldConstraint, ValueFormat, ValueType};
use crate::model::{
    DataMappingSchema, FieldMapping, GlobalTransform, SchemaMetadata, Severity, SortDirection,
    SourceType, TargetType, ValidationRule,
};
use crate::Result;

const FACTORY_AUTHOR: &str = "rowmap-factories";

/// Pick the source key for a format
fn key<'k>(source: SourceType, snake: &'k str, camel: &'k str, nested: &'k str) -> &'k str {
    match source {
        SourceType::Csv => snake,
        SourceType::Json | SourceType::Xml | SourceType::Integration => camel,
        SourceType::ExternalApi => nested,
    }
}

fn base(source: SourceType, target: TargetType, title: &str) -> DataMappingSchema {
    DataMappingSchema::new(
        format!("{target}-{source}"),
        format!("{title} import from {source}"),
        source,
        target,
    )
    .with_metadata(SchemaMetadata::now(FACTORY_AUTHOR))
}

/// Build the schema for `(source, target)`
///
/// # Errors
///
/// Returns an error only if a built-in mapping fails to parse.
pub fn schema_for(source: SourceType, target: TargetType) -> Result<DataMappingSchema> {
    match target {
        TargetType::User => user_import_schema(source),
        TargetType::Team => team_import_schema(source),
        TargetType::Field => field_import_schema(source),
        TargetType::Reservation => reservation_import_schema(source),
        TargetType::Payment => payment_import_schema(source),
    }
}

/// Standard user import
///
/// Normalizes and requires the email, title-cases names, normalizes the
/// phone number and maps free-text roles with a `member` fallback.
///
/// # Errors
///
/// Returns an error only if a built-in mapping fails to parse.
pub fn user_import_schema(source: SourceType) -> Result<DataMappingSchema> {
    let first = key(source, "first_name", "firstName", "profile.firstName");
    let last = key(source, "last_name", "lastName", "profile.lastName");

    Ok(base(source, TargetType::User, "User")
        .with_field(
            FieldMapping::new(key(source, "email", "email", "contact.email"), "email")?
                .with_transform("trim|lower")?
                .with_validation(FieldConstraint::new().format(ValueFormat::Email))
                .required(),
        )
        .with_field(FieldMapping::new(first, "firstName")?.with_transform("trim|titleCase")?)
        .with_field(FieldMapping::new(last, "lastName")?.with_transform("trim|titleCase")?)
        .with_field(
            FieldMapping::new("", "displayName")?
                .with_transform(&format!("concat:{first},{last}|titleCase"))?,
        )
        .with_field(
            FieldMapping::new(key(source, "phone", "phone", "contact.phone"), "phone")?
                .with_transform("normalizePhone")?
                .with_validation(FieldConstraint::new().format(ValueFormat::Phone)),
        )
        .with_field(
            FieldMapping::new(key(source, "role", "role", "membership.role"), "role")?
                .with_default("member")
                .with_transform("mapRole")?,
        )
        .with_rule(ValidationRule::new(
            "email",
            "required",
            "Email is required",
            Severity::Error,
        )?)
        .with_rule(ValidationRule::new(
            "firstName",
            "required",
            "First name is missing",
            Severity::Warning,
        )?))
}

/// Standard team import
///
/// # Errors
///
/// Returns an error only if a built-in mapping fails to parse.
pub fn team_import_schema(source: SourceType) -> Result<DataMappingSchema> {
    Ok(base(source, TargetType::Team, "Team")
        .with_field(
            FieldMapping::new(key(source, "team_name", "teamName", "team.name"), "name")?
                .with_transform("trim|normalizeWhitespace")?
                .required(),
        )
        .with_field(
            FieldMapping::new(key(source, "sport", "sport", "team.sport"), "sport")?
                .with_default("other")
                .with_transform("trim|lower")?,
        )
        .with_field(
            FieldMapping::new(
                key(source, "coach_email", "coachEmail", "coach.email"),
                "coachEmail",
            )?
            .with_transform("normalizeEmail")?
            .with_validation(FieldConstraint::new().format(ValueFormat::Email)),
        )
        .with_field(
            FieldMapping::new(
                key(source, "max_players", "maxPlayers", "roster.maxPlayers"),
                "maxPlayers",
            )?
            .with_default(20)
            .with_transform("parseInt|clamp:1,100")?,
        )
        .with_field(
            FieldMapping::new(
                key(source, "description", "description", "team.description"),
                "description",
            )?
            .with_transform("trim|nullIfEmpty")?,
        )
        .with_rule(ValidationRule::new(
            "name",
            "minLength:2",
            "Team name must have at least 2 characters",
            Severity::Error,
        )?)
        .with_rule(ValidationRule::new(
            "coachEmail",
            "required",
            "Team has no coach email",
            Severity::Warning,
        )?))
}

/// Standard playing-field (venue) import
///
/// # Errors
///
/// Returns an error only if a built-in mapping fails to parse.
pub fn field_import_schema(source: SourceType) -> Result<DataMappingSchema> {
    Ok(base(source, TargetType::Field, "Field")
        .with_field(
            FieldMapping::new(key(source, "name", "name", "venue.name"), "name")?
                .with_transform("trim")?
                .required(),
        )
        .with_field(
            FieldMapping::new(key(source, "field_type", "fieldType", "venue.type"), "type")?
                .with_default("other")
                .with_transform("mapFieldType")?,
        )
        .with_field(
            FieldMapping::new(key(source, "surface", "surface", "venue.surface"), "surface")?
                .with_transform("trim|lower")?,
        )
        .with_field(
            FieldMapping::new(key(source, "indoor", "indoor", "venue.indoor"), "indoor")?
                .with_default(false)
                .with_transform("toBoolean")?,
        )
        .with_field(
            FieldMapping::new(
                key(source, "hourly_rate", "hourlyRate", "pricing.hourly"),
                "pricing.hourlyRate",
            )?
            .with_transform("parseNumber|round:2")?
            .with_validation(FieldConstraint::new().range(Some(0.0), None)),
        )
        .with_field(
            FieldMapping::new(key(source, "city", "city", "location.city"), "address.city")?
                .with_transform("trim|titleCase")?,
        )
        .with_field(
            FieldMapping::new(
                key(source, "postal_code", "postalCode", "location.postalCode"),
                "address.postalCode",
            )?
            .with_transform("trim|upper")?,
        )
        .with_rule(ValidationRule::new(
            "address.city",
            "required",
            "Field has no city",
            Severity::Warning,
        )?))
}

/// Standard reservation import
///
/// Duplicate reservations (same external id) are dropped and the rest are
/// processed in start-time order.
///
/// # Errors
///
/// Returns an error only if a built-in mapping fails to parse.
pub fn reservation_import_schema(source: SourceType) -> Result<DataMappingSchema> {
    let external_id = key(source, "reservation_id", "reservationId", "reservation.id");
    let start = key(source, "start_time", "startTime", "slot.start");

    Ok(base(source, TargetType::Reservation, "Reservation")
        .with_global_transform(GlobalTransform::deduplicate(external_id)?)
        .with_global_transform(GlobalTransform::sort(start, SortDirection::Asc)?)
        .with_field(FieldMapping::new(external_id, "externalId")?.with_transform("trim")?)
        .with_field(
            FieldMapping::new(key(source, "field_id", "fieldId", "field.id"), "fieldId")?
                .with_transform("trim")?
                .required(),
        )
        .with_field(
            FieldMapping::new(key(source, "user_email", "userEmail", "customer.email"), "userEmail")?
                .with_transform("normalizeEmail")?
                .with_validation(FieldConstraint::new().format(ValueFormat::Email))
                .required(),
        )
        .with_field(
            FieldMapping::new(start, "startTime")?
                .with_transform("parseDate")?
                .required(),
        )
        .with_field(
            FieldMapping::new(key(source, "end_time", "endTime", "slot.end"), "endTime")?
                .with_transform("parseDate")?,
        )
        .with_field(
            FieldMapping::new(key(source, "status", "status", "reservation.status"), "status")?
                .with_default("pending")
                .with_transform("mapReservationStatus")?,
        )
        .with_field(
            FieldMapping::new(key(source, "notes", "notes", "reservation.notes"), "notes")?
                .with_transform("trim|truncate:500")?,
        )
        .with_rule(ValidationRule::new(
            "startTime",
            "date",
            "Start time is not a valid date",
            Severity::Error,
        )?)
        .with_rule(ValidationRule::new(
            "endTime",
            "required",
            "Reservation has no end time",
            Severity::Warning,
        )?))
}

/// Standard payment import
///
/// Rows without an amount are filtered out before mapping.
///
/// # Errors
///
/// Returns an error only if a built-in mapping fails to parse.
pub fn payment_import_schema(source: SourceType) -> Result<DataMappingSchema> {
    let amount = key(source, "amount", "amount", "payment.amount");

    Ok(base(source, TargetType::Payment, "Payment")
        .with_global_transform(GlobalTransform::filter(&format!("fieldExists:{amount}"))?)
        .with_field(
            FieldMapping::new(amount, "amount")?
                .with_transform("parseNumber|round:2")?
                .with_validation(FieldConstraint::new().value_type(ValueType::Number))
                .required(),
        )
        .with_field(
            FieldMapping::new(key(source, "currency", "currency", "payment.currency"), "currency")?
                .with_default("USD")
                .with_transform("trim|upper")?
                .with_validation(FieldConstraint::new().pattern("^[A-Z]{3}$")),
        )
        .with_field(
            FieldMapping::new(
                key(source, "reservation_id", "reservationId", "reservation.id"),
                "reservationId",
            )?
            .with_transform("trim")?,
        )
        .with_field(
            FieldMapping::new(key(source, "paid_at", "paidAt", "payment.paidAt"), "paidAt")?
                .with_transform("parseDate")?,
        )
        .with_field(
            FieldMapping::new(key(source, "method", "method", "payment.method"), "method")?
                .with_default("card")
                .with_transform("trim|lower")?
                .with_validation(FieldConstraint::new().one_of(vec![
                    json!("card"),
                    json!("cash"),
                    json!("transfer"),
                    json!("voucher"),
                ])),
        )
        .with_rule(ValidationRule::new(
            "amount",
            "positive",
            "Payment amount must be positive",
            Severity::Error,
        )?))
}
