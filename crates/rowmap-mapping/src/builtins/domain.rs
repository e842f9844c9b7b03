//! Mappers from free-text categories to the internal vocabularies

use rowmap_schema::value::as_text;
use serde_json::Value;

use crate::numeric::opt_arg_text;
use crate::registry::FunctionRegistry;

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_transform("mapRole", |v, args| {
            let fallback = opt_arg_text(args, 0).unwrap_or_else(|| "member".to_string());
            Ok(transform_map_role(v, &fallback))
        })
        .register_value_transform("mapFieldType", |v, args| {
            let fallback = opt_arg_text(args, 0).unwrap_or_else(|| "other".to_string());
            Ok(transform_map_field_type(v, &fallback))
        })
        .register_value_transform("mapReservationStatus", |v, _| {
            Ok(transform_map_reservation_status(v))
        });
}

fn normalized(value: &Value) -> String {
    as_text(value).unwrap_or_default().trim().to_lowercase()
}

/// Map a role name to `admin`, `manager`, `coach`, or `member`
#[must_use]
pub fn transform_map_role(value: &Value, fallback: &str) -> Value {
    let role = match normalized(value).as_str() {
        "administrator" | "admin" | "owner" | "superuser" => "admin",
        "manager" | "organizer" | "organiser" | "staff" => "manager",
        "coach" | "trainer" | "captain" => "coach",
        "player" | "member" | "user" | "athlete" => "member",
        _ => fallback,
    };
    Value::String(role.to_string())
}

const FIELD_TYPES: &[(&str, &[&str])] = &[
    ("soccer", &["soccer", "football", "futsal"]),
    ("basketball", &["basketball", "hoops"]),
    ("tennis", &["tennis", "padel"]),
    ("baseball", &["baseball", "softball"]),
    ("volleyball", &["volleyball"]),
    ("multipurpose", &["multipurpose", "multi-purpose", "multi purpose", "gym"]),
];

/// Map a venue description such as `"Indoor Soccer Pitch"` to a field type.
/// The first keyword found in the text wins.
#[must_use]
pub fn transform_map_field_type(value: &Value, fallback: &str) -> Value {
    let text = normalized(value);
    let kind = FIELD_TYPES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(*k)))
        .map_or(fallback, |(kind, _)| *kind);
    Value::String(kind.to_string())
}

/// Map a booking status to `confirmed`, `pending`, or `cancelled`;
/// anything unrecognized is `pending`
#[must_use]
pub fn transform_map_reservation_status(value: &Value) -> Value {
    let status = match normalized(value).as_str() {
        "confirmed" | "booked" => "confirmed",
        "cancelled" | "canceled" => "cancelled",
        _ => "pending",
    };
    Value::String(status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_role() {
        assert_eq!(transform_map_role(&json!("Administrator"), "member"), json!("admin"));
        assert_eq!(transform_map_role(&json!(" STAFF "), "member"), json!("manager"));
        assert_eq!(transform_map_role(&json!("Captain"), "member"), json!("coach"));
        assert_eq!(transform_map_role(&json!("athlete"), "member"), json!("member"));
        assert_eq!(transform_map_role(&json!("referee"), "guest"), json!("guest"));
        assert_eq!(transform_map_role(&Value::Null, "member"), json!("member"));
    }

    #[test]
    fn test_map_field_type() {
        assert_eq!(
            transform_map_field_type(&json!("Indoor Futsal Court"), "other"),
            json!("soccer")
        );
        assert_eq!(
            transform_map_field_type(&json!("Multi-Purpose Hall"), "other"),
            json!("multipurpose")
        );
        assert_eq!(transform_map_field_type(&json!("Track"), "other"), json!("other"));
    }

    #[test]
    fn test_map_reservation_status() {
        assert_eq!(transform_map_reservation_status(&json!("Booked")), json!("confirmed"));
        assert_eq!(transform_map_reservation_status(&json!("canceled")), json!("cancelled"));
        assert_eq!(transform_map_reservation_status(&json!("requested")), json!("pending"));
        assert_eq!(transform_map_reservation_status(&json!("???")), json!("pending"));
    }
}
