//! Date transforms backed by chrono
//!
//! Dates come out as `YYYY-MM-DD`; date-times as RFC 3339 in UTC. Inputs
//! without an offset are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rowmap_schema::value::{as_text, is_blank};
use rowmap_schema::{FunctionError, FunctionResult};
use serde_json::Value;
use std::fmt::Write;

use crate::numeric::{arg_text, opt_arg_text};
use crate::registry::FunctionRegistry;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry
        .register_value_transform("parseDate", |v, args| {
            transform_parse_date(v, opt_arg_text(args, 0).as_deref())
        })
        .register_value_transform("formatDate", |v, args| {
            transform_format_date(v, &arg_text(args, 0, "formatDate")?)
        })
        .register_value_transform("now", |_, _| Ok(Value::String(rfc3339(Utc::now()))));
}

/// A parsed calendar value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl Temporal {
    /// Instant for comparisons; dates start at midnight UTC
    #[must_use]
    pub fn instant(self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
            Self::DateTime(at) => at,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            Self::DateTime(at) => Value::String(rfc3339(at)),
        }
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse date text in any of the supported formats. Integers are read as
/// Unix timestamps in seconds.
#[must_use]
pub fn parse_temporal(value: &Value) -> Option<Temporal> {
    if let Some(seconds) = value.as_i64() {
        return DateTime::from_timestamp(seconds, 0).map(Temporal::DateTime);
    }
    let text = as_text(value)?;
    let text = text.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(Temporal::DateTime(at.with_timezone(&Utc)));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Temporal::DateTime(at.and_utc()));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(Temporal::Date(date));
        }
    }
    None
}

fn parse_with_format(text: &str, format: &str) -> Option<Temporal> {
    if let Ok(at) = DateTime::parse_from_str(text, format) {
        return Some(Temporal::DateTime(at.with_timezone(&Utc)));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(text, format) {
        return Some(Temporal::DateTime(at.and_utc()));
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .map(Temporal::Date)
}

/// Normalize a date or date-time. With `input_format` (chrono `strftime`
/// syntax) only that format is accepted. Blank becomes null.
///
/// # Errors
///
/// Returns an error if the value cannot be parsed.
pub fn transform_parse_date(value: &Value, input_format: Option<&str>) -> FunctionResult<Value> {
    if is_blank(value) {
        return Ok(Value::Null);
    }
    let parsed = match input_format {
        Some(format) => as_text(value).and_then(|text| parse_with_format(text.trim(), format)),
        None => parse_temporal(value),
    };
    parsed
        .map(Temporal::into_value)
        .ok_or_else(|| FunctionError::new(format!("Cannot parse {value} as a date")))
}

/// Format a date with a chrono `strftime` pattern. Blank becomes null.
///
/// # Errors
///
/// Returns an error if the value is not a date or the pattern is invalid.
pub fn transform_format_date(value: &Value, output_format: &str) -> FunctionResult<Value> {
    if is_blank(value) {
        return Ok(Value::Null);
    }
    let instant = parse_temporal(value)
        .ok_or_else(|| FunctionError::new(format!("Cannot parse {value} as a date")))?
        .instant();

    let mut out = String::new();
    write!(out, "{}", instant.format(output_format))
        .map_err(|_| FunctionError::new(format!("Invalid date format '{output_format}'")))?;
    Ok(Value::String(out))
}
