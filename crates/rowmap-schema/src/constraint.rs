//! Field-level value checks
//!
//! A [`FieldConstraint`] is the declarative check attached to a single field
//! mapping. It runs after the field's transforms and decides whether the
//! value may be written.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

use crate::value::{as_f64, as_text, is_blank, type_name};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]{7,15}$").expect("phone pattern is valid")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$")
        .expect("url pattern is valid")
});

/// Whether `value` looks like an email address
#[must_use]
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Whether `value` looks like a phone number once separators are removed
#[must_use]
pub fn is_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&compact)
}

/// Whether `value` is an http(s) URL
#[must_use]
pub fn is_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

/// Whether `value` is a calendar date (`YYYY-MM-DD`) or an RFC 3339 timestamp
#[must_use]
pub fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() || is_date_time(value)
}

/// Whether `value` is an RFC 3339 timestamp
#[must_use]
pub fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

/// Validation rule result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl RuleResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// JSON type expected by a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Well-known string formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Email,
    Phone,
    Date,
    DateTime,
    Url,
}

impl ValueFormat {
    fn matches(self, text: &str) -> bool {
        match self {
            Self::Email => is_email(text),
            Self::Phone => is_phone(text),
            Self::Date => is_date(text),
            Self::DateTime => is_date_time(text),
            Self::Url => is_url(text),
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Url => "url",
        };
        f.write_str(name)
    }
}

/// Declarative check for one mapped value
///
/// Blank values (absent, null, `""`) fail unless `allow_empty` is set, in
/// which case they pass without running the other checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConstraint {
    /// Expected JSON type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    /// Expected string format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    /// Minimum length in characters (strings) or items (arrays)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length in characters (strings) or items (arrays)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regex the textual value must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum numeric value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum numeric value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Value>,
    /// Let blank values through
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_empty: bool,
}

impl FieldConstraint {
    /// Create an empty constraint (only rejects blank values)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set expected type
    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Set expected format
    #[must_use]
    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set min length
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Set max length
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Set pattern
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set numeric range
    #[must_use]
    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set allowed values
    #[must_use]
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.one_of = values;
        self
    }

    /// Let blank values pass
    #[must_use]
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Check a value against every configured rule, stopping at the first failure
    #[must_use]
    pub fn check(&self, value: Option<&Value>) -> RuleResult {
        let value = match value {
            Some(value) if !is_blank(value) => value,
            _ if self.allow_empty => return RuleResult::valid(),
            _ => return RuleResult::invalid("Value is required"),
        };

        if let Some(expected) = self.value_type {
            if !expected.matches(value) {
                return RuleResult::invalid(format!(
                    "Expected {expected}, found {}",
                    type_name(value)
                ));
            }
        }

        let text = as_text(value);

        if let Some(format) = self.format {
            match text.as_deref() {
                Some(text) if format.matches(text) => {}
                _ => return RuleResult::invalid(format!("Value is not a valid {format}")),
            }
        }

        let length = match value {
            Value::Array(items) => Some(items.len()),
            _ => text.as_ref().map(|t| t.chars().count()),
        };
        if let (Some(min), Some(len)) = (self.min_length, length) {
            if len < min {
                return RuleResult::invalid(format!("Length {len} is less than minimum {min}"));
            }
        }
        if let (Some(max), Some(len)) = (self.max_length, length) {
            if len > max {
                return RuleResult::invalid(format!("Length {len} exceeds maximum {max}"));
            }
        }

        if let Some(pattern) = &self.pattern {
            let result = validate_pattern(text.as_deref().unwrap_or_default(), pattern);
            if !result.is_valid {
                return result;
            }
        }

        if self.min.is_some() || self.max.is_some() {
            let Some(number) = as_f64(value) else {
                return RuleResult::invalid(format!("Value '{value}' is not numeric"));
            };
            if let Some(min) = self.min {
                if number < min {
                    return RuleResult::invalid(format!("Value {number} is less than minimum {min}"));
                }
            }
            if let Some(max) = self.max {
                if number > max {
                    return RuleResult::invalid(format!("Value {number} exceeds maximum {max}"));
                }
            }
        }

        if !self.one_of.is_empty() && !self.one_of.iter().any(|allowed| same_value(allowed, value))
        {
            return RuleResult::invalid(format!("Value '{value}' is not an allowed value"));
        }

        RuleResult::valid()
    }
}

/// Equality that lets `"1"` match `1`
fn same_value(allowed: &Value, value: &Value) -> bool {
    allowed == value || matches!((as_text(allowed), as_text(value)), (Some(a), Some(b)) if a == b)
}

/// Validate pattern matching using regex
#[must_use]
pub fn validate_pattern(value: &str, pattern: &str) -> RuleResult {
    match Regex::new(pattern) {
        Ok(re) => {
            if re.is_match(value) {
                RuleResult::valid()
            } else {
                RuleResult::invalid(format!(
                    "Value '{value}' does not match pattern '{pattern}'"
                ))
            }
        }
        Err(e) => RuleResult::invalid(format!("Invalid regex pattern '{pattern}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values_fail_by_default() {
        let constraint = FieldConstraint::new();
        assert!(!constraint.check(None).is_valid);
        assert!(!constraint.check(Some(&Value::Null)).is_valid);
        assert!(!constraint.check(Some(&json!(""))).is_valid);
        assert!(constraint.check(Some(&json!(0))).is_valid);
        assert!(constraint.check(Some(&json!(false))).is_valid);
    }

    #[test]
    fn test_allow_empty_skips_checks() {
        let constraint = FieldConstraint::new()
            .format(ValueFormat::Email)
            .allow_empty();
        assert!(constraint.check(None).is_valid);
        assert!(!constraint.check(Some(&json!("nope"))).is_valid);
    }

    #[test]
    fn test_email_format() {
        let constraint = FieldConstraint::new().format(ValueFormat::Email);
        assert!(constraint.check(Some(&json!("a@b.com"))).is_valid);
        let result = constraint.check(Some(&json!("a@b")));
        assert!(!result.is_valid);
        assert_eq!(result.message.as_deref(), Some("Value is not a valid email"));
    }

    #[test]
    fn test_type_check() {
        let constraint = FieldConstraint::new().value_type(ValueType::Integer);
        assert!(constraint.check(Some(&json!(3))).is_valid);
        assert!(constraint.check(Some(&json!(3.0))).is_valid);
        assert!(!constraint.check(Some(&json!(3.5))).is_valid);
        assert!(!constraint.check(Some(&json!("3"))).is_valid);
    }

    #[test]
    fn test_length_limits() {
        let constraint = FieldConstraint::new().min_length(2).max_length(4);
        assert!(!constraint.check(Some(&json!("a"))).is_valid);
        assert!(constraint.check(Some(&json!("abcd"))).is_valid);
        assert!(!constraint.check(Some(&json!("abcde"))).is_valid);
        assert!(constraint.check(Some(&json!(["x", "y"]))).is_valid);
    }

    #[test]
    fn test_numeric_range_accepts_numeric_strings() {
        let constraint = FieldConstraint::new().range(Some(0.0), Some(10.0));
        assert!(constraint.check(Some(&json!(5))).is_valid);
        assert!(constraint.check(Some(&json!("7.5"))).is_valid);
        assert!(!constraint.check(Some(&json!(11))).is_valid);
        assert!(!constraint.check(Some(&json!("ten"))).is_valid);
    }

    #[test]
    fn test_pattern_and_one_of() {
        let constraint = FieldConstraint::new().pattern("^[A-Z]{3}$");
        assert!(constraint.check(Some(&json!("USD"))).is_valid);
        assert!(!constraint.check(Some(&json!("usd"))).is_valid);

        let constraint = FieldConstraint::new().one_of(vec![json!("admin"), json!(1)]);
        assert!(constraint.check(Some(&json!("admin"))).is_valid);
        assert!(constraint.check(Some(&json!("1"))).is_valid);
        assert!(!constraint.check(Some(&json!("guest"))).is_valid);
    }

    #[test]
    fn test_invalid_regex_reports_failure() {
        let result = validate_pattern("x", "([");
        assert!(!result.is_valid);
        assert!(result.message.unwrap().contains("Invalid regex pattern"));
    }

    #[test]
    fn test_format_helpers() {
        assert!(is_phone("+1 (555) 123-4567"));
        assert!(!is_phone("12"));
        assert!(is_url("https://example.com/x"));
        assert!(is_date("2024-02-29"));
        assert!(!is_date("2023-02-29"));
        assert!(is_date_time("2024-01-01T10:00:00Z"));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let constraint: FieldConstraint = serde_yaml::from_str(
            "type: string\nformat: email\nmax_length: 120\n",
        )
        .unwrap();
        assert_eq!(constraint.value_type, Some(ValueType::String));
        assert_eq!(constraint.format, Some(ValueFormat::Email));
        assert_eq!(constraint.max_length, Some(120));
        assert!(!constraint.allow_empty);
    }
}
