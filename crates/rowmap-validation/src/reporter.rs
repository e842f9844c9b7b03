//! Transformation issues and their reporting

pub use rowmap_schema::Severity;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One problem found while transforming or validating
///
/// `row` is 1-based and refers to the collection after global transforms.
/// Row `0` marks a run-level issue that is not tied to a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationError {
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
    /// Raw value involved, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformed_value: Option<Value>,
}

/// Warnings share the error shape and differ only by severity
pub type TransformationWarning = TransformationError;

impl TransformationError {
    /// Error-severity issue for a row
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            message: message.into(),
            severity: Severity::Error,
            value: None,
            transformed_value: None,
        }
    }

    /// Warning-severity issue for a row
    pub fn warning(row: usize, message: impl Into<String>) -> Self {
        Self::new(row, message).with_severity(Severity::Warning)
    }

    /// Error not tied to a row
    pub fn run_level(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_transformed_value(mut self, value: Value) -> Self {
        self.transformed_value = Some(value);
        self
    }

    #[must_use]
    pub fn is_run_level(&self) -> bool {
        self.row == 0
    }
}

impl fmt::Display for TransformationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_run_level() {
            write!(f, "[{}] run", self.severity)?;
        } else {
            write!(f, "[{}] row {}", self.severity, self.row)?;
        }
        if let Some(field) = &self.field {
            write!(f, ", field '{field}'")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Counts of issues per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    pub errors: usize,
    pub warnings: usize,
    pub run_level: usize,
    /// Issue count per field; issues without a field are counted under `-`
    pub by_field: BTreeMap<String, usize>,
}

/// Renders issue lists for operators
#[derive(Debug, Clone)]
pub struct ValidationReporter {
    max_listed: usize,
}

impl ValidationReporter {
    /// Create a reporter listing up to 20 issues of each severity
    #[must_use]
    pub fn new() -> Self {
        Self { max_listed: 20 }
    }

    /// Limit how many issues of each severity are listed
    #[must_use]
    pub fn with_limit(mut self, max_listed: usize) -> Self {
        self.max_listed = max_listed;
        self
    }

    /// Count issues by severity and field
    #[must_use]
    pub fn summarize(
        &self,
        errors: &[TransformationError],
        warnings: &[TransformationWarning],
    ) -> IssueSummary {
        let mut summary = IssueSummary {
            errors: errors.len(),
            warnings: warnings.len(),
            ..IssueSummary::default()
        };
        for issue in errors.iter().chain(warnings) {
            if issue.is_run_level() {
                summary.run_level += 1;
            }
            let field = issue.field.clone().unwrap_or_else(|| "-".to_string());
            *summary.by_field.entry(field).or_default() += 1;
        }
        summary
    }

    /// Human-readable report: a headline, then the listed issues
    #[must_use]
    pub fn render(
        &self,
        errors: &[TransformationError],
        warnings: &[TransformationWarning],
    ) -> String {
        let summary = self.summarize(errors, warnings);
        let mut out = format!(
            "{} error(s), {} warning(s)\n",
            summary.errors, summary.warnings
        );

        for issues in [errors, warnings] {
            for issue in issues.iter().take(self.max_listed) {
                out.push_str("  ");
                out.push_str(&issue.to_string());
                out.push('\n');
            }
            if issues.len() > self.max_listed {
                out.push_str(&format!(
                    "  ... {} more\n",
                    issues.len() - self.max_listed
                ));
            }
        }

        if !summary.by_field.is_empty() {
            let fields: Vec<String> = summary
                .by_field
                .iter()
                .map(|(field, count)| format!("{field}={count}"))
                .collect();
            out.push_str(&format!("by field: {}\n", fields.join(", ")));
        }
        out
    }
}

impl Default for ValidationReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        let issue = TransformationError::new(3, "Email is required").with_field("email");
        assert_eq!(issue.to_string(), "[error] row 3, field 'email': Email is required");

        let run = TransformationError::run_level("Unknown transform function 'shout'");
        assert_eq!(run.to_string(), "[error] run: Unknown transform function 'shout'");
    }

    #[test]
    fn test_serialization_skips_missing_parts() {
        let issue = TransformationError::warning(2, "Short name")
            .with_field("firstName")
            .with_value(json!("A"));
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({
                "row": 2,
                "field": "firstName",
                "message": "Short name",
                "severity": "warning",
                "value": "A"
            })
        );
    }

    #[test]
    fn test_summarize_and_render() {
        let errors = vec![
            TransformationError::new(1, "a").with_field("email"),
            TransformationError::new(2, "b").with_field("email"),
            TransformationError::run_level("c"),
        ];
        let warnings = vec![TransformationError::warning(1, "d").with_field("phone")];

        let reporter = ValidationReporter::new().with_limit(2);
        let summary = reporter.summarize(&errors, &warnings);
        assert_eq!(summary.errors, 3);
        assert_eq!(summary.run_level, 1);
        assert_eq!(summary.by_field.get("email"), Some(&2));
        assert_eq!(summary.by_field.get("-"), Some(&1));

        let text = reporter.render(&errors, &warnings);
        assert!(text.starts_with("3 error(s), 1 warning(s)\n"));
        assert!(text.contains("  ... 1 more\n"));
        assert!(text.contains("[warning] row 1, field 'phone': d"));
        assert!(text.contains("by field: -=1, email=2, phone=1"));
    }
}
