//! Schema model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::constraint::FieldConstraint;
use crate::context::TransformContext;
use crate::function::{ConditionRef, FunctionResult, PredicateRef, RuleRef, TransformRef};
use crate::path::FieldPath;
use crate::Result;

/// Format of the records a schema consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Csv,
    Json,
    Xml,
    ExternalApi,
    /// Records produced by a specific third-party integration
    Integration,
}

impl SourceType {
    /// Every source type, in declaration order
    pub const ALL: [SourceType; 5] = [
        SourceType::Csv,
        SourceType::Json,
        SourceType::Xml,
        SourceType::ExternalApi,
        SourceType::Integration,
    ];
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::ExternalApi => "external-api",
            Self::Integration => "integration",
        };
        f.write_str(name)
    }
}

/// Domain entity a schema produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    User,
    Team,
    Field,
    Reservation,
    Payment,
}

impl TargetType {
    /// Every target type, in declaration order
    pub const ALL: [TargetType; 5] = [
        TargetType::User,
        TargetType::Team,
        TargetType::Field,
        TargetType::Reservation,
        TargetType::Payment,
    ];
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Team => "team",
            Self::Field => "field",
            Self::Reservation => "reservation",
            Self::Payment => "payment",
        };
        f.write_str(name)
    }
}

/// Severity of a reported issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Excludes the row from the output
    #[default]
    Error,
    /// Reported, does not block the row
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// One source-path to target-path conversion rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Source dot-path; empty for purely computed fields
    #[serde(default)]
    pub source: FieldPath,

    /// Target dot-path
    pub target: FieldPath,

    /// Transform pipeline applied to the extracted value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformRef>,

    /// Whether a failure on this field rejects the whole row
    #[serde(default)]
    pub required: bool,

    /// Substituted when the extracted value is null, absent or `""`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Check run on the transformed value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldConstraint>,

    /// Predicate deciding whether this mapping applies to a row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionRef>,
}

impl FieldMapping {
    /// Create a mapping copying `source` to `target`
    ///
    /// # Errors
    ///
    /// Returns an error if either path is malformed.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        Ok(Self {
            source: FieldPath::parse(source)?,
            target: FieldPath::parse(target)?,
            transform: None,
            required: false,
            default_value: None,
            validation: None,
            condition: None,
        })
    }

    /// Set a named transform pipeline such as `trim|lower`
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline text does not parse.
    pub fn with_transform(mut self, pipeline: &str) -> Result<Self> {
        self.transform = Some(pipeline.parse()?);
        Ok(self)
    }

    /// Set an inline transform
    #[must_use]
    pub fn with_inline_transform(
        mut self,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<Value>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.transform = Some(TransformRef::inline(func));
        self
    }

    /// Set a named condition such as `notEmpty`
    ///
    /// # Errors
    ///
    /// Returns an error if the condition text does not parse.
    pub fn with_condition(mut self, condition: &str) -> Result<Self> {
        self.condition = Some(condition.parse()?);
        Ok(self)
    }

    /// Set an inline condition
    #[must_use]
    pub fn with_inline_condition(
        mut self,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.condition = Some(PredicateRef::inline(func));
        self
    }

    /// Mark the mapping as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the field-level validation
    #[must_use]
    pub fn with_validation(mut self, constraint: FieldConstraint) -> Self {
        self.validation = Some(constraint);
        self
    }
}

/// Sort order for the `sort` global transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Collection-level operation applied before any row is mapped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GlobalTransform {
    /// Keep rows for which the condition holds
    Filter { condition: ConditionRef },

    /// Stable sort by a field
    Sort {
        field: FieldPath,
        #[serde(default)]
        direction: SortDirection,
    },

    /// Keep the first row for each distinct key value
    Deduplicate { field: FieldPath },

    /// Reserved; currently leaves the collection unchanged
    Group {
        #[serde(default)]
        parameters: Map<String, Value>,
    },
}

impl GlobalTransform {
    /// Build a filter from a named condition
    ///
    /// # Errors
    ///
    /// Returns an error if the condition text does not parse.
    pub fn filter(condition: &str) -> Result<Self> {
        Ok(Self::Filter {
            condition: condition.parse()?,
        })
    }

    /// Build a sort on `field`
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn sort(field: &str, direction: SortDirection) -> Result<Self> {
        Ok(Self::Sort {
            field: FieldPath::parse(field)?,
            direction,
        })
    }

    /// Build a deduplication on `field`
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn deduplicate(field: &str) -> Result<Self> {
        Ok(Self::Deduplicate {
            field: FieldPath::parse(field)?,
        })
    }

    /// Operation name, as written in schema files
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filter { .. } => "filter",
            Self::Sort { .. } => "sort",
            Self::Deduplicate { .. } => "deduplicate",
            Self::Group { .. } => "group",
        }
    }
}

/// Row-level rule checked against the transformed record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Dot-path into the transformed record
    pub field: FieldPath,
    /// Validation function
    pub rule: RuleRef,
    /// Message reported when the rule fails
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

impl ValidationRule {
    /// Create a rule from a named validation such as `minLength:2`
    ///
    /// # Errors
    ///
    /// Returns an error if the path or rule text is malformed.
    pub fn new(field: &str, rule: &str, message: impl Into<String>, severity: Severity) -> Result<Self> {
        Ok(Self {
            field: FieldPath::parse(field)?,
            rule: rule.parse()?,
            message: message.into(),
            severity,
        })
    }

    /// Create a rule from an inline predicate
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn inline(
        field: &str,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
        message: impl Into<String>,
        severity: Severity,
    ) -> Result<Self> {
        Ok(Self {
            field: FieldPath::parse(field)?,
            rule: PredicateRef::inline(func),
            message: message.into(),
            severity,
        })
    }
}

/// Authoring metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

impl SchemaMetadata {
    /// Metadata stamped with the current time
    pub fn now(created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            created_by: created_by.into(),
        }
    }
}

impl Default for SchemaMetadata {
    fn default() -> Self {
        Self::now("unknown")
    }
}

/// A complete source-to-target mapping definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataMappingSchema {
    pub id: String,
    pub name: String,
    pub source_type: SourceType,
    pub target_type: TargetType,
    #[serde(default = "default_version")]
    pub version: String,
    pub fields: Vec<FieldMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_transforms: Vec<GlobalTransform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(default)]
    pub metadata: SchemaMetadata,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl DataMappingSchema {
    /// Create an empty schema
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source_type: SourceType,
        target_type: TargetType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_type,
            target_type,
            version: default_version(),
            fields: Vec::new(),
            global_transforms: Vec::new(),
            validation: Vec::new(),
            metadata: SchemaMetadata::default(),
        }
    }

    /// Append a field mapping
    #[must_use]
    pub fn with_field(mut self, field: FieldMapping) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a global transform
    #[must_use]
    pub fn with_global_transform(mut self, transform: GlobalTransform) -> Self {
        self.global_transforms.push(transform);
        self
    }

    /// Append a row validation rule
    #[must_use]
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Set the schema version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set authoring metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: SchemaMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
