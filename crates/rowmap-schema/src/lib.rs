#![deny(unsafe_op_in_unsafe_fn)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # rowmap-schema
//!
//! Declarative mapping schemas for converting external records into
//! internal domain records.
//!
//! A [`DataMappingSchema`] is pure data: ordered field mappings, global
//! transforms, and row validation rules. It references functions by name
//! (parsed once into [`FunctionCall`] stages) or carries inline closures,
//! but never depends on the registry that resolves those names.

/// Field-level value checks.
pub mod constraint;
/// Per-row execution context handed to every function.
pub mod context;
/// Ready-made schemas for known source format / target entity pairs.
pub mod factories;
/// Function references, the pipe mini-language, and function signatures.
pub mod function;
/// Schema file loading and structural validation.
pub mod loader;
/// Schema model definitions.
pub mod model;
/// Dot-path addressing into JSON records.
pub mod path;
/// Named schema catalog.
pub mod registry;
/// Helpers over `serde_json::Value`.
pub mod value;

pub use constraint::{FieldConstraint, RuleResult, ValueFormat, ValueType};
pub use context::TransformContext;
pub use function::{
    ConditionFn, ConditionRef, FunctionCall, FunctionError, FunctionResult, PredicateFn,
    PredicateRef, RuleRef, TransformFn, TransformRef, ValidationFn,
};
pub use loader::SchemaLoader;
pub use model::{
    DataMappingSchema, FieldMapping, GlobalTransform, SchemaMetadata, Severity, SortDirection,
    SourceType, TargetType, ValidationRule,
};
pub use path::FieldPath;
pub use registry::SchemaRegistry;

use thiserror::Error;

/// Errors that can occur when building or loading schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid function reference '{reference}': {reason}")]
    InvalidFunctionRef { reference: String, reason: String },

    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Invalid schema format in {location}: {message}")]
    InvalidFormat { location: String, message: String },

    #[error("Schema validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an invalid-path error with the offending path and reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-function-reference error.
    pub fn invalid_function_ref(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFunctionRef {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Build a format error with the source location (file path or input kind).
    pub fn invalid_format(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            location: location.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
