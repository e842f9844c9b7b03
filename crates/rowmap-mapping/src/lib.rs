#![deny(unsafe_op_in_unsafe_fn)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # rowmap-mapping
//!
//! Function registry, built-in functions, global transform stage, and the
//! per-row transformer.
//!
//! Schemas only name functions; a [`FunctionRegistry`] resolves those names
//! at run time. The registry is passed explicitly to the
//! [`RowTransformer`] and to [`apply_global_transforms`].

pub mod builtins;
pub mod global;
pub mod numeric;
pub mod registry;
pub mod runtime;

pub use global::apply_global_transforms;
pub use registry::{FunctionKind, FunctionRegistry};
pub use runtime::RowTransformer;

use rowmap_schema::FunctionError;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while applying a schema to rows
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown {kind} function '{name}'")]
    UnknownFunction { kind: FunctionKind, name: String },

    #[error("Function '{name}' failed: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },

    #[error("Required field '{field}' is missing")]
    RequiredField { field: String },

    #[error("Field '{field}' is invalid: {message}")]
    InvalidField {
        field: String,
        message: String,
        value: Value,
    },

    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Global transform '{kind}' failed: {source}")]
    GlobalTransform {
        kind: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Path error: {0}")]
    Path(#[from] rowmap_schema::Error),
}

impl Error {
    /// Build an unknown-function error.
    pub fn unknown_function(kind: FunctionKind, name: impl Into<String>) -> Self {
        Self::UnknownFunction {
            kind,
            name: name.into(),
        }
    }

    /// Attach the target field path to an error
    #[must_use]
    pub fn in_field(self, field: impl Into<String>) -> Self {
        match self {
            Self::RequiredField { .. } | Self::InvalidField { .. } | Self::Field { .. } => self,
            other => Self::Field {
                field: field.into(),
                source: Box::new(other),
            },
        }
    }

    /// Target field the error belongs to, when known
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::RequiredField { field }
            | Self::InvalidField { field, .. }
            | Self::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Whether the error comes from schema configuration (an undeclared
    /// function) rather than from the data
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::UnknownFunction { .. } => true,
            Self::Field { source, .. } | Self::GlobalTransform { source, .. } => {
                source.is_configuration()
            }
            _ => false,
        }
    }

    /// The value that failed a field check, if any
    #[must_use]
    pub fn invalid_value(&self) -> Option<&Value> {
        match self {
            Self::InvalidField { value, .. } => Some(value),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
