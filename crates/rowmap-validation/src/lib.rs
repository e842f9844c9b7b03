#![deny(unsafe_op_in_unsafe_fn)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # rowmap-validation
//!
//! Row-level validation of transformed records and the issue model shared
//! by the whole transformation run.
//!
//! ## Example Usage
//!
//! ```rust
//! use rowmap_mapping::FunctionRegistry;
//! use rowmap_schema::{Severity, TransformContext, ValidationRule};
//! use rowmap_validation::RowValidator;
//! use serde_json::{json, Map};
//!
//! let registry = FunctionRegistry::with_builtins();
//! let rules = vec![
//!     ValidationRule::new("email", "required", "Email is required", Severity::Error).unwrap(),
//! ];
//!
//! let rows = [json!({"mail": "x"})];
//! let record = json!({"name": "no email"});
//! let mut metadata = Map::new();
//! let mut context = TransformContext::new(&rows, &rows[0], 0, &[], &mut metadata);
//!
//! let result = RowValidator::new(&registry).validate_row(&rules, &record, &mut context);
//! assert_eq!(result.errors.len(), 1);
//! assert_eq!(result.errors[0].row, 1);
//! ```

pub mod engine;
pub mod reporter;

pub use engine::{RowValidator, ValidationResult};
pub use reporter::{
    IssueSummary, Severity, TransformationError, TransformationWarning, ValidationReporter,
};
