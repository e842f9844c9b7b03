#![deny(unsafe_op_in_unsafe_fn)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # rowmap-pipeline
//!
//! Runs a mapping schema over a collection of rows: global transforms,
//! then per-row mapping and validation, collected into a
//! [`TransformationResult`].
//!
//! ## Example Usage
//!
//! ```rust
//! use rowmap_pipeline::{TransformOptions, transform_data};
//! use rowmap_schema::{DataMappingSchema, FieldMapping, SourceType, TargetType};
//! use serde_json::json;
//!
//! let schema = DataMappingSchema::new("users", "Users", SourceType::Csv, TargetType::User)
//!     .with_field(FieldMapping::new("mail", "email").unwrap().with_transform("trim|lower").unwrap());
//!
//! let result = transform_data(&[json!({"mail": " A@B.com "})], &schema, &TransformOptions::default());
//! assert!(result.success);
//! assert_eq!(result.data, vec![json!({"email": "a@b.com"})]);
//! ```

pub mod engine;
pub mod options;
pub mod result;

pub use engine::{RunState, TransformEngine, transform_data};
pub use options::TransformOptions;
pub use result::{ResultMetadata, TransformationResult};
