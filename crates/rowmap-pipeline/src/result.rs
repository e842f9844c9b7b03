//! Run results

use rowmap_validation::{TransformationError, TransformationWarning};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Input rows, before global transforms
    pub total_records: usize,
    /// Rows the per-row loop visited
    pub processed_records: usize,
    /// Rows dropped for a transform failure or an error-severity issue
    pub skipped_records: usize,
    /// Rows written to `data`
    pub transformed_records: usize,
    pub duration_ms: u64,
}

/// Outcome of a run
///
/// `success` is false whenever `errors` is non-empty. Partial output is
/// kept when a run stops early.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationResult {
    pub success: bool,
    pub data: Vec<Value>,
    pub errors: Vec<TransformationError>,
    pub warnings: Vec<TransformationWarning>,
    pub metadata: ResultMetadata,
}

impl TransformationResult {
    /// Issues that are not tied to a row
    pub fn run_level_errors(&self) -> impl Iterator<Item = &TransformationError> {
        self.errors.iter().filter(|e| e.is_run_level())
    }

    /// Errors reported for a 1-based row
    pub fn errors_for_row(&self, row: usize) -> impl Iterator<Item = &TransformationError> {
        self.errors.iter().filter(move |e| e.row == row)
    }
}
