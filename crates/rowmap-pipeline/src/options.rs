//! Run options

use serde::{Deserialize, Serialize};

/// Options controlling one transformation run
///
/// Every field has a default, so a partial YAML or JSON document
/// deserializes into a complete set of options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Keep going after a row fails to transform
    pub skip_errors: bool,
    /// Stop the run once this many errors were collected
    pub max_errors: Option<usize>,
    /// Transform and validate without collecting output records
    pub validate_only: bool,
    /// Check the schema's function names before touching any row
    pub fail_fast: bool,
}

impl TransformOptions {
    /// Reject option combinations no run can honor
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.max_errors == Some(0) {
            return Err("max_errors must be at least 1".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn skip_errors(mut self) -> Self {
        self.skip_errors = true;
        self
    }

    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = Some(max_errors);
        self
    }

    #[must_use]
    pub fn validate_only(mut self) -> Self {
        self.validate_only = true;
        self
    }

    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }
}
