//! Dot-path addressing into JSON records
//!
//! Paths are split into segments once and walked iteratively. Reads never
//! create anything; writes create intermediate objects on demand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A parsed dot-path such as `address.city`
///
/// The empty path has no segments. It never resolves to a value and cannot
/// be written to; it marks a purely computed field mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dot-path
    ///
    /// # Errors
    ///
    /// Returns an error when the path contains an empty segment.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(Error::invalid_path(
                path,
                format!("empty segment at position {position}"),
            ));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// Whether this path has no segments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Original textual form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path segments in traversal order
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve the path against a record.
    ///
    /// Returns `None` when any segment is missing, when an intermediate value
    /// is not a container, or when the path is empty.
    #[must_use]
    pub fn get<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        if self.segments.is_empty() {
            return None;
        }

        let mut current = record;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write a value at this path, creating intermediate objects.
    ///
    /// Non-object intermediates (including the record itself) are replaced
    /// by empty objects. An existing value at the final segment is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error when the path is empty.
    pub fn set(&self, record: &mut Value, value: Value) -> Result<()> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(Error::invalid_path("", "cannot write to an empty path"));
        };

        let mut current = record;
        for segment in parents {
            current = ensure_object(current)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(current).insert(last.clone(), value);
        Ok(())
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was replaced with an object above"),
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
