//! Schema loader for YAML and JSON mapping definitions

use crate::model::DataMappingSchema;
use crate::registry::SchemaRegistry;
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Loads mapping schemas from text or from files on a search path
///
/// Schemas found through [`SchemaLoader::load`] are cached in the
/// attached [`SchemaRegistry`] under their id.
pub struct SchemaLoader {
    registry: Arc<SchemaRegistry>,
    schema_paths: Vec<PathBuf>,
}

impl SchemaLoader {
    /// Create a loader with the given search paths and an empty cache
    #[must_use]
    pub fn new(schema_paths: Vec<PathBuf>) -> Self {
        Self {
            registry: Arc::new(SchemaRegistry::new()),
            schema_paths,
        }
    }

    /// Create a loader that caches into (and resolves from) `registry`
    #[must_use]
    pub fn with_registry(registry: Arc<SchemaRegistry>, schema_paths: Vec<PathBuf>) -> Self {
        Self {
            registry,
            schema_paths,
        }
    }

    /// Add a search path for schema files
    pub fn add_path(&mut self, path: PathBuf) {
        self.schema_paths.push(path);
    }

    /// The registry used as cache
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Load a schema by id, checking the registry before the search paths
    ///
    /// Looks for `<id>.yaml`, `<id>.yml` and `<id>.json` in each search
    /// path, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no file matches, or the parse /
    /// validation error of the file that did.
    pub fn load(&self, id: &str) -> Result<DataMappingSchema> {
        if let Some(cached) = self.registry.get(id) {
            debug!("Cache hit for schema: {}", id);
            return Ok(cached);
        }
        trace!("Cache miss for schema: {}", id);

        let candidates = [
            format!("{id}.yaml"),
            format!("{id}.yml"),
            format!("{id}.json"),
        ];
        for dir in &self.schema_paths {
            for candidate in &candidates {
                let path = dir.join(candidate);
                if path.exists() {
                    let schema = self.load_file(&path)?;
                    self.registry.register(schema.clone());
                    return Ok(schema);
                }
            }
        }

        Err(Error::NotFound(format!(
            "{id} (search paths: {:?})",
            self.schema_paths
        )))
    }

    /// Load and validate a schema file; `.yaml`/`.yml` are read as YAML,
    /// everything else as JSON
    ///
    /// # Errors
    ///
    /// Returns an IO error, an [`Error::InvalidFormat`] naming the file,
    /// or an [`Error::Validation`].
    pub fn load_file(&self, path: &Path) -> Result<DataMappingSchema> {
        trace!("Loading schema from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let location = path.display().to_string();

        let is_yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");
        let schema = if is_yaml {
            parse_yaml(&content, &location)?
        } else {
            parse_json(&content, &location)?
        };

        Self::validate(&schema)?;
        info!(
            "Loaded schema '{}' ({} fields) from {}",
            schema.id,
            schema.fields.len(),
            location
        );
        Ok(schema)
    }

    /// Parse and validate a schema from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] or [`Error::Validation`].
    pub fn from_yaml_str(yaml: &str) -> Result<DataMappingSchema> {
        let schema = parse_yaml(yaml, "<yaml>")?;
        Self::validate(&schema)?;
        Ok(schema)
    }

    /// Parse and validate a schema from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] or [`Error::Validation`].
    pub fn from_json_str(json: &str) -> Result<DataMappingSchema> {
        let schema = parse_json(json, "<json>")?;
        Self::validate(&schema)?;
        Ok(schema)
    }

    /// Check the structural invariants of a schema
    ///
    /// The id must be non-empty, there must be at least one field mapping,
    /// and every mapping must have a non-empty target. A source may be
    /// empty only when a transform computes the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first violation.
    pub fn validate(schema: &DataMappingSchema) -> Result<()> {
        if schema.id.trim().is_empty() {
            return Err(Error::Validation("schema id must not be empty".to_string()));
        }
        if schema.fields.is_empty() {
            return Err(Error::Validation(format!(
                "schema '{}' has no field mappings",
                schema.id
            )));
        }

        let mut targets = HashSet::new();
        for (i, field) in schema.fields.iter().enumerate() {
            if field.target.is_empty() {
                return Err(Error::Validation(format!(
                    "field mapping #{} in schema '{}' has an empty target",
                    i + 1,
                    schema.id
                )));
            }
            if field.source.is_empty() && field.transform.is_none() {
                return Err(Error::Validation(format!(
                    "field mapping for '{}' has neither a source nor a transform",
                    field.target
                )));
            }
            if !targets.insert(field.target.as_str()) {
                trace!("Target '{}' is written by more than one mapping", field.target);
            }
        }

        for rule in &schema.validation {
            if rule.field.is_empty() {
                return Err(Error::Validation(format!(
                    "validation rule '{}' has an empty field",
                    rule.rule
                )));
            }
        }

        Ok(())
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

fn parse_yaml(text: &str, location: &str) -> Result<DataMappingSchema> {
    serde_yaml::from_str(text).map_err(|e| {
        let location = match e.location() {
            Some(at) => format!("{location}:{}:{}", at.line(), at.column()),
            None => location.to_string(),
        };
        Error::invalid_format(location, format!("YAML parse error: {e}"))
    })
}

fn parse_json(text: &str, location: &str) -> Result<DataMappingSchema> {
    serde_json::from_str(text).map_err(|e| {
        Error::invalid_format(
            format!("{location}:{}:{}", e.line(), e.column()),
            format!("JSON parse error: {e}"),
        )
    })
}
