//! Named schema catalog

use crate::factories::schema_for;
use crate::model::{DataMappingSchema, SourceType, TargetType};
use crate::Result;
use dashmap::DashMap;
use tracing::debug;

/// Thread-safe store of schemas keyed by id
///
/// Lookups hand out clones, so callers can adjust a schema without
/// affecting other users of the registry.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, DataMappingSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }

    /// Create a registry holding every factory schema as `<target>-<source>`
    ///
    /// # Errors
    ///
    /// Returns an error only if a factory schema fails to build.
    pub fn with_builtins() -> Result<Self> {
        let registry = Self::new();
        for target in TargetType::ALL {
            for source in SourceType::ALL {
                registry.register(schema_for(source, target)?);
            }
        }
        debug!("Seeded schema registry with {} built-in schemas", registry.len());
        Ok(registry)
    }

    /// Register a schema under its id, replacing any previous entry
    pub fn register(&self, schema: DataMappingSchema) {
        self.schemas.insert(schema.id.clone(), schema);
    }

    /// Get a copy of the schema registered as `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<DataMappingSchema> {
        self.schemas.get(id).map(|entry| entry.value().clone())
    }

    /// Check if a schema exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Registered ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
