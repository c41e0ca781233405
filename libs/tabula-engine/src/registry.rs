use std::collections::HashMap;
use std::sync::Arc;

use tabula_api::entity::{AnnotationStore, EntitySchema, Record, TypedRow};
use tabula_api::types::DeclaredType;

use crate::config::MarshalConfig;
use crate::entity::Entity;
use crate::error::EngineError;

/// Type annotation store for all entity classes of a process.
///
/// Filled once at startup, then only read. Schemas are shared with every
/// `Entity` created from them.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entities: HashMap<String, Arc<EntitySchema>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every `[[entities]]` entry of the config.
    pub fn from_config(config: &MarshalConfig) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for schema in &config.entities {
            registry
                .register(schema.clone())
                .map_err(|e| e.with_context("entities"))?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, schema: EntitySchema) -> Result<Arc<EntitySchema>, EngineError> {
        if let Some(property) = schema.duplicate_property() {
            return Err(EngineError::Config(format!(
                "entity '{}' declares property '{property}' twice",
                schema.name
            )));
        }
        if self.entities.contains_key(&schema.name) {
            return Err(EngineError::DuplicateEntity(schema.name));
        }
        tracing::debug!(entity = %schema.name, properties = schema.len(), "entity registered");
        let schema = Arc::new(schema);
        self.entities.insert(schema.name.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Register the static schema of a derived entity type.
    pub fn register_typed<T: TypedRow>(&mut self) -> Result<Arc<EntitySchema>, EngineError> {
        self.register(T::entity_schema().clone())
    }

    pub fn schema(&self, entity: &str) -> Option<&Arc<EntitySchema>> {
        self.entities.get(entity)
    }

    /// Bind a plain record to a registered class.
    pub fn entity(&self, entity: &str, record: Record) -> Result<Entity, EngineError> {
        let schema = self
            .schema(entity)
            .ok_or_else(|| EngineError::EntityNotFound(entity.to_string()))?;
        Ok(Entity::new(Arc::clone(schema), record))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl AnnotationStore for TypeRegistry {
    fn lookup(&self, entity: &str, property: &str) -> Option<&DeclaredType> {
        self.entities.get(entity)?.type_of(property)
    }
}
