use std::sync::Arc;

use serde_json::Value;
use tabula_api::entity::{EntitySchema, Record, TypedData};
use tabula_api::error::MarshalError;

/// Runtime entity: a plain record bound to a registered class schema.
///
/// The record may hold properties the schema does not type; codecs never
/// look at those.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    schema: Arc<EntitySchema>,
    record: Record,
}

impl Entity {
    pub fn new(schema: Arc<EntitySchema>, record: Record) -> Self {
        Self { schema, record }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.record.insert(name.into(), value);
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl TypedData for Entity {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn property(&self, name: &str) -> Result<Option<Value>, MarshalError> {
        Ok(self.record.get(name).cloned())
    }
}
