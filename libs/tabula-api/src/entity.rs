use serde::{Deserialize, Serialize};

use crate::error::MarshalError;
use crate::types::DeclaredType;

/// Plain native record. Key order is insertion order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One typed property: application-side (camelCase) name + declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyType {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DeclaredType,
}

/// Static registration table of one entity class.
///
/// Built once per class (derive, builder or config) and shared by every
/// instance. Property order is registration order and is the order struct
/// members and row items are produced in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    properties: Vec<PropertyType>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Register `name` with `ty`. Re-registering a name replaces its type
    /// and keeps its original position.
    pub fn with_property(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        let name = name.into();
        if let Some(entry) = self.properties.iter_mut().find(|p| p.name == name) {
            entry.ty = ty;
        } else {
            self.properties.push(PropertyType { name, ty });
        }
        self
    }

    pub fn type_of(&self, property: &str) -> Option<&DeclaredType> {
        self.properties
            .iter()
            .find(|p| p.name == property)
            .map(|p| &p.ty)
    }

    pub fn typed_properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn properties(&self) -> &[PropertyType] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// First property name registered twice. Only reachable for schemas
    /// deserialized from config; the builder dedupes.
    pub fn duplicate_property(&self) -> Option<&str> {
        self.properties.iter().enumerate().find_map(|(i, p)| {
            self.properties[..i]
                .iter()
                .any(|q| q.name == p.name)
                .then_some(p.name.as_str())
        })
    }
}

/// Read-only `lookup(entity, property)` capability.
///
/// Populated before any encode/decode traffic; implementations must be
/// safe for concurrent reads.
pub trait AnnotationStore: Send + Sync {
    fn lookup(&self, entity: &str, property: &str) -> Option<&DeclaredType>;
}

impl AnnotationStore for EntitySchema {
    fn lookup(&self, entity: &str, property: &str) -> Option<&DeclaredType> {
        if entity != self.name {
            return None;
        }
        self.type_of(property)
    }
}

/// Instance side of an entity: its class schema and property access.
///
/// Properties without a registered type may exist but are never read by
/// the codecs.
pub trait TypedData {
    fn schema(&self) -> &EntitySchema;

    /// Native value of a property. `Ok(None)` when the entity has no such
    /// property.
    fn property(&self, name: &str) -> Result<Option<serde_json::Value>, MarshalError>;
}

/// Class side of a statically declared entity: its schema without an
/// instance, and construction from a hydrated record.
///
/// Implemented by `#[derive(TypedData)]`.
pub trait TypedRow: TypedData + Sized {
    fn entity_schema() -> &'static EntitySchema;

    fn from_record(record: Record) -> Result<Self, MarshalError>;
}

/// Deserialize one hydrated property into a field type.
///
/// Collapsed numeric decoding turns integers into floats, so when the value
/// does not fit as-is, integral floats are retried as integers. The first
/// error is reported when the retry fails too.
pub fn decode_property<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, MarshalError> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(err) => serde_json::from_value(integral_numbers(value)).map_err(|_| err.into()),
    }
}

fn integral_numbers(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => Value::from(f as u64),
            Some(f) if f.fract() == 0.0 && f < 0.0 && f >= i64::MIN as f64 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(integral_numbers).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, integral_numbers(v))).collect()),
        other => other,
    }
}
