use std::sync::Arc;

use tabula_api::entity::{AnnotationStore, EntitySchema, Record, TypedData, TypedRow};
use tabula_api::error::MarshalError;
use tabula_api::naming::{to_camel, to_snake};
use tabula_api::types::{DeclaredType, StructMember};
use tabula_api::value::{ResultSet, Row, WireValue};

use crate::config::MarshalConfig;
use crate::decoder::PrimitiveValueDecoder;
use crate::encoder::ValueEncoder;
use crate::entity::Entity;

/// A declared type together with a value encoded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub ty: DeclaredType,
    pub value: WireValue,
}

/// Entity ↔ wire row conversion.
///
/// Encode path: typed properties are zipped with struct members by
/// position, in schema registration order. Decode path: row items are
/// zipped with result set columns by position.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCodec {
    encoder: ValueEncoder,
    decoder: PrimitiveValueDecoder,
}

impl RowCodec {
    pub fn new(config: &MarshalConfig) -> Self {
        Self {
            encoder: ValueEncoder::new(config),
            decoder: PrimitiveValueDecoder::new(config),
        }
    }

    pub fn typed_properties<'a, E: TypedData + ?Sized>(&self, entity: &'a E) -> Vec<&'a str> {
        entity.schema().typed_properties().collect()
    }

    /// Struct type of the entity's typed properties, member names in
    /// snake_case.
    pub fn row_type<E: TypedData + ?Sized>(&self, entity: &E) -> DeclaredType {
        let members = entity
            .schema()
            .properties()
            .iter()
            .map(|p| StructMember {
                name: to_snake(&p.name),
                ty: p.ty.clone(),
            })
            .collect();
        DeclaredType::Struct(members)
    }

    /// Struct value matching `row_type`. A typed property the entity does
    /// not carry encodes as null.
    pub fn row_value<E: TypedData + ?Sized>(&self, entity: &E) -> Result<WireValue, MarshalError> {
        self.row_value_in(entity.schema(), entity)
    }

    /// Like `row_value`, with property types looked up in `store`.
    ///
    /// The entity's schema still decides which properties are encoded and
    /// in what order. A property the store has no type for fails as
    /// `ValueEncoder::encode_declared` does without a type.
    pub fn row_value_in<S, E>(&self, store: &S, entity: &E) -> Result<WireValue, MarshalError>
    where
        S: AnnotationStore + ?Sized,
        E: TypedData + ?Sized,
    {
        let schema = entity.schema();
        let items = schema
            .typed_properties()
            .map(|name| {
                entity
                    .property(name)
                    .and_then(|value| {
                        self.encoder
                            .encode_declared(store.lookup(&schema.name, name), value.as_ref())
                    })
                    .map_err(|e| e.with_context(format!("property '{}.{name}'", schema.name)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::trace!(entity = %schema.name, items = items.len(), "encoded row");
        Ok(WireValue::items(items))
    }

    pub fn typed_row<E: TypedData + ?Sized>(&self, entity: &E) -> Result<TypedValue, MarshalError> {
        Ok(TypedValue {
            ty: self.row_type(entity),
            value: self.row_value(entity)?,
        })
    }

    /// Decode every row into a plain record keyed by camelCase column name.
    ///
    /// No columns means no records, even when rows are present.
    pub fn decode_records(&self, result_set: &ResultSet) -> Result<Vec<Record>, MarshalError> {
        if result_set.columns.is_empty() {
            if !result_set.rows.is_empty() {
                tracing::warn!(rows = result_set.rows.len(), "result set has no columns, dropping rows");
            }
            return Ok(Vec::new());
        }

        let names: Vec<String> = result_set.columns.iter().map(|c| to_camel(&c.name)).collect();
        result_set
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                self.decode_row(&names, result_set, row)
                    .map_err(|e| e.with_context(format!("row {i}")))
            })
            .collect()
    }

    fn decode_row(&self, names: &[String], result_set: &ResultSet, row: &Row) -> Result<Record, MarshalError> {
        if row.items.len() != names.len() {
            return Err(MarshalError::ArityMismatch {
                expected: names.len(),
                actual: row.items.len(),
            });
        }
        let mut record = Record::new();
        for ((name, column), item) in names.iter().zip(&result_set.columns).zip(&row.items) {
            let value = self
                .decoder
                .decode_native(item)
                .map_err(|e| e.with_context(format!("column '{}'", column.name)))?;
            record.insert(name.clone(), value);
        }
        Ok(record)
    }

    /// Hydrate statically declared entities, one per row.
    pub fn hydrate<T: TypedRow>(&self, result_set: &ResultSet) -> Result<Vec<T>, MarshalError> {
        let records = self.decode_records(result_set)?;
        let entity = &T::entity_schema().name;
        tracing::debug!(entity = %entity, rows = records.len(), "hydrating result set");
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| T::from_record(record).map_err(|e| e.with_context(format!("row {i}"))))
            .collect()
    }

    /// Hydrate runtime entities bound to `schema`, one per row.
    pub fn hydrate_entities(
        &self,
        schema: &Arc<EntitySchema>,
        result_set: &ResultSet,
    ) -> Result<Vec<Entity>, MarshalError> {
        let records = self.decode_records(result_set)?;
        tracing::debug!(entity = %schema.name, rows = records.len(), "hydrating result set");
        Ok(records
            .into_iter()
            .map(|record| Entity::new(Arc::clone(schema), record))
            .collect())
    }
}
