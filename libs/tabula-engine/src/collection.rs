use tabula_api::entity::TypedData;
use tabula_api::error::MarshalError;
use tabula_api::types::DeclaredType;
use tabula_api::value::WireValue;

use crate::row::{RowCodec, TypedValue};

impl RowCodec {
    /// Wrap same-shaped entities into one `List<Struct<...>>` value.
    ///
    /// The list item type comes from the first entity alone. Callers must
    /// pass entities sharing one typed-property set; mixed input yields
    /// values that do not match the declared type and is not detected.
    pub fn typed_collection<E: TypedData>(&self, entities: &[E]) -> Result<TypedValue, MarshalError> {
        let first = entities.first().ok_or(MarshalError::EmptyCollection)?;
        let ty = DeclaredType::list(self.row_type(first));
        let items = entities
            .iter()
            .enumerate()
            .map(|(i, e)| self.row_value(e).map_err(|err| err.with_context(format!("element {i}"))))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(entity = %first.schema().name, len = items.len(), "encoded collection");
        Ok(TypedValue {
            ty,
            value: WireValue::items(items),
        })
    }
}
