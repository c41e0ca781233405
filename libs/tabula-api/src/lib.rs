pub mod entity;
pub mod error;
pub mod naming;
pub mod types;
pub mod value;

pub use entity::{AnnotationStore, EntitySchema, PropertyType, Record, TypedData, TypedRow};
pub use error::MarshalError;
pub use tabula_api_derive::TypedData;
pub use types::{DeclaredType, PrimitiveTypeId, StructMember};
pub use value::{Column, ResultSet, Row, Slot, ValuePair, WireValue};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
