pub mod collection;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod entity;
pub mod error;
pub mod registry;
pub mod row;

pub use config::{MarshalConfig, NumericMode, OptionalPolicy};
pub use decoder::PrimitiveValueDecoder;
pub use encoder::ValueEncoder;
pub use entity::Entity;
pub use error::EngineError;
pub use registry::TypeRegistry;
pub use row::{RowCodec, TypedValue};
