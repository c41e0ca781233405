//! Wire value → native value, for values known to be primitive.
//!
//! Not the inverse of the encoder: there is no composite case. Result set
//! columns are primitive (or nullable primitive), which is all hydration
//! needs. Bytes slots are not inverted exactly either: the encoder takes a
//! string or a byte array for STRING/YSON, while the decoder returns a
//! string whenever the bytes are valid UTF-8, so `[104, 105]` comes back
//! as `"hi"`.

use serde_json::{Number, Value};
use tabula_api::error::MarshalError;
use tabula_api::value::{Slot, WireValue};

use crate::config::{MarshalConfig, NumericMode};

#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveValueDecoder {
    numeric: NumericMode,
}

impl PrimitiveValueDecoder {
    pub fn new(config: &MarshalConfig) -> Self {
        Self {
            numeric: config.numeric,
        }
    }

    /// Decode the populated slot. `items` and `pairs` are ignored.
    pub fn decode_native(&self, value: &WireValue) -> Result<Value, MarshalError> {
        let slot = value.value.as_ref().ok_or(MarshalError::NotAPrimitiveValue)?;
        match slot {
            Slot::Bool(b) => Ok(Value::Bool(*b)),
            Slot::Int32(n) => self.signed(i64::from(*n)),
            Slot::Uint32(n) => self.unsigned(u64::from(*n)),
            Slot::Int64(n) => self.signed(*n),
            Slot::Uint64(n) => self.unsigned(*n),
            Slot::Float(f) => float(f64::from(*f)),
            Slot::Double(f) => float(*f),
            Slot::Bytes(bytes) => Ok(match std::str::from_utf8(bytes) {
                Ok(text) => Value::String(text.to_string()),
                Err(_) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            }),
            Slot::Text(text) => Ok(Value::String(text.clone())),
            Slot::Nested(None) => Ok(Value::Null),
            Slot::Nested(Some(inner)) => self.decode_native(inner),
        }
    }

    fn signed(&self, n: i64) -> Result<Value, MarshalError> {
        match self.numeric {
            NumericMode::Preserve => Ok(Value::from(n)),
            NumericMode::Collapse => float(n as f64),
        }
    }

    fn unsigned(&self, n: u64) -> Result<Value, MarshalError> {
        match self.numeric {
            NumericMode::Preserve => Ok(Value::from(n)),
            NumericMode::Collapse => float(n as f64),
        }
    }
}

fn float(f: f64) -> Result<Value, MarshalError> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| MarshalError::ValueMismatch {
            expected: "finite number",
            actual: f.to_string(),
        })
}
