use serde::{Deserialize, Serialize};

/// Primitive slot of a wire value. Exactly one slot is populated per
/// primitive value; the enum makes a second one unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "boolValue")]
    Bool(bool),
    #[serde(rename = "int32Value")]
    Int32(i32),
    #[serde(rename = "uint32Value")]
    Uint32(u32),
    #[serde(rename = "int64Value")]
    Int64(i64),
    #[serde(rename = "uint64Value")]
    Uint64(u64),
    #[serde(rename = "floatValue")]
    Float(f32),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "bytesValue")]
    Bytes(Vec<u8>),
    #[serde(rename = "textValue")]
    Text(String),
    /// `None` is the absent marker an empty Optional encodes to.
    #[serde(rename = "nestedValue")]
    Nested(Option<Box<WireValue>>),
}

impl Slot {
    /// Protocol field name of the slot.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolValue",
            Self::Int32(_) => "int32Value",
            Self::Uint32(_) => "uint32Value",
            Self::Int64(_) => "int64Value",
            Self::Uint64(_) => "uint64Value",
            Self::Float(_) => "floatValue",
            Self::Double(_) => "doubleValue",
            Self::Bytes(_) => "bytesValue",
            Self::Text(_) => "textValue",
            Self::Nested(_) => "nestedValue",
        }
    }
}

/// Wire-level value. Shape follows the declared type it was encoded for:
///
/// - primitives: `value` holds one slot
/// - List, Tuple, Struct: positional `items`
/// - Dict: `pairs`
/// - absent Optional: `value = Nested(None)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireValue {
    #[serde(flatten)]
    pub value: Option<Slot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<WireValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<ValuePair>,
}

impl WireValue {
    pub fn primitive(slot: Slot) -> Self {
        Self {
            value: Some(slot),
            ..Self::default()
        }
    }

    pub fn items(items: Vec<WireValue>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn pairs(pairs: Vec<ValuePair>) -> Self {
        Self {
            pairs,
            ..Self::default()
        }
    }

    /// The explicit absent form of an Optional.
    pub fn absent() -> Self {
        Self::primitive(Slot::Nested(None))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.value, Some(Slot::Nested(None)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePair {
    pub key: WireValue,
    pub payload: WireValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
}

/// Positional row. Item `i` belongs to column `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub items: Vec<WireValue>,
}

/// Tabular query output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}
