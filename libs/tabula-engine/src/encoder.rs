//! Native value → wire value, driven by the declared type.

use serde_json::Value;
use tabula_api::error::MarshalError;
use tabula_api::types::{DeclaredType, PrimitiveTypeId};
use tabula_api::value::{Slot, ValuePair, WireValue};

use crate::config::{MarshalConfig, OptionalPolicy};

/// Wire slot a primitive kind is carried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Bool,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    Bytes,
    Text,
}

/// Fixed kind→slot table. `None` for ids without a slot.
pub fn slot_for(kind: PrimitiveTypeId) -> Option<SlotKind> {
    let slot = match kind {
        PrimitiveTypeId::BOOL => SlotKind::Bool,
        PrimitiveTypeId::INT8 | PrimitiveTypeId::INT16 | PrimitiveTypeId::INT32 => SlotKind::Int32,
        PrimitiveTypeId::UINT8
        | PrimitiveTypeId::UINT16
        | PrimitiveTypeId::UINT32
        | PrimitiveTypeId::DATE
        | PrimitiveTypeId::DATETIME => SlotKind::Uint32,
        PrimitiveTypeId::INT64 | PrimitiveTypeId::INTERVAL => SlotKind::Int64,
        PrimitiveTypeId::UINT64 | PrimitiveTypeId::TIMESTAMP => SlotKind::Uint64,
        PrimitiveTypeId::FLOAT => SlotKind::Float,
        PrimitiveTypeId::DOUBLE => SlotKind::Double,
        PrimitiveTypeId::STRING | PrimitiveTypeId::YSON => SlotKind::Bytes,
        PrimitiveTypeId::UTF8
        | PrimitiveTypeId::JSON
        | PrimitiveTypeId::UUID
        | PrimitiveTypeId::TZ_DATE
        | PrimitiveTypeId::TZ_DATETIME
        | PrimitiveTypeId::TZ_TIMESTAMP => SlotKind::Text,
        _ => return None,
    };
    Some(slot)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueEncoder {
    optional: OptionalPolicy,
}

impl ValueEncoder {
    pub fn new(config: &MarshalConfig) -> Self {
        Self {
            optional: config.optional,
        }
    }

    /// Encode with a possibly missing type. A missing type is always a
    /// caller error; the error kind tells whether a value was given.
    pub fn encode_declared(
        &self,
        ty: Option<&DeclaredType>,
        value: Option<&Value>,
    ) -> Result<WireValue, MarshalError> {
        match (ty, value) {
            (Some(ty), Some(value)) => self.encode(ty, value),
            (Some(ty), None) => self.encode(ty, &Value::Null),
            (None, None) => Err(MarshalError::MissingType),
            (None, Some(value)) => Err(MarshalError::InconsistentInput(format!(
                "type is missing for value {value}"
            ))),
        }
    }

    pub fn encode(&self, ty: &DeclaredType, value: &Value) -> Result<WireValue, MarshalError> {
        match ty {
            DeclaredType::Primitive(kind) => {
                let slot = slot_for(*kind).ok_or(MarshalError::UnknownPrimitiveKind(kind.0))?;
                Ok(WireValue::primitive(fill_slot(slot, value)?))
            }
            DeclaredType::Optional(inner) => {
                if self.optional.is_present(value) {
                    self.encode(inner, value)
                } else {
                    Ok(WireValue::absent())
                }
            }
            DeclaredType::List(item) => {
                let elements = as_array("list", value)?;
                let items = elements
                    .iter()
                    .enumerate()
                    .map(|(i, v)| self.encode(item, v).map_err(|e| e.with_context(format!("item {i}"))))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(WireValue::items(items))
            }
            DeclaredType::Tuple(elements) => {
                let values = as_array("tuple", value)?;
                let items = self.zip_positional(elements.iter(), values.iter(), values.len())?;
                Ok(WireValue::items(items))
            }
            DeclaredType::Struct(members) => {
                let types = members.iter().map(|m| &m.ty);
                let items = match value {
                    Value::Object(map) => self.zip_positional(types, map.values(), map.len())?,
                    Value::Array(values) => self.zip_positional(types, values.iter(), values.len())?,
                    other => return Err(MarshalError::value_mismatch("struct", other)),
                };
                Ok(WireValue::items(items))
            }
            DeclaredType::Dict { key, payload } => {
                let pairs = match value {
                    Value::Object(map) => map
                        .iter()
                        .map(|(k, v)| self.encode_pair(key, payload, &Value::String(k.clone()), v))
                        .collect::<Result<Vec<_>, _>>()?,
                    Value::Array(entries) => entries
                        .iter()
                        .map(|entry| match entry.as_array().map(Vec::as_slice) {
                            Some([k, v]) => self.encode_pair(key, payload, k, v),
                            _ => Err(MarshalError::value_mismatch("[key, payload] pair", entry)),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    other => return Err(MarshalError::value_mismatch("dict", other)),
                };
                Ok(WireValue::pairs(pairs))
            }
            DeclaredType::Decimal { .. } => Err(MarshalError::UnsupportedType("Decimal")),
            DeclaredType::Variant(_) => Err(MarshalError::UnsupportedType("Variant")),
        }
    }

    fn encode_pair(
        &self,
        key_ty: &DeclaredType,
        payload_ty: &DeclaredType,
        key: &Value,
        payload: &Value,
    ) -> Result<ValuePair, MarshalError> {
        Ok(ValuePair {
            key: self.encode(key_ty, key).map_err(|e| e.with_context("dict key"))?,
            payload: self
                .encode(payload_ty, payload)
                .map_err(|e| e.with_context(format!("dict payload for key {key}")))?,
        })
    }

    /// Zip values with declared types by position. Lengths must agree.
    fn zip_positional<'a>(
        &self,
        types: impl ExactSizeIterator<Item = &'a DeclaredType>,
        values: impl Iterator<Item = &'a Value>,
        actual: usize,
    ) -> Result<Vec<WireValue>, MarshalError> {
        let expected = types.len();
        if expected != actual {
            return Err(MarshalError::ArityMismatch { expected, actual });
        }
        types
            .zip(values)
            .enumerate()
            .map(|(i, (ty, v))| self.encode(ty, v).map_err(|e| e.with_context(format!("element {i}"))))
            .collect()
    }
}

fn as_array<'a>(expected: &'static str, value: &'a Value) -> Result<&'a Vec<Value>, MarshalError> {
    value
        .as_array()
        .ok_or_else(|| MarshalError::value_mismatch(expected, value))
}

/// Put a native value into the slot verbatim. Only range checks and the
/// f64→f32 narrowing happen here; values beyond the f32 range are rejected.
fn fill_slot(slot: SlotKind, value: &Value) -> Result<Slot, MarshalError> {
    let mismatch = |expected| MarshalError::value_mismatch(expected, value);
    let slot = match slot {
        SlotKind::Bool => Slot::Bool(value.as_bool().ok_or_else(|| mismatch("bool"))?),
        SlotKind::Int32 => Slot::Int32(
            value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| mismatch("int32"))?,
        ),
        SlotKind::Uint32 => Slot::Uint32(
            value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| mismatch("uint32"))?,
        ),
        SlotKind::Int64 => Slot::Int64(value.as_i64().ok_or_else(|| mismatch("int64"))?),
        SlotKind::Uint64 => Slot::Uint64(value.as_u64().ok_or_else(|| mismatch("uint64"))?),
        SlotKind::Float => Slot::Float(
            value
                .as_f64()
                .filter(|f| f.abs() <= f64::from(f32::MAX))
                .ok_or_else(|| mismatch("float"))? as f32,
        ),
        SlotKind::Double => Slot::Double(value.as_f64().ok_or_else(|| mismatch("double"))?),
        SlotKind::Bytes => Slot::Bytes(match value {
            Value::String(s) => s.as_bytes().to_vec(),
            Value::Array(items) => items
                .iter()
                .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| mismatch("bytes"))?,
            _ => return Err(mismatch("bytes")),
        }),
        SlotKind::Text => Slot::Text(value.as_str().ok_or_else(|| mismatch("text"))?.to_string()),
    };
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prim(id: PrimitiveTypeId) -> DeclaredType {
        DeclaredType::primitive(id)
    }

    fn encoder() -> ValueEncoder {
        ValueEncoder::default()
    }

    #[test]
    fn primitive_goes_to_its_slot() {
        let enc = encoder();
        let cases = [
            (PrimitiveTypeId::BOOL, json!(true), Slot::Bool(true)),
            (PrimitiveTypeId::INT8, json!(-5), Slot::Int32(-5)),
            (PrimitiveTypeId::UINT16, json!(65535), Slot::Uint32(65535)),
            (PrimitiveTypeId::DATE, json!(19000), Slot::Uint32(19000)),
            (PrimitiveTypeId::INTERVAL, json!(-1), Slot::Int64(-1)),
            (PrimitiveTypeId::TIMESTAMP, json!(u64::MAX), Slot::Uint64(u64::MAX)),
            (PrimitiveTypeId::FLOAT, json!(1.5), Slot::Float(1.5)),
            (PrimitiveTypeId::DOUBLE, json!(2.25), Slot::Double(2.25)),
            (PrimitiveTypeId::STRING, json!("raw"), Slot::Bytes(b"raw".to_vec())),
            (PrimitiveTypeId::YSON, json!([1, 2]), Slot::Bytes(vec![1, 2])),
            (PrimitiveTypeId::UUID, json!("a-b"), Slot::Text("a-b".into())),
            (PrimitiveTypeId::TZ_DATE, json!("2024-01-01,UTC"), Slot::Text("2024-01-01,UTC".into())),
        ];
        for (kind, native, slot) in cases {
            let wire = enc.encode(&prim(kind), &native).unwrap();
            assert_eq!(wire, WireValue::primitive(slot), "kind {kind}");
        }
    }

    #[test]
    fn primitive_without_slot_is_unknown_kind() {
        let err = encoder()
            .encode(&prim(PrimitiveTypeId::JSON_DOCUMENT), &json!("{}"))
            .unwrap_err();
        assert!(matches!(err, MarshalError::UnknownPrimitiveKind(0x1204)));

        let err = encoder().encode(&prim(PrimitiveTypeId(0x7777)), &json!(1)).unwrap_err();
        assert!(matches!(err, MarshalError::UnknownPrimitiveKind(0x7777)));
    }

    #[test]
    fn primitive_rejects_wrong_native_shape() {
        let enc = encoder();
        let err = enc.encode(&prim(PrimitiveTypeId::INT32), &json!("1")).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { expected: "int32", .. }));

        let err = enc.encode(&prim(PrimitiveTypeId::INT32), &json!(i64::MAX)).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { .. }));

        let err = enc.encode(&prim(PrimitiveTypeId::UINT64), &json!(-1)).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { expected: "uint64", .. }));
    }

    #[test]
    fn float_out_of_f32_range_is_rejected() {
        let enc = encoder();
        for out_of_range in [json!(1e300), json!(-1e39)] {
            let err = enc.encode(&prim(PrimitiveTypeId::FLOAT), &out_of_range).unwrap_err();
            assert!(matches!(err, MarshalError::ValueMismatch { expected: "float", .. }));
        }

        let wire = enc.encode(&prim(PrimitiveTypeId::FLOAT), &json!(f32::MAX)).unwrap();
        assert_eq!(wire, WireValue::primitive(Slot::Float(f32::MAX)));
        // Double keeps the full range.
        let wire = enc.encode(&prim(PrimitiveTypeId::DOUBLE), &json!(1e300)).unwrap();
        assert_eq!(wire, WireValue::primitive(Slot::Double(1e300)));
    }

    #[test]
    fn optional_is_transparent_when_present() {
        let ty = DeclaredType::optional(prim(PrimitiveTypeId::UTF8));
        let wire = encoder().encode(&ty, &json!("hi")).unwrap();
        assert_eq!(wire, WireValue::primitive(Slot::Text("hi".into())));
    }

    #[test]
    fn optional_empty_string_encodes_absent() {
        let ty = DeclaredType::optional(prim(PrimitiveTypeId::STRING));
        let wire = encoder().encode(&ty, &json!("")).unwrap();
        assert!(wire.is_absent());

        let ty = DeclaredType::optional(prim(PrimitiveTypeId::INT32));
        assert!(encoder().encode(&ty, &json!(0)).unwrap().is_absent());
        assert!(encoder().encode(&ty, &json!(null)).unwrap().is_absent());
    }

    #[test]
    fn null_policy_keeps_zero() {
        let config = MarshalConfig {
            optional: OptionalPolicy::Null,
            ..MarshalConfig::default()
        };
        let ty = DeclaredType::optional(prim(PrimitiveTypeId::INT32));
        let wire = ValueEncoder::new(&config).encode(&ty, &json!(0)).unwrap();
        assert_eq!(wire, WireValue::primitive(Slot::Int32(0)));
    }

    #[test]
    fn list_maps_each_element() {
        let ty = DeclaredType::list(prim(PrimitiveTypeId::INT64));
        let wire = encoder().encode(&ty, &json!([1, 2, 3])).unwrap();
        assert_eq!(
            wire.items,
            vec![
                WireValue::primitive(Slot::Int64(1)),
                WireValue::primitive(Slot::Int64(2)),
                WireValue::primitive(Slot::Int64(3)),
            ]
        );
        assert!(encoder().encode(&ty, &json!([])).unwrap().items.is_empty());
    }

    #[test]
    fn list_error_names_failing_item() {
        let ty = DeclaredType::list(prim(PrimitiveTypeId::INT64));
        let err = encoder().encode(&ty, &json!([1, "x"])).unwrap_err();
        assert!(err.to_string().starts_with("item 1: "));
    }

    #[test]
    fn tuple_zips_positionally() {
        let ty = DeclaredType::tuple([prim(PrimitiveTypeId::INT32), prim(PrimitiveTypeId::UTF8)]);
        let wire = encoder().encode(&ty, &json!([7, "x"])).unwrap();
        assert_eq!(
            wire.items,
            vec![WireValue::primitive(Slot::Int32(7)), WireValue::primitive(Slot::Text("x".into()))]
        );
    }

    #[test]
    fn tuple_length_mismatch_fails() {
        let ty = DeclaredType::tuple([prim(PrimitiveTypeId::INT32)]);
        let err = encoder().encode(&ty, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, MarshalError::ArityMismatch { expected: 1, actual: 2 }));

        let err = encoder().encode(&ty, &json!([])).unwrap_err();
        assert!(matches!(err, MarshalError::ArityMismatch { expected: 1, actual: 0 }));
    }

    #[test]
    fn struct_follows_enumeration_order_not_names() {
        let ty = DeclaredType::structure([
            ("a", prim(PrimitiveTypeId::INT32)),
            ("b", prim(PrimitiveTypeId::UTF8)),
        ]);
        // Keys do not match member names; only order counts.
        let wire = encoder().encode(&ty, &json!({"x": 1, "y": "two"})).unwrap();
        assert_eq!(
            wire.items,
            vec![WireValue::primitive(Slot::Int32(1)), WireValue::primitive(Slot::Text("two".into()))]
        );

        let positional = encoder().encode(&ty, &json!([1, "two"])).unwrap();
        assert_eq!(positional, wire);
    }

    #[test]
    fn struct_arity_mismatch_fails() {
        let ty = DeclaredType::structure([("a", prim(PrimitiveTypeId::INT32))]);
        let err = encoder().encode(&ty, &json!({"a": 1, "b": 2})).unwrap_err();
        assert!(matches!(err, MarshalError::ArityMismatch { expected: 1, actual: 2 }));
    }

    #[test]
    fn dict_produces_pairs() {
        let ty = DeclaredType::dict(prim(PrimitiveTypeId::UTF8), prim(PrimitiveTypeId::INT32));
        let wire = encoder().encode(&ty, &json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(
            wire.pairs,
            vec![
                ValuePair {
                    key: WireValue::primitive(Slot::Text("a".into())),
                    payload: WireValue::primitive(Slot::Int32(1)),
                },
                ValuePair {
                    key: WireValue::primitive(Slot::Text("b".into())),
                    payload: WireValue::primitive(Slot::Int32(2)),
                },
            ]
        );
    }

    #[test]
    fn dict_accepts_pair_list_for_non_string_keys() {
        let ty = DeclaredType::dict(prim(PrimitiveTypeId::UINT32), prim(PrimitiveTypeId::BOOL));
        let wire = encoder().encode(&ty, &json!([[1, true], [2, false]])).unwrap();
        assert_eq!(wire.pairs.len(), 2);
        assert_eq!(wire.pairs[1].key, WireValue::primitive(Slot::Uint32(2)));

        let err = encoder().encode(&ty, &json!([[1]])).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { .. }));
    }

    #[test]
    fn dict_key_is_not_coerced() {
        let ty = DeclaredType::dict(prim(PrimitiveTypeId::INT32), prim(PrimitiveTypeId::INT32));
        let err = encoder().encode(&ty, &json!({"1": 1})).unwrap_err();
        assert!(matches!(err.root(), MarshalError::ValueMismatch { expected: "int32", .. }));
    }

    #[test]
    fn decimal_and_variant_are_unsupported() {
        let enc = encoder();
        let err = enc.encode(&DeclaredType::decimal(22, 9), &json!("1.5")).unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedType("Decimal")));

        let variant = DeclaredType::variant(DeclaredType::tuple([prim(PrimitiveTypeId::INT32)]));
        let err = enc.encode(&variant, &json!([1])).unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedType("Variant")));

        // Nested inside a composite, still an error rather than a dropped value.
        let ty = DeclaredType::list(DeclaredType::decimal(10, 2));
        let err = enc.encode(&ty, &json!(["1.00"])).unwrap_err();
        assert!(matches!(err.root(), MarshalError::UnsupportedType("Decimal")));

        let ty = DeclaredType::optional(DeclaredType::decimal(10, 2));
        let err = enc.encode(&ty, &json!("1.00")).unwrap_err();
        assert!(matches!(err, MarshalError::UnsupportedType("Decimal")));
    }

    #[test]
    fn missing_type_errors_distinguish_value_presence() {
        let enc = encoder();
        let err = enc.encode_declared(None, None).unwrap_err();
        assert!(matches!(err, MarshalError::MissingType));

        let err = enc.encode_declared(None, Some(&json!(5))).unwrap_err();
        assert!(matches!(err, MarshalError::InconsistentInput(_)));

        let ty = DeclaredType::optional(prim(PrimitiveTypeId::UTF8));
        assert!(enc.encode_declared(Some(&ty), None).unwrap().is_absent());
    }
}
