//! The dynamically-typed value produced by decoding and consumed by encoding.

use std::fmt;

use enum_as_inner::EnumAsInner;
use ethereum_types::U256;
use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// A decoded value.
///
/// The variant set mirrors the codec families: every codec decodes into
/// exactly one variant, and encoders accept that variant (plus a few
/// compatible shapes, see the individual codecs).
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
pub enum Value {
    /// The unit value, `()`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A fixed-width unsigned integer.
    UInt(u128),
    /// A fixed-width signed integer.
    Int(i128),
    /// A compact-encoded integer.
    Compact(U256),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// Elements of a sequence, fixed array or tuple, in order.
    Seq(Vec<Value>),
    /// An optional value.
    Option(Option<Box<Value>>),
    /// Struct fields in declaration order.
    Struct(Vec<(String, Value)>),
    /// The active variant of an enum.
    Enum(EnumValue),
    /// The active members of a set, in ascending flag order.
    Set(Vec<String>),
}

/// The active variant of an enum value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumValue {
    /// Ordinal of the variant in declaration order.
    pub index: u8,
    /// Name of the variant.
    pub name: String,
    /// Payload, for labeled-variant enums.
    pub payload: Option<Box<Value>>,
}

impl Value {
    /// Shorthand for a compact integer value.
    pub fn compact(v: impl Into<U256>) -> Self {
        Self::Compact(v.into())
    }

    /// Shorthand for a present optional value.
    pub fn some(v: Value) -> Self {
        Self::Option(Some(Box::new(v)))
    }

    /// Shorthand for an absent optional value.
    pub fn none() -> Self {
        Self::Option(None)
    }

    /// Looks up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_struct()?
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Interprets the value as text. Byte strings that are valid UTF-8 are
    /// accepted too.
    pub fn text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Interprets any integer variant as a `u128`, if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u128::try_from(*v).ok(),
            Value::Compact(v) => u256_to_u128(*v),
            _ => None,
        }
    }

    /// Interprets any integer variant as an `i128`, if it fits.
    pub fn to_i128(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i128::try_from(*v).ok(),
            Value::Compact(v) => u256_to_u128(*v).and_then(|v| i128::try_from(v).ok()),
            _ => None,
        }
    }

    /// Interprets any non-negative integer variant as a `U256`.
    pub fn to_u256(&self) -> Option<U256> {
        match self {
            Value::Compact(v) => Some(*v),
            Value::UInt(v) => Some(U256::from(*v)),
            Value::Int(v) => u128::try_from(*v).ok().map(U256::from),
            _ => None,
        }
    }

    /// A short name for the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::UInt(_) => "unsigned integer",
            Value::Int(_) => "signed integer",
            Value::Compact(_) => "compact integer",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Seq(_) => "sequence",
            Value::Option(_) => "option",
            Value::Struct(_) => "struct",
            Value::Enum(_) => "enum",
            Value::Set(_) => "set",
        }
    }
}

pub(crate) fn u256_to_u128(v: U256) -> Option<u128> {
    match v.bits() <= 128 {
        true => Some((u128::from((v >> 64).low_u64()) << 64) | u128::from(v.low_u64())),
        false => None,
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Seq(v)
    }
}

/// Bytes serialize as `0x` hex, compact integers as numbers when they fit in
/// a `u128` and as decimal strings otherwise, structs as maps in declaration
/// order and enums as `{"Variant": payload}` (or just `"Label"`).
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => s.serialize_unit(),
            Value::Bool(b) => s.serialize_bool(*b),
            Value::UInt(v) => s.serialize_u128(*v),
            Value::Int(v) => s.serialize_i128(*v),
            Value::Compact(v) => match u256_to_u128(*v) {
                Some(v) => s.serialize_u128(v),
                None => s.serialize_str(&v.to_string()),
            },
            Value::Bytes(b) => s.serialize_str(&scale_common::bytes_to_hex(b)),
            Value::Text(t) => s.serialize_str(t),
            Value::Seq(items) => {
                let mut seq = s.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Option(None) => s.serialize_none(),
            Value::Option(Some(v)) => s.serialize_some(v),
            Value::Struct(fields) => {
                let mut map = s.serialize_map(Some(fields.len()))?;
                for (name, v) in fields {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
            Value::Enum(EnumValue {
                name,
                payload: None,
                ..
            }) => s.serialize_str(name),
            Value::Enum(EnumValue {
                name,
                payload: Some(payload),
                ..
            }) => {
                let mut map = s.serialize_map(Some(1))?;
                map.serialize_entry(name, payload)?;
                map.end()
            }
            Value::Set(names) => names.serialize(s),
        }
    }
}

/// Builds a [`Value`] from self-describing input (eg. JSON) without a type to
/// guide it. Numbers become [`Value::UInt`] / [`Value::Int`], `0x` strings
/// become [`Value::Bytes`], maps become [`Value::Struct`]. Codecs coerce these
/// shapes when encoding.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::UInt(v.into()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(Value::UInt(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(match u64::try_from(v) {
            Ok(v) => Value::UInt(v.into()),
            Err(_) => Value::Int(v.into()),
        })
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(match u128::try_from(v) {
            Ok(v) => Value::UInt(v),
            Err(_) => Value::Int(v),
        })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        match v.starts_with(scale_common::HEX_PREFIX) {
            true => scale_common::hex_to_bytes(v)
                .map(Value::Bytes)
                .map_err(E::custom),
            false => Ok(Value::Text(v.to_owned())),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry::<String, Value>()? {
            fields.push((k, v));
        }
        Ok(Value::Struct(fields))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_to_readable_json() -> Result<(), serde_json::Error> {
        let v = Value::Struct(vec![
            ("size".into(), Value::compact(69u64)),
            ("hash".into(), Value::Bytes(vec![0xde, 0xad])),
            ("maybe".into(), Value::none()),
            (
                "phase".into(),
                Value::Enum(EnumValue {
                    index: 0,
                    name: "ApplyExtrinsic".into(),
                    payload: Some(Box::new(Value::UInt(3))),
                }),
            ),
        ]);

        assert_eq!(
            serde_json::to_value(&v)?,
            json!({
                "size": 69,
                "hash": "0xdead",
                "maybe": null,
                "phase": { "ApplyExtrinsic": 3 },
            })
        );

        Ok(())
    }

    #[test]
    fn deserializes_untyped_json() -> Result<(), serde_json::Error> {
        let v: Value = serde_json::from_str(r#"{"a": [1, -2, "0x01ff", "text", null, true]}"#)?;

        assert_eq!(
            v,
            Value::Struct(vec![(
                "a".into(),
                Value::Seq(vec![
                    Value::UInt(1),
                    Value::Int(-2),
                    Value::Bytes(vec![0x01, 0xff]),
                    Value::Text("text".into()),
                    Value::Null,
                    Value::Bool(true),
                ])
            )])
        );

        Ok(())
    }

    #[test]
    fn integer_views_respect_range() {
        assert_eq!(Value::Int(-1).to_u128(), None);
        assert_eq!(Value::Int(5).to_u128(), Some(5));
        assert_eq!(Value::UInt(u128::MAX).to_i128(), None);
        assert_eq!(Value::compact(7u64).to_i128(), Some(7));
        assert_eq!(Value::Int(-1).to_u256(), None);
    }

    #[test]
    fn field_lookup_by_name() {
        let v = Value::Struct(vec![("a".into(), Value::Bool(true))]);

        assert_eq!(v.field("a"), Some(&Value::Bool(true)));
        assert_eq!(v.field("b"), None);
        assert_eq!(Value::Null.field("a"), None);
    }
}
