//! Codecs parameterized by one or more inner codecs.
//!
//! Every combinator is immutable once built and is shared through a
//! [`TypeRef`]. Decoding is all-or-nothing: a failure in any inner codec
//! leaves the cursor where the combinator started.

use std::collections::HashSet;

use crate::{
    codec::{encode_atomically, mismatch, Codec, TypeRef},
    compact::{decode_compact_len, encode_compact_len},
    cursor::Cursor,
    error::{CodecError, CodecResult},
    value::{EnumValue, Value},
};

/// `Vec<T>`: a compact length followed by that many `T`s.
#[derive(Debug)]
pub struct Sequence {
    name: String,
    inner: TypeRef,
}

impl Sequence {
    /// Creates a sequence of `inner`.
    pub fn new(name: impl Into<String>, inner: TypeRef) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// The element codec.
    pub fn inner(&self) -> &TypeRef {
        &self.inner
    }
}

impl Codec for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| {
            let len = decode_compact_len(c)?;
            // A length larger than the input is only plausible for zero-sized
            // elements, and we refuse to spin on those.
            let must_progress = len > c.remaining();
            let mut items = Vec::with_capacity(len.min(c.remaining()));

            for _ in 0..len {
                let before = c.offset();
                items.push(self.inner.decode(c)?);
                if must_progress && c.offset() == before {
                    return Err(CodecError::invalid_encoding(
                        &self.name,
                        format!("length {len} exceeds the remaining input"),
                    ));
                }
            }

            Ok(Value::Seq(items))
        })
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        let items = value
            .as_seq()
            .ok_or_else(|| mismatch(self, "a sequence", value))?;

        encode_atomically(out, |out| {
            encode_compact_len(items.len(), out);
            items.iter().try_for_each(|v| self.inner.encode_to(v, out))
        })
    }
}

/// `Option<T>`: a `0x00` (absent) or `0x01` (present) byte, followed by a `T`
/// when present.
#[derive(Debug)]
pub struct Optional {
    name: String,
    inner: TypeRef,
}

impl Optional {
    /// Creates an optional `inner`.
    pub fn new(name: impl Into<String>, inner: TypeRef) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

impl Codec for Optional {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| match c.read_byte()? {
            0x00 => Ok(Value::Option(None)),
            0x01 => Ok(Value::some(self.inner.decode(c)?)),
            b => Err(CodecError::invalid_encoding(
                &self.name,
                format!("{b:#04x} is not an option discriminant"),
            )),
        })
    }

    /// `Value::Null` and `Value::Option(None)` encode as absent; any other
    /// value that is not a `Value::Option` is treated as present.
    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        let present = match value {
            Value::Null | Value::Option(None) => None,
            Value::Option(Some(v)) => Some(v.as_ref()),
            v => Some(v),
        };

        match present {
            None => {
                out.push(0x00);
                Ok(())
            }
            Some(v) => encode_atomically(out, |out| {
                out.push(0x01);
                self.inner.encode_to(v, out)
            }),
        }
    }
}

/// `[T; N]`: exactly `N` elements and no length prefix.
#[derive(Debug)]
pub struct FixedArray {
    name: String,
    inner: TypeRef,
    len: usize,
}

impl FixedArray {
    /// Creates an array of `len` elements of `inner`.
    pub fn new(name: impl Into<String>, inner: TypeRef, len: usize) -> Self {
        Self {
            name: name.into(),
            inner,
            len,
        }
    }

    /// The declared element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` for `[T; 0]`.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Codec for FixedArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| {
            (0..self.len)
                .map(|_| self.inner.decode(c))
                .collect::<CodecResult<_>>()
                .map(Value::Seq)
        })
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        match value.as_seq() {
            Some(items) if items.len() == self.len => encode_atomically(out, |out| {
                items.iter().try_for_each(|v| self.inner.encode_to(v, out))
            }),
            _ => Err(mismatch(self, "a sequence of the declared length", value)),
        }
    }
}

/// `[U8; N]`: `N` raw bytes, decoded as [`Value::Bytes`].
#[derive(Debug)]
pub struct ByteArray {
    name: String,
    len: usize,
}

impl ByteArray {
    /// Creates a byte array of `len` bytes.
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

impl Codec for ByteArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor
            .read_bytes(self.len)
            .map(|b| Value::Bytes(b.to_vec()))
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        match value {
            Value::Bytes(b) if b.len() == self.len => {
                out.extend_from_slice(b);
                Ok(())
            }
            _ => Err(mismatch(self, "bytes of the declared length", value)),
        }
    }
}

/// `(T1, .., Tn)`: each element in declaration order.
#[derive(Debug)]
pub struct Tuple {
    name: String,
    items: Vec<TypeRef>,
}

impl Tuple {
    /// Creates a tuple of `items`.
    pub fn new(name: impl Into<String>, items: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

impl Codec for Tuple {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| {
            self.items
                .iter()
                .map(|t| t.decode(c))
                .collect::<CodecResult<_>>()
                .map(Value::Seq)
        })
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        match value.as_seq() {
            Some(values) if values.len() == self.items.len() => encode_atomically(out, |out| {
                self.items
                    .iter()
                    .zip(values)
                    .try_for_each(|(t, v)| t.encode_to(v, out))
            }),
            _ => Err(mismatch(self, "a sequence with one value per element", value)),
        }
    }
}

/// Named fields, encoded back to back in declaration order.
#[derive(Debug)]
pub struct Struct {
    name: String,
    fields: Vec<(String, TypeRef)>,
}

impl Struct {
    /// Creates a struct. Fails if two fields share a name.
    pub fn new(name: impl Into<String>, fields: Vec<(String, TypeRef)>) -> CodecResult<Self> {
        let name = name.into();
        check_unique(&name, "field", fields.iter().map(|(n, _)| n.as_str()))?;

        Ok(Self { name, fields })
    }

    /// The fields in declaration order.
    pub fn fields(&self) -> &[(String, TypeRef)] {
        &self.fields
    }
}

impl Codec for Struct {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| {
            self.fields
                .iter()
                .map(|(n, t)| Ok((n.clone(), t.decode(c)?)))
                .collect::<CodecResult<_>>()
                .map(Value::Struct)
        })
    }

    /// Fields are matched by name, so their order in `value` does not matter.
    /// A plain sequence is matched positionally.
    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        let field_values = match value {
            Value::Struct(given) => self
                .fields
                .iter()
                .map(|(n, _)| given.iter().find_map(|(gn, v)| (gn == n).then_some(v)))
                .collect::<Option<Vec<_>>>(),
            Value::Seq(given) if given.len() == self.fields.len() => Some(given.iter().collect()),
            _ => None,
        }
        .ok_or_else(|| mismatch(self, "a struct with every declared field", value))?;

        encode_atomically(out, |out| {
            self.fields
                .iter()
                .zip(field_values)
                .try_for_each(|((_, t), v)| t.encode_to(v, out))
        })
    }
}

/// The two shapes an enum can take.
#[derive(Debug)]
pub enum EnumKind {
    /// Plain labels without payloads.
    Labels(Vec<String>),
    /// Labeled variants, each with a payload type.
    Variants(Vec<(String, TypeRef)>),
}

impl EnumKind {
    fn len(&self) -> usize {
        match self {
            EnumKind::Labels(l) => l.len(),
            EnumKind::Variants(v) => v.len(),
        }
    }

    fn variant_name(&self, index: usize) -> &str {
        match self {
            EnumKind::Labels(l) => &l[index],
            EnumKind::Variants(v) => &v[index].0,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        (0..self.len()).find(|i| self.variant_name(*i) == name)
    }
}

/// A tagged union: one byte selecting the variant (its 0-based ordinal in
/// declaration order), followed by the variant's payload if it has one.
#[derive(Debug)]
pub struct Enum {
    name: String,
    kind: EnumKind,
}

/// The ordinal is a single byte.
const MAX_ENUM_VARIANTS: usize = 256;

impl Enum {
    /// Creates an enum. Fails on duplicate variant names or more variants
    /// than a single byte can select.
    pub fn new(name: impl Into<String>, kind: EnumKind) -> CodecResult<Self> {
        let name = name.into();
        if kind.len() > MAX_ENUM_VARIANTS {
            return Err(CodecError::invalid_definition(
                name,
                format!("{} variants do not fit in one byte", kind.len()),
            ));
        }
        check_unique(
            &name,
            "variant",
            (0..kind.len()).map(|i| kind.variant_name(i)),
        )?;

        Ok(Self { name, kind })
    }

    /// The variant set.
    pub fn kind(&self) -> &EnumKind {
        &self.kind
    }

    /// Works out the ordinal and payload to encode for `value`.
    fn select<'v>(&self, value: &'v Value) -> Option<(usize, Option<&'v Value>)> {
        match value {
            Value::Enum(EnumValue { name, payload, .. }) => {
                Some((self.kind.position(name)?, payload.as_deref()))
            }
            Value::Text(name) => Some((self.kind.position(name)?, None)),
            Value::Struct(fields) if fields.len() == 1 => {
                let (name, payload) = &fields[0];
                Some((self.kind.position(name)?, Some(payload)))
            }
            Value::UInt(index) => {
                let index = usize::try_from(*index).ok()?;
                (index < self.kind.len()).then_some((index, None))
            }
            _ => None,
        }
    }
}

impl Codec for Enum {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| {
            let index = c.read_byte()?;
            if usize::from(index) >= self.kind.len() {
                return Err(CodecError::invalid_encoding(
                    &self.name,
                    format!(
                        "variant index {index} is out of range ({} variants)",
                        self.kind.len()
                    ),
                ));
            }

            let payload = match &self.kind {
                EnumKind::Labels(_) => None,
                EnumKind::Variants(v) => Some(Box::new(v[usize::from(index)].1.decode(c)?)),
            };

            Ok(Value::Enum(EnumValue {
                index,
                name: self.kind.variant_name(usize::from(index)).to_owned(),
                payload,
            }))
        })
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        let (index, payload) = self
            .select(value)
            .ok_or_else(|| mismatch(self, "a declared variant", value))?;

        match (&self.kind, payload) {
            (EnumKind::Labels(_), None) => {
                out.push(index as u8);
                Ok(())
            }
            (EnumKind::Labels(_), Some(_)) => Err(mismatch(self, "a label without payload", value)),
            (EnumKind::Variants(v), payload) => encode_atomically(out, |out| {
                out.push(index as u8);
                v[index].1.encode_to(payload.unwrap_or(&Value::Null), out)
            }),
        }
    }
}

/// A bitmask over named flags. Decodes to the names of the set flags.
#[derive(Debug)]
pub struct Set {
    name: String,
    flags: Vec<(String, u64)>,
    width: usize,
}

impl Set {
    /// Creates a set from `(name, flag)` pairs. The mask is `bit_length`
    /// bits wide if given, otherwise the narrowest of 8/16/32/64 bits that
    /// holds every flag.
    pub fn new(
        name: impl Into<String>,
        mut flags: Vec<(String, u64)>,
        bit_length: Option<u32>,
    ) -> CodecResult<Self> {
        let name = name.into();
        check_unique(&name, "value", flags.iter().map(|(n, _)| n.as_str()))?;
        flags.sort_by_key(|(_, f)| *f);

        let needed_bits = flags
            .iter()
            .map(|(_, f)| 64 - f.leading_zeros())
            .max()
            .unwrap_or(0);
        let width = match bit_length {
            Some(bits @ (8 | 16 | 32 | 64)) if bits >= needed_bits => bits as usize / 8,
            Some(bits) => {
                return Err(CodecError::invalid_definition(
                    name,
                    format!("bit length {bits} cannot hold flags needing {needed_bits} bits"),
                ))
            }
            None => [1, 2, 4, 8]
                .into_iter()
                .find(|w| w * 8 >= needed_bits as usize)
                .unwrap_or(8),
        };

        Ok(Self { name, flags, width })
    }

    /// Creates a set where the `i`-th name is bit `i`.
    pub fn from_names(
        name: impl Into<String>,
        names: Vec<String>,
        bit_length: Option<u32>,
    ) -> CodecResult<Self> {
        let name = name.into();
        if names.len() > 64 {
            return Err(CodecError::invalid_definition(
                name,
                format!("{} values do not fit in a 64-bit mask", names.len()),
            ));
        }
        let flags = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, 1u64 << i))
            .collect();

        Self::new(name, flags, bit_length)
    }

    /// Width of the mask in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    fn all_flags(&self) -> u64 {
        self.flags.iter().fold(0, |acc, (_, f)| acc | f)
    }
}

impl Codec for Set {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        let mut buf = [0; 8];
        buf[..self.width].copy_from_slice(cursor.peek_bytes(self.width)?);
        let bits = u64::from_le_bytes(buf);

        let unknown = bits & !self.all_flags();
        if unknown != 0 {
            return Err(CodecError::invalid_encoding(
                &self.name,
                format!("undeclared bits {unknown:#x} are set"),
            ));
        }

        cursor.read_bytes(self.width)?;
        Ok(Value::Set(
            self.flags
                .iter()
                .filter(|(_, f)| *f != 0 && bits & f == *f)
                .map(|(n, _)| n.clone())
                .collect(),
        ))
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        let names: Vec<&str> = match value {
            Value::Set(names) => names.iter().map(String::as_str).collect(),
            Value::Seq(items) => items
                .iter()
                .map(|v| v.as_text().map(String::as_str))
                .collect::<Option<_>>()
                .ok_or_else(|| mismatch(self, "a list of set members", value))?,
            _ => return Err(mismatch(self, "a list of set members", value)),
        };

        let mut bits = 0;
        for name in names {
            let (_, flag) = self
                .flags
                .iter()
                .find(|(n, _)| n == name)
                .ok_or_else(|| mismatch(self, "names of declared set members", value))?;
            bits |= flag;
        }

        out.extend_from_slice(&u64::to_le_bytes(bits)[..self.width]);
        Ok(())
    }
}

fn check_unique<'a>(
    type_name: &str,
    what: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> CodecResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CodecError::invalid_definition(
                type_name,
                format!("duplicate {what} name `{name}`"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hex_literal::hex;

    use super::*;
    use crate::primitives::Primitive;

    fn prim(p: Primitive) -> TypeRef {
        Arc::new(p)
    }

    fn compacts(vs: &[u64]) -> Value {
        Value::Seq(vs.iter().map(|v| Value::compact(*v)).collect())
    }

    #[test]
    fn sequence_of_compacts() -> CodecResult<()> {
        let codec = Sequence::new("Vec<Compact>", prim(Primitive::Compact));

        let v = codec.decode_all(&hex!("081501fc"))?;
        assert_eq!(v, compacts(&[69, 63]));
        assert_eq!(codec.encode(&v)?, hex!("081501fc"));

        Ok(())
    }

    #[test]
    fn sequence_length_beyond_input_fails_cleanly() {
        let codec = Sequence::new("Vec<U8>", prim(Primitive::U8));
        let mut cursor = Cursor::new(&hex!("0c0102"));

        assert!(matches!(
            codec.decode(&mut cursor),
            Err(CodecError::TruncatedInput { .. })
        ));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn sequence_of_zero_sized_elements_cannot_spin() {
        let codec = Sequence::new("Vec<Null>", prim(Primitive::Null));

        assert_eq!(
            codec.decode_all(&hex!("0c")),
            Ok(Value::Seq(vec![Value::Null; 3]))
        );
        // 2^30 elements of nothing, with no input to back them.
        assert!(matches!(
            codec.decode_all(&hex!("0300000040")),
            Err(CodecError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn optional_compact() -> CodecResult<()> {
        let codec = Optional::new("Option<Compact>", prim(Primitive::Compact));

        assert_eq!(codec.decode_all(&hex!("00"))?, Value::none());

        let v = codec.decode_all(&hex!("011501"))?;
        assert_eq!(v, Value::some(Value::compact(69u64)));
        assert_eq!(codec.encode(&v)?, hex!("011501"));

        assert_eq!(codec.encode(&Value::Null)?, hex!("00"));
        assert_eq!(codec.encode(&Value::UInt(69))?, hex!("011501"));
        assert!(matches!(
            codec.decode_all(&hex!("02")),
            Err(CodecError::InvalidEncoding { .. })
        ));

        Ok(())
    }

    #[test]
    fn fixed_array_of_compacts() -> CodecResult<()> {
        let codec = FixedArray::new("[Compact; 2]", prim(Primitive::Compact), 2);

        let v = codec.decode_all(&hex!("1501fc"))?;
        assert_eq!(v, compacts(&[69, 63]));
        assert_eq!(codec.encode(&v)?, hex!("1501fc"));

        let mut cursor = Cursor::new(&hex!("1501"));
        assert!(codec.decode(&mut cursor).is_err());
        assert_eq!(cursor.offset(), 0);

        assert!(codec.encode(&compacts(&[1])).is_err());

        Ok(())
    }

    #[test]
    fn byte_array_is_raw() -> CodecResult<()> {
        let codec = ByteArray::new("[U8; 4]", 4);

        let v = codec.decode_all(&hex!("deadbeef"))?;
        assert_eq!(v, Value::Bytes(hex!("deadbeef").to_vec()));
        assert_eq!(codec.encode(&v)?, hex!("deadbeef"));
        assert!(codec.encode(&Value::Bytes(vec![1])).is_err());

        Ok(())
    }

    #[test]
    fn tuple_is_heterogeneous() -> CodecResult<()> {
        let codec = Tuple::new(
            "(Compact, U16, U8)",
            vec![
                prim(Primitive::Compact),
                prim(Primitive::U16),
                prim(Primitive::U8),
            ],
        );

        let v = codec.decode_all(&hex!("15012efb45"))?;
        assert_eq!(
            v,
            Value::Seq(vec![
                Value::compact(69u64),
                Value::UInt(64302),
                Value::UInt(69)
            ])
        );
        assert_eq!(codec.encode(&v)?, hex!("15012efb45"));

        Ok(())
    }

    #[test]
    fn struct_fields_keep_declaration_order() -> CodecResult<()> {
        let codec = Struct::new(
            "StructCompactU16U8",
            vec![
                ("size".into(), prim(Primitive::Compact)),
                ("balance".into(), prim(Primitive::U16)),
                ("balance2".into(), prim(Primitive::U8)),
            ],
        )?;

        let v = codec.decode_all(&hex!("15012efb45"))?;
        assert_eq!(
            v,
            Value::Struct(vec![
                ("size".into(), Value::compact(69u64)),
                ("balance".into(), Value::UInt(64302)),
                ("balance2".into(), Value::UInt(69)),
            ])
        );
        assert_eq!(codec.encode(&v)?, hex!("15012efb45"));

        // Field order in the input value is irrelevant.
        let shuffled = Value::Struct(vec![
            ("balance2".into(), Value::UInt(69)),
            ("size".into(), Value::UInt(69)),
            ("balance".into(), Value::UInt(64302)),
        ]);
        assert_eq!(codec.encode(&shuffled)?, hex!("15012efb45"));

        Ok(())
    }

    #[test]
    fn struct_rejects_duplicate_fields() {
        let res = Struct::new(
            "Dup",
            vec![
                ("a".into(), prim(Primitive::U8)),
                ("a".into(), prim(Primitive::U16)),
            ],
        );

        assert!(matches!(res, Err(CodecError::InvalidDefinition { .. })));
    }

    #[test]
    fn struct_with_missing_field_fails_to_encode() -> CodecResult<()> {
        let codec = Struct::new("S", vec![("a".into(), prim(Primitive::U8))])?;
        let mut out = vec![0xaa];

        assert!(codec.encode_to(&Value::Struct(vec![]), &mut out).is_err());
        assert_eq!(out, vec![0xaa]);

        Ok(())
    }

    #[test]
    fn label_enum() -> CodecResult<()> {
        let codec = Enum::new(
            "Modifier",
            EnumKind::Labels(vec!["Optional".into(), "Default".into()]),
        )?;

        let v = codec.decode_all(&hex!("01"))?;
        assert_eq!(
            v,
            Value::Enum(EnumValue {
                index: 1,
                name: "Default".into(),
                payload: None
            })
        );
        assert_eq!(codec.encode(&v)?, hex!("01"));
        assert_eq!(codec.encode(&Value::Text("Optional".into()))?, hex!("00"));
        assert!(matches!(
            codec.decode_all(&hex!("02")),
            Err(CodecError::InvalidEncoding { .. })
        ));

        Ok(())
    }

    #[test]
    fn variant_enum_decodes_payload() -> CodecResult<()> {
        let codec = Enum::new(
            "Phase",
            EnumKind::Variants(vec![
                ("ApplyExtrinsic".into(), prim(Primitive::U32)),
                ("Finalization".into(), prim(Primitive::Null)),
            ]),
        )?;

        let v = codec.decode_all(&hex!("0007000000"))?;
        assert_eq!(
            v,
            Value::Enum(EnumValue {
                index: 0,
                name: "ApplyExtrinsic".into(),
                payload: Some(Box::new(Value::UInt(7))),
            })
        );
        assert_eq!(codec.encode(&v)?, hex!("0007000000"));

        assert_eq!(codec.encode(&Value::Text("Finalization".into()))?, hex!("01"));
        let as_map = Value::Struct(vec![("ApplyExtrinsic".into(), Value::UInt(7))]);
        assert_eq!(codec.encode(&as_map)?, hex!("0007000000"));

        Ok(())
    }

    #[test]
    fn enum_rejects_duplicate_variants() {
        let res = Enum::new("E", EnumKind::Labels(vec!["A".into(), "A".into()]));

        assert!(matches!(res, Err(CodecError::InvalidDefinition { .. })));
    }

    #[test]
    fn set_of_flags() -> CodecResult<()> {
        let codec = Set::new(
            "WithdrawReasons",
            vec![
                ("TransactionPayment".into(), 1),
                ("Transfer".into(), 2),
                ("Reserve".into(), 4),
                ("Fee".into(), 8),
                ("Tip".into(), 16),
            ],
            None,
        )?;
        assert_eq!(codec.width(), 1);

        let v = codec.decode_all(&hex!("0a"))?;
        assert_eq!(v, Value::Set(vec!["Transfer".into(), "Fee".into()]));
        assert_eq!(codec.encode(&v)?, hex!("0a"));
        assert!(matches!(
            codec.decode_all(&hex!("20")),
            Err(CodecError::InvalidEncoding { .. })
        ));

        Ok(())
    }

    #[test]
    fn set_width_covers_declared_values() -> CodecResult<()> {
        let names = (0..9).map(|i| format!("V{i}")).collect();
        let codec = Set::from_names("Nine", names, None)?;
        assert_eq!(codec.width(), 2);
        assert_eq!(
            codec.decode_all(&hex!("0001"))?,
            Value::Set(vec!["V8".into()])
        );

        let wide = Set::new("Wide", vec![("A".into(), 1)], Some(64))?;
        assert_eq!(wide.width(), 8);
        assert!(Set::new("Narrow", vec![("A".into(), 1 << 9)], Some(8)).is_err());

        Ok(())
    }
}
