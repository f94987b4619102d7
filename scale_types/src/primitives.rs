//! Built-in codecs that do not wrap another type.

use std::fmt::{self, Display};

use crate::{
    codec::{mismatch, Codec},
    compact::{decode_compact, decode_compact_len, encode_compact, encode_compact_len},
    cursor::Cursor,
    error::{CodecError, CodecResult},
    value::Value,
};

/// The closed set of primitive codecs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Primitive {
    /// `()`: encodes to nothing.
    Null,
    /// One byte, `0x00` or `0x01`.
    Bool,
    /// Little-endian unsigned integers.
    U8,
    #[allow(missing_docs)]
    U16,
    #[allow(missing_docs)]
    U32,
    #[allow(missing_docs)]
    U64,
    #[allow(missing_docs)]
    U128,
    /// Little-endian two's complement signed integers.
    I8,
    #[allow(missing_docs)]
    I16,
    #[allow(missing_docs)]
    I32,
    #[allow(missing_docs)]
    I64,
    #[allow(missing_docs)]
    I128,
    /// The variable-length compact integer.
    Compact,
    /// A compact-length-prefixed byte blob.
    Bytes,
    /// A compact-length-prefixed byte blob holding text. Content that is not
    /// valid UTF-8 decodes as [`Value::Bytes`].
    String,
}

impl Primitive {
    /// Every primitive, in no particular order.
    pub const ALL: [Primitive; 15] = [
        Primitive::Null,
        Primitive::Bool,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::U128,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::I128,
        Primitive::Compact,
        Primitive::Bytes,
        Primitive::String,
    ];

    /// The canonical name of the primitive.
    pub const fn name(&self) -> &'static str {
        match self {
            Primitive::Null => "Null",
            Primitive::Bool => "Bool",
            Primitive::U8 => "U8",
            Primitive::U16 => "U16",
            Primitive::U32 => "U32",
            Primitive::U64 => "U64",
            Primitive::U128 => "U128",
            Primitive::I8 => "I8",
            Primitive::I16 => "I16",
            Primitive::I32 => "I32",
            Primitive::I64 => "I64",
            Primitive::I128 => "I128",
            Primitive::Compact => "Compact",
            Primitive::Bytes => "Bytes",
            Primitive::String => "String",
        }
    }

    /// Looks up a primitive by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Width in bits and signedness, for the fixed-width integers.
    fn int_layout(&self) -> Option<(u32, bool)> {
        match self {
            Primitive::U8 => Some((8, false)),
            Primitive::U16 => Some((16, false)),
            Primitive::U32 => Some((32, false)),
            Primitive::U64 => Some((64, false)),
            Primitive::U128 => Some((128, false)),
            Primitive::I8 => Some((8, true)),
            Primitive::I16 => Some((16, true)),
            Primitive::I32 => Some((32, true)),
            Primitive::I64 => Some((64, true)),
            Primitive::I128 => Some((128, true)),
            _ => None,
        }
    }

    fn decode_intern(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        if let Some((bits, signed)) = self.int_layout() {
            let raw = read_uint(cursor, bits)?;
            return Ok(match signed {
                false => Value::UInt(raw),
                true => Value::Int(to_signed(raw, bits)),
            });
        }

        match self {
            Primitive::Null => Ok(Value::Null),
            Primitive::Bool => match cursor.peek_byte()? {
                0x00 => cursor.read_byte().map(|_| Value::Bool(false)),
                0x01 => cursor.read_byte().map(|_| Value::Bool(true)),
                b => Err(CodecError::invalid_encoding(
                    self.name(),
                    format!("{b:#04x} is not a boolean"),
                )),
            },
            Primitive::Compact => decode_compact(cursor).map(Value::Compact),
            Primitive::Bytes => read_blob(cursor).map(|b| Value::Bytes(b.to_vec())),
            Primitive::String => read_blob(cursor).map(|b| match std::str::from_utf8(b) {
                Ok(s) => Value::Text(s.to_owned()),
                Err(_) => Value::Bytes(b.to_vec()),
            }),
            _ => unreachable!("integers are handled above"),
        }
    }

    fn encode_intern(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        if let Some((bits, signed)) = self.int_layout() {
            let raw = match signed {
                false => value
                    .to_u128()
                    .ok_or_else(|| self.int_error(value, bits))?,
                true => to_unsigned(
                    value
                        .to_i128()
                        .ok_or_else(|| self.int_error(value, bits))?,
                    bits,
                )?,
            };
            return write_uint(raw, bits, out);
        }

        match (self, value) {
            (Primitive::Null, Value::Null) => Ok(()),
            (Primitive::Bool, Value::Bool(b)) => {
                out.push(u8::from(*b));
                Ok(())
            }
            (Primitive::Compact, v) => {
                let v = v
                    .to_u256()
                    .ok_or_else(|| mismatch(self, "a non-negative integer", v))?;
                encode_compact(v, out);
                Ok(())
            }
            (Primitive::Bytes | Primitive::String, Value::Bytes(b)) => {
                write_blob(b, out);
                Ok(())
            }
            (Primitive::Bytes | Primitive::String, Value::Text(s)) => {
                write_blob(s.as_bytes(), out);
                Ok(())
            }
            (Primitive::Null, v) => Err(mismatch(self, "null", v)),
            (Primitive::Bool, v) => Err(mismatch(self, "a boolean", v)),
            (_, v) => Err(mismatch(self, "bytes or text", v)),
        }
    }

    fn int_error(&self, value: &Value, bits: u32) -> CodecError {
        match value {
            Value::UInt(_) | Value::Int(_) | Value::Compact(_) => {
                CodecError::IntegerOverflow { bits }
            }
            _ => mismatch(self, "an integer", value),
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Codec for Primitive {
    fn name(&self) -> &str {
        Primitive::name(self)
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value> {
        cursor.atomically(|c| self.decode_intern(c))
    }

    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        self.encode_intern(value, out)
    }
}

fn read_uint(cursor: &mut Cursor<'_>, bits: u32) -> CodecResult<u128> {
    let bytes = cursor.read_bytes(bits as usize / 8)?;
    let mut buf = [0; 16];
    buf[..bytes.len()].copy_from_slice(bytes);

    Ok(u128::from_le_bytes(buf))
}

fn write_uint(raw: u128, bits: u32, out: &mut Vec<u8>) -> CodecResult<()> {
    if bits < 128 && raw >> bits != 0 {
        return Err(CodecError::IntegerOverflow { bits });
    }
    out.extend_from_slice(&raw.to_le_bytes()[..bits as usize / 8]);

    Ok(())
}

/// Two's complement remap: values at or above `2^(bits - 1)` become
/// `value - 2^bits`.
fn to_signed(raw: u128, bits: u32) -> i128 {
    let shift = 128 - bits;
    ((raw << shift) as i128) >> shift
}

/// Inverse of [`to_signed`]. Fails if `v` is outside the signed range of
/// `bits`.
fn to_unsigned(v: i128, bits: u32) -> CodecResult<u128> {
    let shift = 128 - bits;
    if (v << shift) >> shift != v {
        return Err(CodecError::IntegerOverflow { bits });
    }

    Ok(match bits {
        128 => v as u128,
        _ => (v as u128) & ((1 << bits) - 1),
    })
}

fn read_blob<'a>(cursor: &mut Cursor<'a>) -> CodecResult<&'a [u8]> {
    let len = decode_compact_len(cursor)?;
    cursor.read_bytes(len)
}

fn write_blob(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact_len(bytes.len(), out);
    out.extend_from_slice(bytes);
}
