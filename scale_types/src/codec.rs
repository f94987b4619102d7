//! The polymorphic codec interface that every primitive and combinator
//! implements.

use std::{fmt::Debug, sync::Arc};

use crate::{
    cursor::Cursor,
    error::{CodecError, CodecResult},
    value::Value,
};

/// A shared, immutable codec. The [`Resolver`](crate::Resolver) hands out one
/// instance per canonical type name.
pub type TypeRef = Arc<dyn Codec>;

/// Decodes values from a [`Cursor`] and encodes them back to bytes.
///
/// For canonical input, `encode(decode(bytes)) == bytes`, and for any value a
/// codec produced, `decode(encode(v)) == v`.
pub trait Codec: Debug + Send + Sync {
    /// The canonical name of the type this codec handles.
    fn name(&self) -> &str;

    /// Decodes one value. On failure the cursor is left where it was.
    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Value>;

    /// Appends the encoding of `value` to `out`.
    fn encode_to(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()>;

    /// Encodes `value` into a fresh buffer.
    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_to(value, &mut out)?;

        Ok(out)
    }

    /// Decodes a value that must span the whole of `bytes`.
    fn decode_all(&self, bytes: &[u8]) -> CodecResult<Value> {
        decode_exact(self, Cursor::new(bytes))
    }
}

/// Decodes one value from `cursor`, which must then be exhausted.
pub(crate) fn decode_exact<C: Codec + ?Sized>(codec: &C, mut cursor: Cursor<'_>) -> CodecResult<Value> {
    let v = codec.decode(&mut cursor)?;

    match cursor.remaining() {
        0 => Ok(v),
        remaining => Err(CodecError::TrailingBytes {
            type_name: codec.name().to_owned(),
            remaining,
        }),
    }
}

pub(crate) fn mismatch(codec: &dyn Codec, expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        type_name: codec.name().to_owned(),
        expected,
        found: found.kind(),
    }
}

/// Runs `f`, truncating `out` back to its original length if it fails.
pub(crate) fn encode_atomically(
    out: &mut Vec<u8>,
    f: impl FnOnce(&mut Vec<u8>) -> CodecResult<()>,
) -> CodecResult<()> {
    let start = out.len();
    let res = f(out);
    if res.is_err() {
        out.truncate(start);
    }

    res
}
