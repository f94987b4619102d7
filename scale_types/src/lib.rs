//! Composable codecs for the SCALE binary encoding, and a resolver that
//! builds them from textual type expressions.
//!
//! Decoding reads through a [`Cursor`]. Every codec implements [`Codec`],
//! either as one of the built-in [`Primitive`]s or as a combinator
//! ([`Sequence`], [`Optional`], [`FixedArray`], [`Tuple`], [`Struct`],
//! [`Enum`], [`Set`]) over other codecs. A [`Resolver`] maps expressions such
//! as `Vec<Compact>`, `(Compact, U16, U8)` or `[U8; 20]` to shared codec
//! instances, consulting a [`TypeLookup`] for named types:
//!
//! ```
//! use scale_types::{Resolver, Value};
//!
//! let resolver = Resolver::without_types();
//! let v = resolver.decode_hex("Vec<Compact>", "0x081501fc").unwrap();
//! assert_eq!(v, Value::Seq(vec![Value::compact(69u64), Value::compact(63u64)]));
//! ```

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

mod codec;
pub mod combinators;
pub mod compact;
mod cursor;
pub mod definition;
mod error;
pub mod expr;
pub mod normalize;
mod primitives;
mod resolver;
mod value;

#[cfg(test)]
pub(crate) mod testing_utils;

pub use codec::{Codec, TypeRef};
pub use combinators::{ByteArray, Enum, EnumKind, FixedArray, Optional, Sequence, Set, Struct, Tuple};
pub use cursor::{Checkpoint, Cursor};
pub use definition::{CompositeDef, NoTypes, SetValues, TypeDefinition, TypeLookup};
pub use error::{CodecError, CodecResult};
pub use expr::TypeExpr;
pub use primitives::Primitive;
pub use resolver::Resolver;
pub use value::{EnumValue, Value};

use once_cell::sync::Lazy;

/// Backs [`decode`] and [`encode`]. Knows primitives and structural shapes
/// only.
static DEFAULT_RESOLVER: Lazy<Resolver> = Lazy::new(Resolver::without_types);

/// Decodes hex input as `expr` with a process-wide resolver that has no
/// registered types.
pub fn decode(expr: &str, hex: &str) -> CodecResult<Value> {
    DEFAULT_RESOLVER.decode_hex(expr, hex)
}

/// Encodes `value` as `expr` to `0x`-prefixed hex, with the same resolver as
/// [`decode`].
pub fn encode(expr: &str, value: &Value) -> CodecResult<String> {
    DEFAULT_RESOLVER.encode_hex(expr, value)
}
