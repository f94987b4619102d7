//! Turns type expressions and structural descriptors into shared codecs.

use std::{collections::HashMap, fmt, sync::Arc};

use itertools::Itertools as _;
use log::{debug, trace};
use parking_lot::RwLock;

use crate::{
    codec::{decode_exact, Codec, TypeRef},
    combinators::{ByteArray, Enum, EnumKind, FixedArray, Optional, Sequence, Set, Struct, Tuple},
    cursor::Cursor,
    definition::{CompositeDef, NoTypes, SetValues, TypeDefinition, TypeLookup},
    error::{CodecError, CodecResult},
    expr::TypeExpr,
    normalize::canonicalize,
    primitives::Primitive,
    value::Value,
};

/// Resolves type expressions into codecs, memoised by canonical name.
///
/// Resolution order for a canonical name is: primitives, then the
/// [`TypeLookup`] the resolver was built with, then the structural shape of
/// the expression (`Vec<T>`, `Option<T>`, `[T; N]`, tuples).
///
/// A resolver is immutable once shared. Resolving the same expression twice,
/// from any thread, yields the same [`TypeRef`] instance.
pub struct Resolver {
    types: Arc<dyn TypeLookup>,
    cache: RwLock<HashMap<String, TypeRef>>,
    strict: bool,
}

/// Canonical names of the types currently being built by one resolution,
/// used to detect recursive definitions.
type InProgress = Vec<String>;

impl Resolver {
    /// Creates a resolver that finds named types in `types`.
    pub fn new(types: impl TypeLookup + 'static) -> Self {
        Self::from_shared(Arc::new(types))
    }

    /// Creates a resolver over an already shared lookup.
    pub fn from_shared(types: Arc<dyn TypeLookup>) -> Self {
        debug!("Creating type resolver");

        Self {
            types,
            cache: RwLock::default(),
            strict: false,
        }
    }

    /// Creates a resolver that only knows primitives and structural shapes.
    pub fn without_types() -> Self {
        Self::new(NoTypes)
    }

    /// When set, [`Resolver::decode`] rejects compact integers that are not
    /// in their shortest encoding.
    pub fn with_strict_compact(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether decoding rejects non-canonical compact integers.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Resolves a textual type expression.
    pub fn resolve(&self, expr: &str) -> CodecResult<TypeRef> {
        let canon = canonicalize(expr)?;
        self.resolve_expr(&canon, &mut InProgress::new())
    }

    /// Resolves a structural descriptor or alias that is not registered under
    /// any name. The codec is cached under a key derived from its content.
    pub fn resolve_definition(&self, def: &TypeDefinition) -> CodecResult<TypeRef> {
        let mut in_progress = InProgress::new();

        match def {
            TypeDefinition::Alias(expr) => self.resolve(expr),
            TypeDefinition::Composite(def) => {
                let key = content_key(def)?;
                self.cached_or_build(key, &mut in_progress, |this, key, in_progress| {
                    this.build_composite(key, def, in_progress)
                })
            }
        }
    }

    /// Decodes `bytes`, which must hold exactly one value of type `expr`.
    pub fn decode(&self, expr: &str, bytes: &[u8]) -> CodecResult<Value> {
        let codec = self.resolve(expr)?;
        decode_exact(codec.as_ref(), Cursor::new(bytes).with_strict(self.strict))
    }

    /// Encodes `value` as type `expr`.
    pub fn encode(&self, expr: &str, value: &Value) -> CodecResult<Vec<u8>> {
        self.resolve(expr)?.encode(value)
    }

    /// [`Resolver::decode`] for `0x`-prefixed (or bare) hex input.
    pub fn decode_hex(&self, expr: &str, hex: &str) -> CodecResult<Value> {
        self.decode(expr, &scale_common::hex_to_bytes(hex)?)
    }

    /// [`Resolver::encode`] to `0x`-prefixed hex.
    pub fn encode_hex(&self, expr: &str, value: &Value) -> CodecResult<String> {
        self.encode(expr, value)
            .map(|b| scale_common::bytes_to_hex(&b))
    }

    /// The cached codec for `expr`, if it has been resolved before.
    pub fn cached(&self, expr: &str) -> Option<TypeRef> {
        let key = canonicalize(expr).ok()?.to_string();
        self.cache.read().get(&key).cloned()
    }

    /// The number of cached codecs.
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    fn resolve_expr(&self, expr: &TypeExpr, in_progress: &mut InProgress) -> CodecResult<TypeRef> {
        self.cached_or_build(expr.to_string(), in_progress, |this, key, in_progress| {
            this.build(expr, key, in_progress)
        })
    }

    fn resolve_str(&self, expr: &str, in_progress: &mut InProgress) -> CodecResult<TypeRef> {
        self.resolve_expr(&canonicalize(expr)?, in_progress)
    }

    /// Returns the codec cached under `key`, building it with `build` if there
    /// is none yet.
    ///
    /// `build` runs without holding the lock, so two threads may build the
    /// same codec concurrently. Only the first one to finish is cached and
    /// both get that one back.
    fn cached_or_build(
        &self,
        key: String,
        in_progress: &mut InProgress,
        build: impl FnOnce(&Self, &str, &mut InProgress) -> CodecResult<TypeRef>,
    ) -> CodecResult<TypeRef> {
        if let Some(codec) = self.cache.read().get(&key) {
            return Ok(codec.clone());
        }

        if in_progress.contains(&key) {
            return Err(CodecError::unresolvable(
                key,
                format!("recursive definition via {}", in_progress.iter().join(" -> ")),
            ));
        }

        trace!("Building codec for `{}`", key);
        in_progress.push(key.clone());
        let built = build(self, &key, in_progress);
        in_progress.pop();

        Ok(self.cache.write().entry(key).or_insert(built?).clone())
    }

    fn build(&self, expr: &TypeExpr, key: &str, in_progress: &mut InProgress) -> CodecResult<TypeRef> {
        if let TypeExpr::Name(name) = expr {
            if let Some(p) = Primitive::from_name(name) {
                return Ok(Arc::new(p));
            }
        }

        if let Some(def) = self.types.lookup(key) {
            return match def {
                TypeDefinition::Alias(target) => self.resolve_str(target, in_progress),
                TypeDefinition::Composite(def) => self.build_composite(key, def, in_progress),
            };
        }

        let codec: TypeRef = match expr {
            TypeExpr::Name(name) => {
                return Err(CodecError::unresolvable(name.as_str(), "unknown type name"))
            }
            TypeExpr::Generic { name, params } => match (name.as_str(), params.as_slice()) {
                ("Vec", [inner]) => {
                    Arc::new(Sequence::new(key, self.resolve_expr(inner, in_progress)?))
                }
                ("Option", [inner]) => {
                    Arc::new(Optional::new(key, self.resolve_expr(inner, in_progress)?))
                }
                _ => return Err(CodecError::unresolvable(key, "unsupported generic")),
            },
            TypeExpr::Array { inner, len } if **inner == TypeExpr::name("U8") => {
                Arc::new(ByteArray::new(key, *len))
            }
            TypeExpr::Array { inner, len } => Arc::new(FixedArray::new(
                key,
                self.resolve_expr(inner, in_progress)?,
                *len,
            )),
            TypeExpr::Tuple(items) => Arc::new(Tuple::new(
                key,
                items
                    .iter()
                    .map(|t| self.resolve_expr(t, in_progress))
                    .collect::<CodecResult<_>>()?,
            )),
        };

        Ok(codec)
    }

    fn build_composite(
        &self,
        name: &str,
        def: &CompositeDef,
        in_progress: &mut InProgress,
    ) -> CodecResult<TypeRef> {
        let mut named = |pairs: &[(String, String)]| -> CodecResult<Vec<(String, TypeRef)>> {
            pairs
                .iter()
                .map(|(n, t)| Ok((n.clone(), self.resolve_str(t, in_progress)?)))
                .collect()
        };

        let codec: TypeRef = match def {
            CompositeDef::Struct { type_mapping } => Arc::new(Struct::new(name, named(type_mapping)?)?),
            CompositeDef::Enum {
                type_mapping: Some(variants),
                value_list: None,
            } => Arc::new(Enum::new(name, EnumKind::Variants(named(variants)?))?),
            CompositeDef::Enum {
                type_mapping: None,
                value_list: Some(labels),
            } => Arc::new(Enum::new(name, EnumKind::Labels(labels.clone()))?),
            CompositeDef::Enum { type_mapping, .. } => {
                let reason = match type_mapping {
                    Some(_) => "an enum takes a type mapping or a value list, not both",
                    None => "an enum needs a type mapping or a value list",
                };
                return Err(CodecError::invalid_definition(name, reason));
            }
            CompositeDef::Set {
                value_list: SetValues::List(names),
                bit_length,
            } => Arc::new(Set::from_names(name, names.clone(), *bit_length)?),
            CompositeDef::Set {
                value_list: SetValues::Flags(flags),
                bit_length,
            } => Arc::new(Set::new(
                name,
                flags.iter().map(|(n, f)| (n.clone(), *f)).collect(),
                *bit_length,
            )?),
        };

        Ok(codec)
    }
}

/// A cache key for an anonymous descriptor, spelled out from its content:
/// `struct{size: Compact, balance: U16}`, `enum{A, B}`, `set{A = 1; 8}`.
fn content_key(def: &CompositeDef) -> CodecResult<String> {
    let pairs = |pairs: &[(String, String)]| -> CodecResult<String> {
        Ok(pairs
            .iter()
            .map(|(n, t)| Ok(format!("{n}: {}", canonicalize(t)?)))
            .collect::<CodecResult<Vec<_>>>()?
            .join(", "))
    };

    Ok(match def {
        CompositeDef::Struct { type_mapping } => format!("struct{{{}}}", pairs(type_mapping)?),
        CompositeDef::Enum {
            type_mapping,
            value_list,
        } => {
            let variants = type_mapping.as_deref().map(pairs).transpose()?;
            let labels = value_list.as_ref().map(|l| l.join(", "));
            format!(
                "enum{{{}}}",
                [variants, labels].into_iter().flatten().join("; ")
            )
        }
        CompositeDef::Set {
            value_list,
            bit_length,
        } => {
            let values = match value_list {
                SetValues::List(names) => names.join(", "),
                SetValues::Flags(flags) => flags.iter().map(|(n, f)| format!("{n} = {f}")).join(", "),
            };
            match bit_length {
                Some(bits) => format!("set{{{values}; {bits}}}"),
                None => format!("set{{{values}}}"),
            }
        }
    })
}

impl Default for Resolver {
    fn default() -> Self {
        Self::without_types()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("cached", &self.cache_len())
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}
