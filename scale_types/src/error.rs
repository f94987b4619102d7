//! The error type shared by every codec, the parser and the resolver.

use thiserror::Error;

/// Stores the result of codec operations. Returns a [`CodecError`] upon
/// failure.
pub type CodecResult<T> = Result<T, CodecError>;

/// An error encountered while decoding, encoding or resolving a type.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CodecError {
    /// A read went past the end of the input.
    #[error("Insufficient data at offset {offset}: expected {needed} byte(s), but only {remaining} remain")]
    TruncatedInput {
        /// Cursor offset at which the read was attempted.
        offset: usize,
        /// Number of bytes the read needed.
        needed: usize,
        /// Number of bytes that were left.
        remaining: usize,
    },

    /// A header byte, discriminant or tag was outside the allowed set.
    #[error("Invalid encoding for `{type_name}`: {reason}")]
    InvalidEncoding {
        /// Canonical name of the type being decoded.
        type_name: String,
        /// What was wrong with the input.
        reason: String,
    },

    /// An integer does not fit in the width of the target type.
    #[error("Integer does not fit in {bits} bits")]
    IntegerOverflow {
        /// Width of the target type.
        bits: u32,
    },

    /// A type expression could not be parsed, or names an unknown type.
    #[error("Type `{expr}` is not resolvable: {reason}")]
    UnresolvableType {
        /// The expression as given (or its canonical form).
        expr: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A structural descriptor is inconsistent (duplicate field names, an enum
    /// with both a value list and a type mapping, ...).
    #[error("Invalid definition for `{name}`: {reason}")]
    InvalidDefinition {
        /// Name of the type being constructed.
        name: String,
        /// What was wrong with the descriptor.
        reason: String,
    },

    /// A value handed to an encoder does not have the shape the codec needs.
    #[error("Cannot encode {found} as `{type_name}` (expected {expected})")]
    TypeMismatch {
        /// Canonical name of the codec.
        type_name: String,
        /// What the codec accepts.
        expected: &'static str,
        /// What it was given.
        found: &'static str,
    },

    /// A whole-buffer decode finished with bytes left over.
    #[error("{remaining} trailing byte(s) after decoding `{type_name}`")]
    TrailingBytes {
        /// Canonical name of the decoded type.
        type_name: String,
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// Malformed hex at the outer boundary.
    #[error("Invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl CodecError {
    pub(crate) fn invalid_encoding(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolvable(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvableType {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
