//! The grammar of textual type expressions.
//!
//! ```text
//! expr    := tuple | array | generic
//! tuple   := "(" [expr ("," expr)* [","]] ")"
//! array   := "[" expr ";" digits "]"
//! generic := name ["<" expr ("," expr)* ">"]
//! name    := (alnum | "_" | ":")+
//! ```
//!
//! Whitespace (including newlines) is allowed around every token. A
//! parenthesised single expression without a trailing comma is just that
//! expression.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use itertools::Itertools as _;
use winnow::{
    ascii::{digit1, multispace0},
    combinator::{alt, delimited, opt, preceded, separated, terminated, trace},
    token::take_while,
    Parser as _,
};

use crate::error::{CodecError, CodecResult};

/// A parsed type expression.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TypeExpr {
    /// A bare, possibly path-qualified, name: `U32`, `frame_system::Phase`.
    Name(String),
    /// `Name<P1, .., Pn>`.
    Generic {
        /// The generic's name.
        name: String,
        /// Its parameters, in order.
        params: Vec<TypeExpr>,
    },
    /// `[Inner; N]`.
    Array {
        /// Element type.
        inner: Box<TypeExpr>,
        /// Element count.
        len: usize,
    },
    /// `(A, B, ..)`. The empty tuple is `()`.
    Tuple(Vec<TypeExpr>),
}

impl TypeExpr {
    /// Parses a type expression, which must span the whole input.
    pub fn parse(input: &str) -> CodecResult<Self> {
        expr.parse(input).map_err(|e| {
            CodecError::unresolvable(
                input.trim(),
                format!("parse error at offset {}: {}", e.offset(), e.inner()),
            )
        })
    }

    /// Shorthand for a [`TypeExpr::Name`].
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Shorthand for a [`TypeExpr::Generic`].
    pub fn generic(name: impl Into<String>, params: Vec<TypeExpr>) -> Self {
        Self::Generic {
            name: name.into(),
            params,
        }
    }

    /// Shorthand for a [`TypeExpr::Array`].
    pub fn array(inner: TypeExpr, len: usize) -> Self {
        Self::Array {
            inner: Box::new(inner),
            len,
        }
    }
}

impl FromStr for TypeExpr {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the expression in its canonical spelling: `Vec<(Compact, U16)>`,
/// `[U8; 20]`, `(U8,)` for a single-element tuple.
impl Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(n) => f.write_str(n),
            TypeExpr::Generic { name, params } => write!(f, "{}<{}>", name, params.iter().join(", ")),
            TypeExpr::Array { inner, len } => write!(f, "[{inner}; {len}]"),
            TypeExpr::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            TypeExpr::Tuple(items) => write!(f, "({})", items.iter().join(", ")),
        }
    }
}

/// A single place to swap out the error type if required.
type PResult<T> = winnow::PResult<T, winnow::error::ContextError>;

fn expr(input: &mut &str) -> PResult<TypeExpr> {
    delimited(multispace0, alt((tuple, array, generic)), multispace0).parse_next(input)
}

fn tuple(input: &mut &str) -> PResult<TypeExpr> {
    trace(
        "tuple",
        delimited(
            ('(', multispace0),
            (separated(0.., expr, ','), opt(',')),
            (multispace0, ')'),
        )
        .map(
            |(mut items, trailing): (Vec<TypeExpr>, Option<char>)| match (items.len(), trailing) {
                (1, None) => items.remove(0),
                _ => TypeExpr::Tuple(items),
            },
        ),
    )
    .parse_next(input)
}

fn array(input: &mut &str) -> PResult<TypeExpr> {
    trace(
        "array",
        delimited(
            '[',
            (
                terminated(expr, ';'),
                delimited(multispace0, digit1.try_map(usize::from_str), multispace0),
            ),
            ']',
        )
        .map(|(inner, len)| TypeExpr::array(inner, len)),
    )
    .parse_next(input)
}

fn generic(input: &mut &str) -> PResult<TypeExpr> {
    trace(
        "generic",
        (
            name,
            opt(preceded(
                (multispace0, '<'),
                terminated(separated(1.., expr, ','), '>'),
            )),
        )
            .map(|(name, params): (&str, Option<Vec<TypeExpr>>)| match params {
                Some(params) => TypeExpr::generic(name, params),
                None => TypeExpr::name(name),
            }),
    )
    .parse_next(input)
}

fn name<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == ':').parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(s: &str) -> TypeExpr {
        TypeExpr::parse(s).unwrap()
    }

    #[test]
    fn parses_each_shape() {
        assert_eq!(parsed("U8"), TypeExpr::name("U8"));
        assert_eq!(
            parsed("Vec<Compact>"),
            TypeExpr::generic("Vec", vec![TypeExpr::name("Compact")])
        );
        assert_eq!(
            parsed("[U8; 20]"),
            TypeExpr::array(TypeExpr::name("U8"), 20)
        );
        assert_eq!(
            parsed("(Compact,U16,U8)"),
            TypeExpr::Tuple(vec![
                TypeExpr::name("Compact"),
                TypeExpr::name("U16"),
                TypeExpr::name("U8")
            ])
        );
        assert_eq!(parsed("()"), TypeExpr::Tuple(vec![]));
    }

    #[test]
    fn commas_inside_generics_do_not_split_tuples() {
        assert_eq!(
            parsed("(Vec<(U8, U16)>, BTreeMap<U32, Option<U64>>)"),
            TypeExpr::Tuple(vec![
                TypeExpr::generic(
                    "Vec",
                    vec![TypeExpr::Tuple(vec![
                        TypeExpr::name("U8"),
                        TypeExpr::name("U16")
                    ])]
                ),
                TypeExpr::generic(
                    "BTreeMap",
                    vec![
                        TypeExpr::name("U32"),
                        TypeExpr::generic("Option", vec![TypeExpr::name("U64")])
                    ]
                ),
            ])
        );
    }

    #[test]
    fn whitespace_and_newlines_are_insignificant() {
        assert_eq!(
            parsed(" Vec <\n  ( Compact ,U16 )\n> "),
            parsed("Vec<(Compact, U16)>")
        );
    }

    #[test]
    fn parentheses_around_one_expression_are_transparent() {
        assert_eq!(parsed("(U8)"), TypeExpr::name("U8"));
        assert_eq!(parsed("(U8,)"), TypeExpr::Tuple(vec![TypeExpr::name("U8")]));
    }

    #[test]
    fn paths_are_kept_whole() {
        assert_eq!(
            parsed("frame_system::Phase"),
            TypeExpr::name("frame_system::Phase")
        );
    }

    #[test]
    fn displays_canonically() {
        for s in [
            "Vec<Compact>",
            "(Compact, U16)",
            "[U8; 20]",
            "Option<Vec<(U8,)>>",
            "()",
            "BTreeMap<U32, Bytes>",
        ] {
            assert_eq!(parsed(s).to_string(), s);
        }
    }

    #[test]
    fn malformed_expressions_are_unresolvable() {
        for s in ["", "Vec<", "Vec<>", "[U8; x]", "(U8", "U8>", "Vec<U8> U8"] {
            assert!(
                matches!(TypeExpr::parse(s), Err(CodecError::UnresolvableType { .. })),
                "{s:?} should not parse"
            );
        }
    }
}
