//! Canonicalisation of type expressions.
//!
//! Two expressions that denote the same type must end up with the same
//! canonical name, since that name keys both registry lookups and the
//! resolver cache. Normalisation runs in two passes:
//! 1. Qualified paths (`<T as Trait>::Item`) are rewritten on the raw text,
//!    because they are not part of the [`TypeExpr`] grammar.
//! 2. The parsed expression is rewritten bottom-up through the tables below.

use crate::{error::CodecResult, expr::TypeExpr};

/// Bare names that are spelled differently in the wild.
const NAME_ALIASES: &[(&str, &str)] = &[
    ("bool", "Bool"),
    ("Hex", "Bytes"),
    ("str", "String"),
    ("Text", "String"),
];

/// Fixed-size hashes, as byte array lengths.
const HASH_ALIASES: &[(&str, usize)] = &[("H160", 20), ("H256", 32), ("H512", 64)];

/// Generics whose parameters are phantom for encoding purposes.
const PHANTOM_GENERICS: &[&str] = &["AccountData", "EventRecord"];

/// Generic parameter names that stand for a runtime configuration rather
/// than a type, as in `RawEvent<T>` or `Module<T, I>`.
const CONFIG_PARAMS: &[&str] = &["T", "I"];

/// Parses and canonicalises `expr`.
pub fn canonicalize(expr: &str) -> CodecResult<TypeExpr> {
    let text = rewrite_qualified_paths(expr);
    TypeExpr::parse(&text).map(canonical)
}

/// The canonical name of `expr`.
pub fn canonical_name(expr: &str) -> CodecResult<String> {
    canonicalize(expr).map(|e| e.to_string())
}

/// Rewrites an already-parsed expression into canonical form.
pub fn canonical(expr: TypeExpr) -> TypeExpr {
    match expr {
        TypeExpr::Name(name) => canonical_name_only(&name),
        TypeExpr::Generic { name, params } => {
            let name = last_segment(&name).to_owned();
            canonical_generic(name, params.into_iter().map(canonical).collect())
        }
        TypeExpr::Array { inner, len } => TypeExpr::array(canonical(*inner), len),
        TypeExpr::Tuple(items) if items.is_empty() => TypeExpr::name("Null"),
        TypeExpr::Tuple(items) => TypeExpr::Tuple(items.into_iter().map(canonical).collect()),
    }
}

fn canonical_name_only(name: &str) -> TypeExpr {
    let name = last_segment(name);

    if let Some((_, len)) = HASH_ALIASES.iter().find(|(n, _)| *n == name) {
        return TypeExpr::array(TypeExpr::name("U8"), *len);
    }
    if let Some((_, to)) = NAME_ALIASES.iter().find(|(from, _)| *from == name) {
        return TypeExpr::name(*to);
    }

    TypeExpr::Name(integer_name(name).unwrap_or_else(|| name.to_owned()))
}

/// Rewrites a generic whose parameters are already canonical.
fn canonical_generic(name: String, mut params: Vec<TypeExpr>) -> TypeExpr {
    let is_config = |p: &TypeExpr| matches!(p, TypeExpr::Name(n) if CONFIG_PARAMS.contains(&n.as_str()));

    match (name.as_str(), params.len()) {
        ("Compact", _) => TypeExpr::name("Compact"),
        ("Box", 1) => params.remove(0),
        ("Vec", 1) if params[0] == TypeExpr::name("U8") => TypeExpr::name("String"),
        ("BTreeSet", 1) => canonical_generic("Vec".into(), params),
        ("BTreeMap", 2) => TypeExpr::generic("Vec", vec![TypeExpr::Tuple(params)]),
        (n, _) if PHANTOM_GENERICS.contains(&n) => TypeExpr::Name(name),
        _ if params.iter().all(is_config) => canonical_name_only(&name),
        _ => TypeExpr::Generic { name, params },
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// `u32` -> `U32`, `i8` -> `I8`.
fn integer_name(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let sign = match chars.next()? {
        'u' => 'U',
        'i' => 'I',
        _ => return None,
    };
    let width = chars.as_str();

    match !width.is_empty() && width.bytes().all(|b| b.is_ascii_digit()) {
        true => Some(format!("{sign}{width}")),
        false => None,
    }
}

/// Rewrites every `<Type as Trait>::Item` in `expr`, innermost first.
fn rewrite_qualified_paths(expr: &str) -> String {
    let mut text = expr.to_owned();

    while let Some((range, replacement)) = find_qualified_path(&text) {
        text.replace_range(range, &replacement);
    }

    text
}

/// Finds the first `<Type as Trait>::Item` and what it should become.
fn find_qualified_path(text: &str) -> Option<(std::ops::Range<usize>, String)> {
    let as_at = text.find(" as ")?;

    // The opening `<` of the qualified path is the nearest one before ` as `.
    let start = text[..as_at].rfind('<')?;
    let ty = text[start + 1..as_at].trim();

    // The matching `>`, skipping over any generics on the trait.
    let mut depth = 0;
    let mut close = None;
    for (i, c) in text[as_at..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' if depth == 0 => {
                close = Some(as_at + i);
                break;
            }
            '>' => depth -= 1,
            _ => {}
        }
    }
    let close = close?;
    let trait_name = text[as_at + 4..close].trim();
    let trait_name = last_segment(trait_name.split('<').next().unwrap_or(trait_name));

    let rest = text[close + 1..].strip_prefix("::")?;
    let item_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let item = &rest[..item_len];
    let end = close + 3 + item_len;

    let replacement = match (trait_name, item) {
        ("StaticLookup", "Source") => "Address".to_owned(),
        ("HasCompact", "Type") => format!("Compact<{ty}>"),
        (_, "Inherent") => ty.to_owned(),
        _ => item.to_owned(),
    };

    Some((start..end, replacement))
}
