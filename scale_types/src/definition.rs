//! Structural type descriptors, and the seam through which a resolver finds
//! them by name.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// How a named type is defined.
///
/// Deserializes from either a plain string (an alias for another type
/// expression) or a tagged object:
///
/// ```json
/// "Compact<Balance>"
/// {"type": "struct", "type_mapping": [["nonce", "U32"], ["data", "AccountData"]]}
/// {"type": "enum", "value_list": ["Optional", "Default"]}
/// {"type": "enum", "type_mapping": [["ApplyExtrinsic", "U32"], ["Finalization", "Null"]]}
/// {"type": "set", "value_list": {"Transfer": 2, "Fee": 8}, "bit_length": 8}
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypeDefinition {
    /// Another type expression.
    Alias(String),
    /// A struct, enum or set.
    Composite(CompositeDef),
}

/// A struct, enum or set descriptor.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CompositeDef {
    /// Named fields in order.
    Struct {
        /// `(field name, type expression)` pairs.
        type_mapping: Vec<(String, String)>,
    },
    /// A tagged union. Exactly one of the two lists must be given.
    Enum {
        /// `(variant name, payload type expression)` pairs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_mapping: Option<Vec<(String, String)>>,
        /// Plain labels without payloads.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_list: Option<Vec<String>>,
    },
    /// A bitmask over named flags.
    Set {
        /// The members.
        value_list: SetValues,
        /// Width of the mask in bits (8, 16, 32 or 64). Derived from the
        /// members when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bit_length: Option<u32>,
    },
}

/// The members of a set.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SetValues {
    /// The `i`-th name is bit `i`.
    List(Vec<String>),
    /// Explicit flag values.
    Flags(BTreeMap<String, u64>),
}

/// Something that knows type definitions by canonical name.
///
/// A [`Resolver`](crate::Resolver) consults its lookup for every bare name
/// that is not a primitive.
pub trait TypeLookup: Send + Sync {
    /// The definition registered under `name`, if any.
    fn lookup(&self, name: &str) -> Option<&TypeDefinition>;
}

impl TypeLookup for HashMap<String, TypeDefinition> {
    fn lookup(&self, name: &str) -> Option<&TypeDefinition> {
        self.get(name)
    }
}

impl TypeLookup for BTreeMap<String, TypeDefinition> {
    fn lookup(&self, name: &str) -> Option<&TypeDefinition> {
        self.get(name)
    }
}

/// A lookup that knows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTypes;

impl TypeLookup for NoTypes {
    fn lookup(&self, _: &str) -> Option<&TypeDefinition> {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_every_shape() -> Result<(), serde_json::Error> {
        let defs: BTreeMap<String, TypeDefinition> = serde_json::from_value(json!({
            "Balance": "u128",
            "Phase": {
                "type": "enum",
                "type_mapping": [["ApplyExtrinsic", "u32"], ["Finalization", "Null"]]
            },
            "Modifier": {"type": "enum", "value_list": ["Optional", "Default"]},
            "Info": {"type": "struct", "type_mapping": [["nonce", "Index"]]},
            "Reasons": {"type": "set", "value_list": {"Transfer": 2, "Fee": 8}},
            "Flags": {"type": "set", "value_list": ["A", "B"], "bit_length": 16},
        }))?;

        assert_eq!(defs["Balance"], TypeDefinition::Alias("u128".into()));
        assert_eq!(
            defs["Phase"],
            TypeDefinition::Composite(CompositeDef::Enum {
                type_mapping: Some(vec![
                    ("ApplyExtrinsic".into(), "u32".into()),
                    ("Finalization".into(), "Null".into())
                ]),
                value_list: None,
            })
        );
        assert_eq!(
            defs["Modifier"],
            TypeDefinition::Composite(CompositeDef::Enum {
                type_mapping: None,
                value_list: Some(vec!["Optional".into(), "Default".into()]),
            })
        );
        assert_eq!(
            defs["Info"],
            TypeDefinition::Composite(CompositeDef::Struct {
                type_mapping: vec![("nonce".into(), "Index".into())]
            })
        );
        assert_eq!(
            defs["Reasons"],
            TypeDefinition::Composite(CompositeDef::Set {
                value_list: SetValues::Flags(BTreeMap::from([
                    ("Transfer".into(), 2),
                    ("Fee".into(), 8)
                ])),
                bit_length: None,
            })
        );
        assert_eq!(
            defs["Flags"],
            TypeDefinition::Composite(CompositeDef::Set {
                value_list: SetValues::List(vec!["A".into(), "B".into()]),
                bit_length: Some(16),
            })
        );

        Ok(())
    }
}
