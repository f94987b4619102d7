//! Decoding of version 1 runtime metadata.
//!
//! The layout is `"meta" | version: u8 | Vec<MetadataV1Module>`. Modules are
//! decoded by a [`Resolver`](scale_types::Resolver) over the bundled
//! `metadata_v1` dictionary and then deserialized into the types below.

use std::collections::BTreeMap;

use log::debug;
use scale_types::{CodecError, Cursor};
use serde::Deserialize;

use crate::{
    error::{MetadataError, MetadataResult},
    registry::TypeRegistry,
};

const METADATA_TYPES: &str = include_str!("../types/metadata_v1.json");

/// `"meta"` read as a little-endian `u32`.
pub const MAGIC_NUMBER: u32 = 0x6174_656d;

const VERSION: u8 = 1;

/// One runtime module.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ModuleMetadata {
    /// Module name.
    pub name: String,
    /// Storage key prefix.
    pub prefix: String,
    /// Storage items, if the module has storage.
    pub storage: Option<Vec<StorageMetadata>>,
    /// Dispatchable calls, if the module has any.
    pub calls: Option<Vec<CallMetadata>>,
    /// Events, if the module emits any.
    pub events: Option<Vec<EventMetadata>>,
}

/// A storage item.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct StorageMetadata {
    /// Item name.
    pub name: String,
    /// What a read of an unset key yields.
    pub modifier: StorageModifier,
    /// Plain value or map.
    #[serde(rename = "type")]
    pub ty: StorageType,
    /// The default value, as `0x`-prefixed hex.
    pub fallback: String,
    /// Doc comment lines.
    pub documentation: Vec<String>,
}

/// What a read of an unset storage key yields.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum StorageModifier {
    /// Nothing.
    Optional,
    /// The fallback value.
    Default,
}

/// The shape of a storage item.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub enum StorageType {
    /// A single value of the named type.
    Plain(String),
    /// A map between the named types.
    Map {
        /// Key type expression.
        key: String,
        /// Value type expression.
        value: String,
    },
}

/// A dispatchable call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CallMetadata {
    /// Call name.
    pub name: String,
    /// Arguments in order.
    pub args: Vec<CallArgument>,
    /// Doc comment lines.
    pub documentation: Vec<String>,
}

/// A call argument and its type expression.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CallArgument {
    /// Argument name.
    pub name: String,
    /// Type expression.
    #[serde(rename = "type")]
    pub ty: String,
}

/// An event and the type expressions of its fields.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct EventMetadata {
    /// Event name.
    pub name: String,
    /// Field type expressions.
    pub args: Vec<String>,
    /// Doc comment lines.
    pub documentation: Vec<String>,
}

/// Decoded metadata, with calls and events indexed by their two-byte lookup.
///
/// A lookup is `"%02x%02x"` of the module's position among the modules that
/// have calls (or events), and the item's position within the module.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetadataV1 {
    modules: Vec<ModuleMetadata>,
    call_index: BTreeMap<String, (usize, usize)>,
    event_index: BTreeMap<String, (usize, usize)>,
}

impl MetadataV1 {
    /// Decodes a metadata blob, magic number and version included.
    pub fn decode(bytes: &[u8]) -> MetadataResult<Self> {
        let mut cursor = Cursor::new(bytes);

        let magic = u32::from_le_bytes(cursor.read_array()?);
        if magic != MAGIC_NUMBER {
            return Err(MetadataError::BadMagic(magic));
        }

        let version = cursor.read_byte()?;
        if version != VERSION {
            return Err(MetadataError::UnsupportedVersion(version));
        }

        let resolver = TypeRegistry::from_dictionary(METADATA_TYPES, "metadata_v1")?.into_resolver();
        let modules = resolver
            .resolve("Vec<MetadataV1Module>")?
            .decode_all(cursor.remaining_bytes())?;
        let modules = serde_json::from_value(serde_json::to_value(&modules)?)?;

        Ok(Self::from_modules(modules))
    }

    /// [`MetadataV1::decode`] for `0x`-prefixed (or bare) hex input.
    pub fn from_hex(hex: &str) -> MetadataResult<Self> {
        let bytes = scale_common::hex_to_bytes(hex).map_err(CodecError::from)?;
        Self::decode(&bytes)
    }

    /// Indexes already decoded modules.
    pub fn from_modules(modules: Vec<ModuleMetadata>) -> Self {
        let mut call_index = BTreeMap::new();
        let mut event_index = BTreeMap::new();
        let (mut call_modules, mut event_modules) = (0, 0);

        for (m, module) in modules.iter().enumerate() {
            if let Some(calls) = &module.calls {
                call_index.extend((0..calls.len()).map(|i| (lookup(call_modules, i), (m, i))));
                call_modules += 1;
            }

            if let Some(events) = &module.events {
                event_index.extend((0..events.len()).map(|i| (lookup(event_modules, i), (m, i))));
                event_modules += 1;
            }
        }

        debug!(
            "Indexed {} call(s) and {} event(s) across {} module(s)",
            call_index.len(),
            event_index.len(),
            modules.len()
        );

        Self {
            modules,
            call_index,
            event_index,
        }
    }

    /// Every module in declaration order.
    pub fn modules(&self) -> &[ModuleMetadata] {
        &self.modules
    }

    /// The call with lookup `lookup` (e.g. `"0301"`) and its module.
    pub fn call(&self, lookup: &str) -> Option<(&ModuleMetadata, &CallMetadata)> {
        let &(m, i) = self.call_index.get(lookup)?;
        let module = &self.modules[m];
        Some((module, &module.calls.as_deref()?[i]))
    }

    /// The event with lookup `lookup` and its module.
    pub fn event(&self, lookup: &str) -> Option<(&ModuleMetadata, &EventMetadata)> {
        let &(m, i) = self.event_index.get(lookup)?;
        let module = &self.modules[m];
        Some((module, &module.events.as_deref()?[i]))
    }

    /// Every call lookup, sorted.
    pub fn call_lookups(&self) -> impl Iterator<Item = &str> {
        self.call_index.keys().map(String::as_str)
    }

    /// Every event lookup, sorted.
    pub fn event_lookups(&self) -> impl Iterator<Item = &str> {
        self.event_index.keys().map(String::as_str)
    }
}

fn lookup(module: usize, item: usize) -> String {
    format!("{module:02x}{item:02x}")
}

#[cfg(test)]
mod tests {
    use scale_types::Value;
    use serde_json::json;

    use super::*;
    use crate::testing_utils::common_setup;

    fn encode_modules(modules: serde_json::Value) -> Vec<u8> {
        let resolver = TypeRegistry::from_dictionary(METADATA_TYPES, "metadata_v1")
            .unwrap()
            .into_resolver();
        let modules: Value = serde_json::from_value(modules).unwrap();

        let mut bytes = b"meta".to_vec();
        bytes.push(VERSION);
        bytes.extend(resolver.encode("Vec<MetadataV1Module>", &modules).unwrap());
        bytes
    }

    fn sample() -> Vec<u8> {
        encode_modules(json!([
            {
                "name": "System",
                "prefix": "System",
                "storage": [{
                    "name": "AccountNonce",
                    "modifier": "Default",
                    "type": {"Map": {"key": "AccountId", "value": "Index"}},
                    "fallback": "0x00000000",
                    "documentation": [" Extrinsics nonce for accounts."]
                }],
                "calls": null,
                "events": [{"name": "ExtrinsicSuccess", "args": [], "documentation": []}]
            },
            {
                "name": "Timestamp",
                "prefix": "Timestamp",
                "storage": [{
                    "name": "Now",
                    "modifier": "Optional",
                    "type": {"Plain": "Moment"},
                    "fallback": "0x",
                    "documentation": []
                }],
                "calls": [{
                    "name": "set",
                    "args": [{"name": "now", "type": "Compact<Moment>"}],
                    "documentation": []
                }],
                "events": null
            },
            {
                "name": "Balances",
                "prefix": "Balances",
                "storage": null,
                "calls": [{
                    "name": "transfer",
                    "args": [
                        {"name": "dest", "type": "Address"},
                        {"name": "value", "type": "Compact<Balance>"}
                    ],
                    "documentation": []
                }],
                "events": [{
                    "name": "Transfer",
                    "args": ["AccountId", "AccountId", "Balance"],
                    "documentation": []
                }]
            }
        ]))
    }

    #[test]
    fn magic_number_spells_meta() {
        assert_eq!(MAGIC_NUMBER, u32::from_le_bytes(*b"meta"));
        assert_eq!(MAGIC_NUMBER, 1_635_018_093);
    }

    #[test]
    fn decodes_modules() {
        common_setup();
        let metadata = MetadataV1::decode(&sample()).unwrap();

        let names: Vec<_> = metadata.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["System", "Timestamp", "Balances"]);

        let system = &metadata.modules()[0];
        assert!(system.calls.is_none());
        assert_eq!(
            system.storage.as_deref().unwrap()[0],
            StorageMetadata {
                name: "AccountNonce".into(),
                modifier: StorageModifier::Default,
                ty: StorageType::Map {
                    key: "AccountId".into(),
                    value: "Index".into()
                },
                fallback: "0x00000000".into(),
                documentation: vec![" Extrinsics nonce for accounts.".into()],
            }
        );

        let timestamp = &metadata.modules()[1];
        let now = &timestamp.storage.as_deref().unwrap()[0];
        assert_eq!(now.modifier, StorageModifier::Optional);
        assert_eq!(now.ty, StorageType::Plain("Moment".into()));
        assert_eq!(now.fallback, "0x");
    }

    #[test]
    fn indexes_calls_and_events_by_lookup() {
        let metadata = MetadataV1::decode(&sample()).unwrap();

        // System has no calls, so Timestamp is the first call module.
        assert_eq!(metadata.call_lookups().collect::<Vec<_>>(), ["0000", "0100"]);
        let (module, call) = metadata.call("0100").unwrap();
        assert_eq!(module.name, "Balances");
        assert_eq!(call.name, "transfer");
        assert_eq!(call.args[1].ty, "Compact<Balance>");

        // Timestamp has no events, so Balances is the second event module.
        assert_eq!(metadata.event_lookups().collect::<Vec<_>>(), ["0000", "0100"]);
        let (module, event) = metadata.event("0100").unwrap();
        assert_eq!(module.name, "Balances");
        assert_eq!(event.args, ["AccountId", "AccountId", "Balance"]);

        assert!(metadata.call("0200").is_none());
    }

    #[test]
    fn hex_input() {
        let bytes = sample();
        assert_eq!(
            MetadataV1::from_hex(&scale_common::bytes_to_hex(&bytes)).unwrap(),
            MetadataV1::decode(&bytes).unwrap()
        );
    }

    #[test]
    fn rejects_foreign_blobs() {
        assert!(matches!(
            MetadataV1::decode(&[0, 0, 0, 0, 1]),
            Err(MetadataError::BadMagic(0))
        ));
        assert!(matches!(
            MetadataV1::decode(b"meta\x02\x00"),
            Err(MetadataError::UnsupportedVersion(2))
        ));
        assert!(matches!(
            MetadataV1::decode(b"me"),
            Err(MetadataError::Codec(CodecError::TruncatedInput { .. }))
        ));

        let mut trailing = sample();
        trailing.push(0);
        assert!(matches!(
            MetadataV1::decode(&trailing),
            Err(MetadataError::Codec(CodecError::TrailingBytes { .. }))
        ));
    }
}
