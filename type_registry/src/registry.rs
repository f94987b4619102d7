//! Layered type dictionaries.
//!
//! A registry is assembled from up to four layers, each overriding the names
//! defined by the ones before it:
//! 1. the bundled `default` dictionary,
//! 2. the chain's own dictionary, `<types_dir>/<spec_name>.json`,
//! 3. the chain dictionary's `versioning` entries whose runtime range covers
//!    the spec version, in file order,
//! 4. custom types supplied by the caller.
//!
//! Every key is stored under its canonical name, so `Vec<u8>` and `Bytes`
//! style spellings in different layers override each other as expected.

use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use scale_types::{normalize::canonical_name, CodecError, Resolver, TypeDefinition, TypeLookup};
use serde::Deserialize;

use crate::error::{RegistryError, RegistryResult};

/// Name of the bundled dictionary every registry starts from.
pub const DEFAULT_SPEC: &str = "default";

const DEFAULT_TYPES: &str = include_str!("../types/default.json");

/// The contents of one type dictionary file.
///
/// ```json
/// {
///   "runtime_id": 1020,
///   "types": {"Balance": "u128"},
///   "versioning": [{"runtime_range": [1019, 1031], "types": {"Weight": "u32"}}]
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ChainTypes {
    /// The runtime version the dictionary describes. Used as the spec version
    /// when none is given explicitly.
    #[serde(default)]
    pub runtime_id: Option<u32>,
    /// Definitions by name.
    #[serde(default)]
    pub types: BTreeMap<String, TypeDefinition>,
    /// Overrides for ranges of runtime versions.
    #[serde(default)]
    pub versioning: Vec<VersionedTypes>,
}

/// Definitions that apply to a range of runtime versions.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct VersionedTypes {
    /// First and last version covered, both inclusive. An open upper bound
    /// covers every later version.
    pub runtime_range: (u32, Option<u32>),
    /// Definitions by name.
    pub types: BTreeMap<String, TypeDefinition>,
}

impl VersionedTypes {
    /// `true` if `spec_version` falls within the runtime range.
    pub fn applies_to(&self, spec_version: u32) -> bool {
        let (from, to) = self.runtime_range;
        spec_version >= from && to.map_or(true, |to| spec_version <= to)
    }
}

impl ChainTypes {
    /// Parses a dictionary. `origin` names it in error messages.
    pub fn from_json_str(json: &str, origin: &str) -> RegistryResult<Self> {
        let des = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(des).map_err(|source| RegistryError::Json {
            origin: origin.to_owned(),
            source,
        })
    }

    /// Reads and parses a dictionary file.
    pub fn from_file(path: &Path) -> RegistryResult<Self> {
        let file = File::open(path).map_err(|source| RegistryError::Io {
            path: path.to_owned(),
            source,
        })?;

        let des = &mut serde_json::Deserializer::from_reader(&file);
        serde_path_to_error::deserialize(des).map_err(|source| RegistryError::Json {
            origin: path.display().to_string(),
            source,
        })
    }
}

/// Type definitions by canonical name, for one chain at one spec version.
///
/// Implements [`TypeLookup`], so it plugs straight into a [`Resolver`].
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    spec_name: String,
    spec_version: Option<u32>,
    types: HashMap<String, TypeDefinition>,
}

impl TypeRegistry {
    /// Starts a registry with only the default layer configured.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// A registry over a single dictionary, without the default layer.
    pub fn from_dictionary(json: &str, origin: &str) -> RegistryResult<Self> {
        let dict = ChainTypes::from_json_str(json, origin)?;

        let mut registry = Self::empty(origin);
        registry.spec_version = dict.runtime_id;
        registry.merge(dict.types, origin)?;

        Ok(registry)
    }

    fn empty(spec_name: &str) -> Self {
        Self {
            spec_name: spec_name.to_owned(),
            spec_version: None,
            types: HashMap::new(),
        }
    }

    /// The chain the registry was built for.
    pub fn spec_name(&self) -> &str {
        &self.spec_name
    }

    /// The spec version whose overrides were applied, if any.
    pub fn spec_version(&self) -> Option<u32> {
        self.spec_version
    }

    /// Number of defined names.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` if nothing is defined.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Canonical names of every definition, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The definition for `name`, in any spelling that canonicalises to a
    /// defined name.
    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        let key = canonical_name(name).ok()?;
        self.types.get(&key)
    }

    /// Hands the registry to a new [`Resolver`].
    pub fn into_resolver(self) -> Resolver {
        Resolver::new(self)
    }

    /// Resolves every defined name and returns the ones that fail, sorted by
    /// name.
    pub fn check_types(&self) -> Vec<(String, CodecError)> {
        let resolver = Resolver::new(self.types.clone());

        self.names()
            .into_iter()
            .filter_map(|name| match resolver.resolve(name) {
                Ok(_) => None,
                Err(e) => {
                    warn!("{}: {}", name, e);
                    Some((name.to_owned(), e))
                }
            })
            .collect()
    }

    fn merge(
        &mut self,
        layer: BTreeMap<String, TypeDefinition>,
        origin: &str,
    ) -> RegistryResult<()> {
        debug!("Merging {} type(s) from {}", layer.len(), origin);

        for (name, def) in layer {
            let key = canonical_name(&name).map_err(|source| RegistryError::InvalidName {
                name: name.clone(),
                origin: origin.to_owned(),
                source,
            })?;

            // A name aliased to itself is a marker for a built-in type.
            if let TypeDefinition::Alias(target) = &def {
                if matches!(canonical_name(target), Ok(t) if t == key) {
                    trace!("Skipping self-alias `{}` in {}", name, origin);
                    continue;
                }
            }

            self.types.insert(key, def);
        }

        Ok(())
    }
}

impl TypeLookup for TypeRegistry {
    fn lookup(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }
}

/// Configures the layers of a [`TypeRegistry`].
#[derive(Clone, Debug, Default)]
pub struct TypeRegistryBuilder {
    spec_name: Option<String>,
    types_dir: Option<PathBuf>,
    spec_version: Option<u32>,
    custom_types: BTreeMap<String, TypeDefinition>,
}

impl TypeRegistryBuilder {
    /// Layers `<types_dir>/<name>.json` over the defaults.
    pub fn spec_name(mut self, name: impl Into<String>) -> Self {
        self.spec_name = Some(name.into());
        self
    }

    /// Where chain dictionaries are looked up.
    pub fn types_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.types_dir = Some(dir.into());
        self
    }

    /// Selects the versioned overrides to apply. Defaults to the chain
    /// dictionary's `runtime_id`.
    pub fn spec_version(mut self, version: u32) -> Self {
        self.spec_version = Some(version);
        self
    }

    /// Adds definitions that override every other layer. Later calls
    /// override earlier ones.
    pub fn custom_types(
        mut self,
        types: impl IntoIterator<Item = (String, TypeDefinition)>,
    ) -> Self {
        self.custom_types.extend(types);
        self
    }

    /// Loads and merges the configured layers.
    ///
    /// A chain without a dictionary file falls back to the defaults. A
    /// dictionary that exists but does not parse is an error.
    pub fn build(self) -> RegistryResult<TypeRegistry> {
        let defaults = ChainTypes::from_json_str(DEFAULT_TYPES, DEFAULT_SPEC)?;

        let mut registry = TypeRegistry::empty(DEFAULT_SPEC);
        registry.spec_version = self.spec_version;
        registry.merge(defaults.types, DEFAULT_SPEC)?;

        if let Some(name) = self.spec_name.as_deref().filter(|n| *n != DEFAULT_SPEC) {
            registry.spec_name = name.to_owned();

            if let Some((origin, chain)) = self.load_chain(name)? {
                registry.merge(chain.types, &origin)?;
                registry.spec_version = self.spec_version.or(chain.runtime_id);

                if let Some(version) = registry.spec_version {
                    for layer in chain.versioning.into_iter().filter(|l| l.applies_to(version)) {
                        let origin = format!("{origin} for runtime range {:?}", layer.runtime_range);
                        registry.merge(layer.types, &origin)?;
                    }
                }
            }
        }

        registry.merge(self.custom_types, "custom types")?;
        debug!(
            "Built type registry for `{}` at spec version {:?} with {} type(s)",
            registry.spec_name,
            registry.spec_version,
            registry.len()
        );

        Ok(registry)
    }

    fn load_chain(&self, name: &str) -> RegistryResult<Option<(String, ChainTypes)>> {
        let Some(dir) = &self.types_dir else {
            warn!("No types directory configured, using default types for `{}`", name);
            return Ok(None);
        };

        let path = dir.join(format!("{name}.json"));
        if !path.is_file() {
            warn!(
                "There is no types file for `{}` at {}, using default types",
                name,
                path.display()
            );
            return Ok(None);
        }

        let chain = ChainTypes::from_file(&path)?;
        Ok(Some((path.display().to_string(), chain)))
    }
}

#[cfg(test)]
mod tests {
    use scale_types::{CompositeDef, Value};
    use serde_json::json;

    use super::*;
    use crate::testing_utils::{common_setup, TempTypesDir};

    const KUSAMA: &str = r#"{
        "runtime_id": 1020,
        "types": {
            "Weight": "u64",
            "Keys": "(AccountId, AccountId)"
        },
        "versioning": [
            {"runtime_range": [1019, 1031], "types": {"Index": "u64"}},
            {"runtime_range": [1032, null], "types": {"Index": "u16"}},
            {"runtime_range": [1045, null], "types": {"Weight": "u8"}}
        ]
    }"#;

    fn kusama_dir() -> TempTypesDir {
        TempTypesDir::with_file("kusama", KUSAMA)
    }

    #[test]
    fn defaults_resolve() {
        common_setup();
        let registry = TypeRegistry::builder().build().unwrap();

        assert_eq!(registry.spec_name(), DEFAULT_SPEC);
        assert_eq!(registry.spec_version(), None);
        assert!(registry.check_types().is_empty());

        let resolver = registry.into_resolver();
        let phase = resolver.decode_hex("Phase", "0x0002000000").unwrap();
        assert_eq!(
            serde_json::to_value(&phase).unwrap(),
            json!({"ApplyExtrinsic": 2})
        );
        assert_eq!(
            resolver.decode_hex("BlockNumber", "0x01000000").unwrap(),
            Value::UInt(1)
        );
        assert_eq!(
            resolver.decode_hex("WithdrawReasons", "0x0a").unwrap(),
            Value::Set(vec!["Transfer".into(), "Fee".into()])
        );
    }

    #[test]
    fn chain_layer_overrides_defaults() {
        let dir = kusama_dir();
        let registry = TypeRegistry::builder()
            .types_dir(dir.path())
            .spec_name("kusama")
            .build()
            .unwrap();

        assert_eq!(registry.spec_name(), "kusama");
        assert_eq!(registry.spec_version(), Some(1020));
        assert_eq!(registry.get("Weight"), Some(&TypeDefinition::Alias("u64".into())));
        assert_eq!(registry.get("Index"), Some(&TypeDefinition::Alias("u64".into())));
        assert!(registry.get("Keys").is_some());
        // Untouched defaults survive.
        assert_eq!(
            registry.get("Balance"),
            Some(&TypeDefinition::Alias("u128".into()))
        );
    }

    #[test]
    fn versioning_follows_the_spec_version() {
        let dir = kusama_dir();
        let at = |version| {
            TypeRegistry::builder()
                .types_dir(dir.path())
                .spec_name("kusama")
                .spec_version(version)
                .build()
                .unwrap()
        };

        let old = at(1019);
        assert_eq!(old.get("Index"), Some(&TypeDefinition::Alias("u64".into())));
        assert_eq!(old.get("Weight"), Some(&TypeDefinition::Alias("u64".into())));

        let newer = at(1050);
        assert_eq!(newer.get("Index"), Some(&TypeDefinition::Alias("u16".into())));
        assert_eq!(newer.get("Weight"), Some(&TypeDefinition::Alias("u8".into())));

        // Before every range: defaults plus the chain layer only.
        let ancient = at(1);
        assert_eq!(ancient.get("Index"), Some(&TypeDefinition::Alias("u32".into())));
    }

    #[test]
    fn custom_types_win() {
        let dir = kusama_dir();
        let registry = TypeRegistry::builder()
            .types_dir(dir.path())
            .spec_name("kusama")
            .spec_version(1050)
            .custom_types([("Weight".to_owned(), TypeDefinition::Alias("u32".into()))])
            .build()
            .unwrap();

        assert_eq!(registry.get("Weight"), Some(&TypeDefinition::Alias("u32".into())));
    }

    #[test]
    fn missing_chain_falls_back_to_defaults() {
        let dir = kusama_dir();
        let defaults = TypeRegistry::builder().build().unwrap();

        let registry = TypeRegistry::builder()
            .types_dir(dir.path())
            .spec_name("polkadot")
            .build()
            .unwrap();

        assert_eq!(registry.spec_name(), "polkadot");
        assert_eq!(registry.names(), defaults.names());

        let no_dir = TypeRegistry::builder().spec_name("kusama").build().unwrap();
        assert_eq!(no_dir.len(), defaults.len());
    }

    #[test]
    fn malformed_chain_files_are_errors() {
        let dir = TempTypesDir::with_file("broken", r#"{"types": {"Weight": 5}}"#);

        let err = TypeRegistry::builder()
            .types_dir(dir.path())
            .spec_name("broken")
            .build()
            .unwrap_err();

        match err {
            RegistryError::Json { source, .. } => {
                assert_eq!(source.path().to_string(), "types.Weight")
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn keys_are_canonicalised() {
        let registry = TypeRegistry::builder()
            .custom_types([
                (
                    "<T as Trait>::Moment".to_owned(),
                    TypeDefinition::Alias("u32".into()),
                ),
                ("Foo".to_owned(), TypeDefinition::Alias("Foo".into())),
            ])
            .build()
            .unwrap();

        assert_eq!(registry.get("Moment"), Some(&TypeDefinition::Alias("u32".into())));
        assert_eq!(registry.get("Foo"), None);
    }

    #[test]
    fn invalid_names_are_rejected() {
        let err = TypeRegistry::builder()
            .custom_types([("Vec<".to_owned(), TypeDefinition::Alias("u8".into()))])
            .build()
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidName { name, .. } if name == "Vec<"));
    }

    #[test]
    fn check_types_reports_failures() {
        let registry = TypeRegistry::builder()
            .custom_types([
                ("Broken".to_owned(), TypeDefinition::Alias("Nope".into())),
                (
                    "Twice".to_owned(),
                    TypeDefinition::Composite(CompositeDef::Struct {
                        type_mapping: vec![
                            ("a".into(), "u8".into()),
                            ("a".into(), "u8".into()),
                        ],
                    }),
                ),
            ])
            .build()
            .unwrap();

        let failures = registry.check_types();
        let names: Vec<_> = failures.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Broken", "Twice"]);
        assert!(matches!(failures[0].1, CodecError::UnresolvableType { .. }));
        assert!(matches!(failures[1].1, CodecError::InvalidDefinition { .. }));
    }

    #[test]
    fn runtime_ranges() {
        let open = VersionedTypes {
            runtime_range: (10, None),
            types: BTreeMap::new(),
        };
        let closed = VersionedTypes {
            runtime_range: (10, Some(12)),
            ..open.clone()
        };

        assert!(!open.applies_to(9));
        assert!(open.applies_to(10) && open.applies_to(u32::MAX));
        assert!(closed.applies_to(12));
        assert!(!closed.applies_to(13));
    }

    #[test]
    fn dictionaries_read_from_files() {
        let dir = kusama_dir();
        let chain = ChainTypes::from_file(&dir.path().join("kusama.json")).unwrap();
        assert_eq!(chain, ChainTypes::from_json_str(KUSAMA, "inline").unwrap());

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ChainTypes::from_file(&missing),
            Err(RegistryError::Io { path, .. }) if path == missing
        ));
    }
}
