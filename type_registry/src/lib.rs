//! Type dictionaries for the SCALE resolver.
//!
//! A [`TypeRegistry`] maps the names a runtime uses (`Balance`, `AccountInfo`,
//! `Phase`, ...) to the definitions a [`Resolver`](scale_types::Resolver)
//! needs to build codecs for them. It merges the bundled defaults with a
//! chain's own dictionary, that dictionary's per-version overrides and the
//! caller's custom types:
//!
//! ```no_run
//! use type_registry::TypeRegistry;
//!
//! let resolver = TypeRegistry::builder()
//!     .types_dir("types")
//!     .spec_name("kusama")
//!     .spec_version(1045)
//!     .build()
//!     .unwrap()
//!     .into_resolver();
//!
//! let info = resolver.decode_hex("AccountInfo", "0x...").unwrap();
//! ```
//!
//! [`MetadataV1`] decodes version 1 runtime metadata through the same
//! machinery.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

mod error;
pub mod metadata;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing_utils;

pub use error::{MetadataError, MetadataResult, RegistryError, RegistryResult};
pub use metadata::MetadataV1;
pub use registry::{ChainTypes, TypeRegistry, TypeRegistryBuilder, VersionedTypes, DEFAULT_SPEC};
