use std::{io, path::PathBuf};

use scale_types::CodecError;
use thiserror::Error;

/// Stores the result of registry construction. Returns a [`RegistryError`]
/// upon failure.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// An error encountered while loading type dictionaries.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A dictionary file could not be read.
    #[error("Failed to read type dictionary {path}: {source}")]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A dictionary is not valid JSON, or not in the expected shape.
    #[error("Malformed type dictionary {origin}: {source}")]
    Json {
        /// Where the dictionary came from.
        origin: String,
        /// The error, with the JSON path at which it occurred.
        source: serde_path_to_error::Error<serde_json::Error>,
    },

    /// A dictionary key is not a valid type expression.
    #[error("Invalid type name `{name}` in {origin}: {source}")]
    InvalidName {
        /// The key as written.
        name: String,
        /// Where the dictionary came from.
        origin: String,
        /// Why it could not be parsed.
        source: CodecError,
    },
}

/// Stores the result of metadata decoding. Returns a [`MetadataError`] upon
/// failure.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// An error encountered while decoding runtime metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The blob does not start with the `meta` magic number.
    #[error("Bad metadata magic number {0:#010x}")]
    BadMagic(u32),

    /// The metadata version is not one this decoder understands.
    #[error("Unsupported metadata version {0}")]
    UnsupportedVersion(u8),

    /// The blob does not decode as metadata.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The metadata type dictionary could not be loaded.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A decoded module does not have the expected shape.
    #[error("Unexpected metadata layout: {0}")]
    Layout(#[from] serde_json::Error),
}
