use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};
use scale_types::{Resolver, TypeDefinition};
use type_registry::TypeRegistry;

use crate::commands::read_json;

const REGISTRY_HELP_HEADING: &str = "Type registry options";

/// Decode and encode SCALE values, and verify storage proofs.
#[derive(Parser)]
#[command(version, propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,

    #[clap(flatten)]
    pub(crate) registry: RegistryArgs,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Decodes hex input as the given type and prints it as JSON.
    Decode {
        /// The type expression, e.g. `Vec<(AccountId, Balance)>`.
        #[arg(value_name = "TYPE")]
        type_expr: String,
        /// The encoded value, with or without a `0x` prefix.
        hex: String,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Encodes a JSON value as the given type and prints it as hex.
    Encode {
        /// The type expression.
        #[arg(value_name = "TYPE")]
        type_expr: String,
        /// The value, e.g. `{"nonce": 1, "data": {...}}`.
        json: String,
    },
    /// Verifies a storage proof against a trusted state root and prints the
    /// proven value.
    Verify {
        /// The state root, as 32 hex-encoded bytes.
        #[arg(short, long)]
        root: String,
        /// The storage key, hex-encoded.
        #[arg(short, long)]
        key: String,
        /// A hex-encoded proof node. May be repeated.
        #[arg(
            short,
            long = "proof",
            required_unless_present = "proof_file",
            conflicts_with = "proof_file"
        )]
        proof: Vec<String>,
        /// A JSON file holding an array of hex-encoded proof nodes.
        #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
        proof_file: Option<PathBuf>,
    },
    /// Resolves every registered type and reports the ones that fail.
    CheckTypes,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RegistryArgs {
    /// The chain whose type dictionary is layered over the defaults.
    #[arg(long, global = true, env = "SCALE_CHAIN", help_heading = REGISTRY_HELP_HEADING)]
    pub(crate) chain: Option<String>,
    /// The directory holding `<chain>.json` type dictionaries.
    #[arg(long, global = true, env = "SCALE_TYPES_DIR", value_hint = ValueHint::DirPath, help_heading = REGISTRY_HELP_HEADING)]
    pub(crate) types_dir: Option<PathBuf>,
    /// The runtime spec version whose type overrides apply.
    #[arg(long, global = true, env = "SCALE_SPEC_VERSION", help_heading = REGISTRY_HELP_HEADING)]
    pub(crate) spec_version: Option<u32>,
    /// A JSON file of custom type definitions, applied last.
    #[arg(long, global = true, env = "SCALE_CUSTOM_TYPES", value_hint = ValueHint::FilePath, help_heading = REGISTRY_HELP_HEADING)]
    pub(crate) custom_types: Option<PathBuf>,
    /// Reject compact integers that are not in their shortest encoding.
    #[arg(long, global = true, help_heading = REGISTRY_HELP_HEADING)]
    pub(crate) strict: bool,
}

impl RegistryArgs {
    pub(crate) fn registry(&self) -> Result<TypeRegistry> {
        let mut builder = TypeRegistry::builder();

        if let Some(chain) = &self.chain {
            builder = builder.spec_name(chain);
        }
        if let Some(dir) = &self.types_dir {
            builder = builder.types_dir(dir);
        }
        if let Some(version) = self.spec_version {
            builder = builder.spec_version(version);
        }
        if let Some(path) = &self.custom_types {
            let types: BTreeMap<String, TypeDefinition> =
                read_json(path).context("Failed to load custom types")?;
            builder = builder.custom_types(types);
        }

        builder.build().context("Failed to load type registry")
    }

    pub(crate) fn resolver(&self) -> Result<Resolver> {
        Ok(self
            .registry()?
            .into_resolver()
            .with_strict_compact(self.strict))
    }
}
