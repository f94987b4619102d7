use std::{fs::File, io::Write, path::Path};

use anyhow::{bail, Context, Result};
use scale_types::Value;
use serde::de::DeserializeOwned;
use serde_json::Deserializer;
use tracing::{error, info};

use crate::cli::{Command, RegistryArgs};

pub(crate) fn run(command: Command, registry: &RegistryArgs, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Decode {
            type_expr,
            hex,
            pretty,
        } => {
            let value = registry
                .resolver()?
                .decode_hex(&type_expr, &hex)
                .with_context(|| format!("Failed to decode `{type_expr}`"))?;

            let json = match pretty {
                true => serde_json::to_string_pretty(&value)?,
                false => serde_json::to_string(&value)?,
            };
            writeln!(out, "{json}")?;
        }
        Command::Encode { type_expr, json } => {
            let des = &mut Deserializer::from_str(&json);
            let value: Value = serde_path_to_error::deserialize(des).context("Invalid JSON value")?;

            let hex = registry
                .resolver()?
                .encode_hex(&type_expr, &value)
                .with_context(|| format!("Failed to encode `{type_expr}`"))?;
            writeln!(out, "{hex}")?;
        }
        Command::Verify {
            root,
            key,
            proof,
            proof_file,
        } => {
            let proof = match proof_file {
                Some(path) => read_json::<Vec<String>>(&path).context("Failed to load proof")?,
                None => proof,
            };

            info!(
                "Verifying key {} against root {} with {} proof node(s)",
                key,
                root,
                proof.len()
            );
            let value = state_trie::verify_storage_proof(&root, &proof, &key)
                .context("Storage proof verification failed")?;
            writeln!(out, "{value}")?;
        }
        Command::CheckTypes => {
            let registry = registry.registry()?;
            let failures = registry.check_types();

            for (name, e) in &failures {
                error!("{name}: {e}");
                writeln!(out, "[[ERROR]] {name}: {e}")?;
            }

            if !failures.is_empty() {
                bail!(
                    "{} of {} type(s) in `{}` failed to resolve",
                    failures.len(),
                    registry.len(),
                    registry.spec_name()
                );
            }
            info!(
                "All {} type(s) in `{}` resolved",
                registry.len(),
                registry.spec_name()
            );
        }
    }

    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let des = &mut Deserializer::from_reader(&file);

    Ok(serde_path_to_error::deserialize(des)?)
}
