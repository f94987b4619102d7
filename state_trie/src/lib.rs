//! Decoding and proof verification for substrate-style state tries.
//!
//! Nodes are SCALE-framed and addressed by the blake2b-256 digest of their
//! encoding. A branch refers to each child either by that digest or, when the
//! child's encoding is shorter than a digest, by embedding it directly.
//!
//! The entry point is [`StorageProof`]: build it from the encoded nodes a full
//! node returned for a storage query, then [`verify`](StorageProof::verify) a
//! key against a trusted state root. Nothing outside the proof is trusted, so a
//! successful verification proves the value is committed to by that root.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod hashing;
pub mod nibbles;
pub mod node;
pub mod proof;

#[cfg(test)]
pub(crate) mod testing_utils;

use ethereum_types::H256;
pub use node::{ChildRef, DecodedNode, NodeDecodeError, TrieNode, TrieNodeType};
pub use proof::{ProofError, ProofResult, StorageProof};

/// Verifies a storage proof given entirely as hex strings and returns the
/// proven value as `0x`-prefixed hex.
pub fn verify_storage_proof<I, S>(root: &str, proof: I, key: &str) -> ProofResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let root = H256(scale_common::hex_to_array::<32>(root)?);
    let key = scale_common::hex_to_bytes(key)?;
    let value = StorageProof::from_hex(proof)?.verify(root, &key)?;

    Ok(scale_common::bytes_to_hex(&value))
}
