//! Storage proof verification.
//!
//! A proof is an unordered set of encoded trie nodes. Verification walks
//! from the root digest down the key, one node per step, looking each hashed
//! child up in the proof by its digest.

use std::{borrow::Cow, collections::HashMap};

use ethereum_types::H256;
use log::trace;
use scale_common::FromHexError;
use thiserror::Error;

use crate::{
    hashing::blake2_256,
    nibbles::{KeyNibbles, Nibble},
    node::{ChildRef, NodeDecodeError, NodeDecodeResult, TrieNode},
};

/// Stores the result of proof verification. Returns a [`ProofError`] upon
/// failure.
pub type ProofResult<T> = Result<T, ProofError>;

/// An error encountered while verifying a storage proof.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProofError {
    /// A proof node could not be decoded.
    #[error(transparent)]
    Node(#[from] NodeDecodeError),

    /// The walk reached a digest that no proof node hashes to.
    #[error("Node {0:?} is missing from the proof")]
    ProofNodeMissing(H256),

    /// The key diverges from a node's partial key.
    #[error("Key diverges from the trie path at nibble {offset}")]
    KeyMismatch {
        /// Nibbles of the key consumed before the divergent node.
        offset: usize,
    },

    /// The branch slot selected by the key is empty.
    #[error("Branch has no child at nibble {nibble:x} (key nibble {offset})")]
    NoSuchChild {
        /// The selecting nibble.
        nibble: Nibble,
        /// Its position in the key.
        offset: usize,
    },

    /// The key ends at a node that holds no value.
    #[error("The key ends at a node without a value")]
    ValueAbsent,

    /// Malformed hex at the outer boundary.
    #[error("Invalid hex input: {0}")]
    Hex(#[from] FromHexError),
}

/// Proof nodes indexed by the digest of their encoding.
#[derive(Clone, Debug, Default)]
pub struct StorageProof {
    nodes: HashMap<H256, TrieNode>,
}

impl StorageProof {
    /// Decodes every encoded node and indexes it by its digest.
    pub fn new<I, B>(encoded_nodes: I) -> NodeDecodeResult<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let nodes = encoded_nodes
            .into_iter()
            .map(|bytes| {
                let bytes = bytes.as_ref();
                Ok((blake2_256(bytes), TrieNode::decode(bytes)?))
            })
            .collect::<NodeDecodeResult<_>>()?;

        Ok(Self { nodes })
    }

    /// [`StorageProof::new`] over `0x`-prefixed (or bare) hex strings.
    pub fn from_hex<I, S>(encoded_nodes: I) -> ProofResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nodes = encoded_nodes
            .into_iter()
            .map(|s| scale_common::hex_to_bytes(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(nodes)?)
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the proof holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node whose encoding hashes to `hash`.
    pub fn get(&self, hash: &H256) -> Option<&TrieNode> {
        self.nodes.get(hash)
    }

    /// Looks `key` up in the trie with root `root`, using only the nodes in
    /// this proof, and returns the value stored there.
    ///
    /// Every step either ends the walk or consumes at least one key nibble,
    /// so verification terminates even on proofs with cyclic references.
    pub fn verify(&self, root: H256, key: &[u8]) -> ProofResult<Vec<u8>> {
        let mut key = KeyNibbles::new(key);
        let mut node = Cow::Borrowed(self.lookup(root)?);

        loop {
            trace!(
                "Visiting {} node at key nibble {}",
                node.node_type(),
                key.offset()
            );

            let next = match node.as_ref() {
                TrieNode::Empty => return Err(ProofError::ValueAbsent),
                TrieNode::Leaf { partial_key, value } => {
                    let offset = key.offset();
                    if !key.consume_prefix(partial_key) || !key.is_empty() {
                        return Err(ProofError::KeyMismatch { offset });
                    }

                    return Ok(value.clone());
                }
                TrieNode::Branch {
                    partial_key,
                    value,
                    children,
                } => {
                    if !key.consume_prefix(partial_key) {
                        return Err(ProofError::KeyMismatch {
                            offset: key.offset(),
                        });
                    }

                    let offset = key.offset();
                    let Some(nibble) = key.next_nibble() else {
                        return value.clone().ok_or(ProofError::ValueAbsent);
                    };

                    match &children[usize::from(nibble)] {
                        None => return Err(ProofError::NoSuchChild { nibble, offset }),
                        Some(ChildRef::Hash(hash)) => Cow::Borrowed(self.lookup(*hash)?),
                        Some(ChildRef::Inline(bytes)) => Cow::Owned(TrieNode::decode(bytes)?),
                    }
                }
            };

            node = next;
        }
    }

    fn lookup(&self, hash: H256) -> ProofResult<&TrieNode> {
        self.nodes
            .get(&hash)
            .ok_or(ProofError::ProofNodeMissing(hash))
    }
}
