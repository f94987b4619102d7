//! The binary format of a single trie node.
//!
//! ```text
//! node      := 0x00                                  (empty)
//!            | header partial value                  (leaf,   header 0b01xxxxxx)
//!            | header partial bitmap children        (branch, header 0b10xxxxxx)
//!            | header partial value bitmap children  (branch with value, 0b11xxxxxx)
//! header    := kind(2 bits) count(6 bits) [continuation bytes]
//! partial   := ceil(count / 2) bytes, zero padding nibble first when count is odd
//! value     := compact length, bytes
//! bitmap    := u16 little-endian, bit i set when child i is present
//! children  := (compact length, bytes) for each present child, in order
//! ```
//!
//! A child of exactly 32 bytes is the digest of another node. Anything else
//! is a node embedded inline.

use std::fmt::{self, Display};

use enum_as_inner::EnumAsInner;
use ethereum_types::H256;
use scale_types::{
    compact::{decode_compact_len, encode_compact_len},
    CodecError, Cursor,
};
use thiserror::Error;

use crate::{
    hashing::{blake2_256, HASH_LEN},
    nibbles::{Nibble, PartialKey, MAX_PARTIAL_KEY_NIBBLES, NIBBLES_PER_BYTE},
};

/// Number of children of a branch.
pub const BRANCH_WIDTH: usize = 16;

const EMPTY_NODE: u8 = 0x00;
const KIND_MASK: u8 = 0b11 << 6;
const LEAF: u8 = 0b01 << 6;
const BRANCH_WITHOUT_VALUE: u8 = 0b10 << 6;
const BRANCH_WITH_VALUE: u8 = 0b11 << 6;
const COUNT_MASK: u8 = !KIND_MASK;

/// A header nibble count at this value continues in the following bytes.
const COUNT_CONTINUES: usize = COUNT_MASK as usize;
const CONTINUATION_MAX: u8 = u8::MAX;

/// Stores the result of node decoding. Returns a [`NodeDecodeError`] upon
/// failure.
pub type NodeDecodeResult<T> = Result<T, NodeDecodeError>;

/// An error encountered while decoding a trie node.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NodeDecodeError {
    /// The node buffer ended early, or a length prefix was invalid.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The header or partial key violates the node format.
    #[error("Malformed trie node: {0}")]
    MalformedTrieNode(String),
}

/// A reference from a branch to one of its children.
#[derive(Clone, Debug, EnumAsInner, Eq, Hash, PartialEq)]
pub enum ChildRef {
    /// The digest of a node stored elsewhere.
    Hash(H256),
    /// A node encoding embedded in the branch.
    Inline(Vec<u8>),
}

impl ChildRef {
    /// The reference a branch stores for a child with this encoding: inline
    /// when shorter than a digest, otherwise the digest.
    pub fn for_encoded(encoded: Vec<u8>) -> Self {
        match encoded.len() < HASH_LEN {
            true => ChildRef::Inline(encoded),
            false => ChildRef::Hash(blake2_256(&encoded)),
        }
    }
}

/// The children of a branch, indexed by nibble.
pub type Children = [Option<ChildRef>; BRANCH_WIDTH];

/// A decoded trie node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TrieNode {
    /// The empty trie.
    Empty,
    /// A node holding a value at the end of its partial key.
    Leaf {
        /// Key nibbles between the parent and the value.
        partial_key: PartialKey,
        /// The stored value.
        value: Vec<u8>,
    },
    /// A node with up to sixteen children, optionally holding a value itself.
    Branch {
        /// Key nibbles between the parent and this branch.
        partial_key: PartialKey,
        /// Value stored at this branch's own key, if any.
        value: Option<Vec<u8>>,
        /// Children indexed by the next key nibble.
        children: Box<Children>,
    },
}

/// Simplified trie node type to make logging cleaner.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TrieNodeType {
    /// Empty node.
    Empty,

    /// Leaf node.
    Leaf,

    /// Branch node.
    Branch,
}

impl From<&TrieNode> for TrieNodeType {
    fn from(node: &TrieNode) -> Self {
        match node {
            TrieNode::Empty => Self::Empty,
            TrieNode::Leaf { .. } => Self::Leaf,
            TrieNode::Branch { .. } => Self::Branch,
        }
    }
}

impl Display for TrieNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrieNodeType::Empty => "Empty",
            TrieNodeType::Leaf => "Leaf",
            TrieNodeType::Branch => "Branch",
        };

        write!(f, "{}", s)
    }
}

impl TrieNode {
    /// Decodes a node from the start of `bytes`. Bytes after the node are
    /// ignored.
    pub fn decode(bytes: &[u8]) -> NodeDecodeResult<Self> {
        Self::decode_from(&mut Cursor::new(bytes))
    }

    /// Decodes a node at the cursor. On failure the cursor is left where it
    /// was.
    pub fn decode_from(cursor: &mut Cursor<'_>) -> NodeDecodeResult<Self> {
        let start = cursor.checkpoint();
        let res = decode_intern(cursor);
        if res.is_err() {
            cursor.reset(start);
        }

        res
    }

    /// Encodes the node. Inverse of [`TrieNode::decode`].
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();

        match self {
            TrieNode::Empty => out.push(EMPTY_NODE),
            TrieNode::Leaf { partial_key, value } => {
                encode_header(LEAF, partial_key, &mut out);
                encode_blob(value, &mut out);
            }
            TrieNode::Branch {
                partial_key,
                value,
                children,
            } => {
                let kind = match value {
                    Some(_) => BRANCH_WITH_VALUE,
                    None => BRANCH_WITHOUT_VALUE,
                };
                encode_header(kind, partial_key, &mut out);
                if let Some(value) = value {
                    encode_blob(value, &mut out);
                }

                let bitmap = children
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.is_some())
                    .fold(0u16, |acc, (i, _)| acc | (1 << i));
                out.extend_from_slice(&bitmap.to_le_bytes());

                for child in children.iter().flatten() {
                    match child {
                        ChildRef::Hash(h) => encode_blob(h.as_bytes(), &mut out),
                        ChildRef::Inline(bytes) => encode_blob(bytes, &mut out),
                    }
                }
            }
        }

        out
    }

    /// A leaf.
    pub fn leaf(partial_key: &[Nibble], value: impl Into<Vec<u8>>) -> Self {
        TrieNode::Leaf {
            partial_key: PartialKey::from_nibbles(partial_key),
            value: value.into(),
        }
    }

    /// A branch with the given `(nibble, child)` pairs.
    pub fn branch(
        partial_key: &[Nibble],
        value: Option<Vec<u8>>,
        children: impl IntoIterator<Item = (Nibble, ChildRef)>,
    ) -> Self {
        let mut slots: Box<Children> = Box::default();
        for (nibble, child) in children {
            slots[usize::from(nibble) % BRANCH_WIDTH] = Some(child);
        }

        TrieNode::Branch {
            partial_key: PartialKey::from_nibbles(partial_key),
            value,
            children: slots,
        }
    }

    /// The kind of node.
    pub fn node_type(&self) -> TrieNodeType {
        self.into()
    }

    /// The node's partial key. `None` for [`TrieNode::Empty`].
    pub fn partial_key(&self) -> Option<&PartialKey> {
        match self {
            TrieNode::Empty => None,
            TrieNode::Leaf { partial_key, .. } | TrieNode::Branch { partial_key, .. } => {
                Some(partial_key)
            }
        }
    }

    /// The value stored at this node, if any.
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            TrieNode::Leaf { value, .. } => Some(value),
            TrieNode::Branch { value, .. } => value.as_deref(),
            TrieNode::Empty => None,
        }
    }

    /// The child at `nibble`, for branches.
    pub fn child(&self, nibble: Nibble) -> Option<&ChildRef> {
        match self {
            TrieNode::Branch { children, .. } => children.get(usize::from(nibble))?.as_ref(),
            _ => None,
        }
    }
}

/// A node together with the digest of the buffer it was decoded from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedNode {
    /// Digest of the whole input buffer.
    pub hash: H256,
    /// The decoded node.
    pub node: TrieNode,
}

impl DecodedNode {
    /// Decodes `bytes` and records its digest.
    pub fn decode(bytes: &[u8]) -> NodeDecodeResult<Self> {
        Ok(Self {
            hash: blake2_256(bytes),
            node: TrieNode::decode(bytes)?,
        })
    }
}

fn decode_intern(cursor: &mut Cursor<'_>) -> NodeDecodeResult<TrieNode> {
    let first = cursor.read_byte()?;
    if first == EMPTY_NODE {
        return Ok(TrieNode::Empty);
    }

    let kind = first & KIND_MASK;
    if !matches!(kind, LEAF | BRANCH_WITHOUT_VALUE | BRANCH_WITH_VALUE) {
        return Err(NodeDecodeError::MalformedTrieNode(format!(
            "unsupported header {first:#04x}"
        )));
    }

    let count = decode_nibble_count(first, cursor)?;
    let partial_key = decode_partial_key(count, cursor)?;

    if kind == LEAF {
        return Ok(TrieNode::Leaf {
            partial_key,
            value: decode_blob(cursor)?,
        });
    }

    let value = match kind {
        BRANCH_WITH_VALUE => Some(decode_blob(cursor)?),
        _ => None,
    };

    let bitmap = u16::from_le_bytes(cursor.read_array()?);
    let mut children: Box<Children> = Box::default();
    for (i, slot) in children.iter_mut().enumerate() {
        if bitmap & (1 << i) == 0 {
            continue;
        }

        let len = decode_compact_len(cursor)?;
        let bytes = cursor.read_bytes(len)?;
        *slot = Some(match len {
            HASH_LEN => ChildRef::Hash(H256::from_slice(bytes)),
            _ => ChildRef::Inline(bytes.to_vec()),
        });
    }

    Ok(TrieNode::Branch {
        partial_key,
        value,
        children,
    })
}

/// Counts below 63 fit in the header. Otherwise each following byte adds its
/// value, and a byte below 255 ends the count. Counts past
/// [`MAX_PARTIAL_KEY_NIBBLES`] are capped rather than rejected.
fn decode_nibble_count(first: u8, cursor: &mut Cursor<'_>) -> NodeDecodeResult<usize> {
    let mut count = usize::from(first & COUNT_MASK);
    if count < COUNT_CONTINUES {
        return Ok(count);
    }

    while count <= MAX_PARTIAL_KEY_NIBBLES {
        let n = cursor.read_byte()?;
        count += usize::from(n);
        if n < CONTINUATION_MAX {
            return Ok(count.min(MAX_PARTIAL_KEY_NIBBLES));
        }
    }

    Ok(MAX_PARTIAL_KEY_NIBBLES)
}

fn decode_partial_key(count: usize, cursor: &mut Cursor<'_>) -> NodeDecodeResult<PartialKey> {
    let bytes = cursor.read_bytes(count.div_ceil(NIBBLES_PER_BYTE))?;

    let padded = count % NIBBLES_PER_BYTE != 0;
    if padded && bytes[0] & 0xf0 != 0 {
        return Err(NodeDecodeError::MalformedTrieNode(format!(
            "padding nibble of odd partial key is {:#x}, not zero",
            bytes[0] >> 4
        )));
    }

    Ok(PartialKey::from_packed(bytes.to_vec(), count))
}

fn decode_blob(cursor: &mut Cursor<'_>) -> NodeDecodeResult<Vec<u8>> {
    let len = decode_compact_len(cursor)?;
    Ok(cursor.read_bytes(len)?.to_vec())
}

fn encode_header(kind: u8, partial_key: &PartialKey, out: &mut Vec<u8>) {
    let count = partial_key.len();
    if count < COUNT_CONTINUES {
        out.push(kind | count as u8);
    } else {
        out.push(kind | COUNT_MASK);
        let mut rest = count - COUNT_CONTINUES;
        while rest >= usize::from(CONTINUATION_MAX) {
            out.push(CONTINUATION_MAX);
            rest -= usize::from(CONTINUATION_MAX);
        }
        out.push(rest as u8);
    }

    out.extend_from_slice(partial_key.packed());
}

fn encode_blob(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact_len(bytes.len(), out);
    out.extend_from_slice(bytes);
}
