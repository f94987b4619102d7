use ethereum_types::H256;

use crate::{
    hashing::blake2_256,
    node::{ChildRef, TrieNode},
    proof::StorageProof,
};

pub(crate) fn common_setup() {
    // Try init since multiple tests calling `init` will cause an error.
    let _ = pretty_env_logger::try_init();
}

/// A two-level trie:
///
/// ```text
/// branch [1, 2] (value BRANCH_VALUE)
/// ├── 3: hashed leaf [4, 5, 6, 7, 8]
/// └── 9: inline leaf [0, 0, 0, 0, 0]
/// ```
pub(crate) struct TestTrie {
    pub(crate) root: H256,
    pub(crate) root_node: Vec<u8>,
    pub(crate) hashed_leaf: H256,
    pub(crate) hashed_leaf_node: Vec<u8>,
}

impl TestTrie {
    pub(crate) const HASHED_KEY: [u8; 4] = [0x12, 0x34, 0x56, 0x78];
    pub(crate) const INLINE_KEY: [u8; 4] = [0x12, 0x90, 0x00, 0x00];
    pub(crate) const BRANCH_KEY: [u8; 1] = [0x12];

    pub(crate) const INLINE_VALUE: &'static [u8] = b"inline";
    pub(crate) const BRANCH_VALUE: &'static [u8] = b"branch";

    /// Long enough that the leaf cannot be inlined.
    pub(crate) fn hashed_value() -> Vec<u8> {
        vec![0xaa; 40]
    }

    pub(crate) fn new() -> Self {
        let hashed_leaf_node = TrieNode::leaf(&[4, 5, 6, 7, 8], Self::hashed_value()).encode();
        let inline_leaf_node = TrieNode::leaf(&[0, 0, 0, 0, 0], Self::INLINE_VALUE).encode();

        let hashed_ref = ChildRef::for_encoded(hashed_leaf_node.clone());
        let inline_ref = ChildRef::for_encoded(inline_leaf_node);
        assert!(hashed_ref.is_hash());
        assert!(inline_ref.is_inline());

        let root_node = TrieNode::branch(
            &[1, 2],
            Some(Self::BRANCH_VALUE.to_vec()),
            [(3, hashed_ref), (9, inline_ref)],
        )
        .encode();

        Self {
            root: blake2_256(&root_node),
            hashed_leaf: blake2_256(&hashed_leaf_node),
            root_node,
            hashed_leaf_node,
        }
    }

    pub(crate) fn proof(&self) -> StorageProof {
        StorageProof::new([&self.root_node, &self.hashed_leaf_node]).unwrap()
    }
}
