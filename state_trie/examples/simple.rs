//! Simple example showing off the basics of the library.

use state_trie::{
    hashing::blake2_256, ChildRef, ProofError, ProofResult, StorageProof, TrieNode, TrieNodeType,
};

fn main() -> ProofResult<()> {
    // Nodes are built from their nibble paths and values:
    let balance = TrieNode::leaf(&[0xa, 0xb, 0xc], 1_000u64.to_le_bytes());
    let code = TrieNode::leaf(&[0xe], vec![0x60; 100]);

    // A branch refers to small children inline and to large ones by digest:
    let balance_ref = ChildRef::for_encoded(balance.encode());
    let code_ref = ChildRef::for_encoded(code.encode());
    assert!(balance_ref.is_inline());
    assert!(code_ref.is_hash());

    let root = TrieNode::branch(&[0x1, 0x2], None, [(0x3, balance_ref), (0xd, code_ref)]);
    assert_eq!(root.node_type(), TrieNodeType::Branch);

    // Encodings decode back to the same node:
    let encoded_root = root.encode();
    assert_eq!(TrieNode::decode(&encoded_root)?, root);

    // A proof is the set of encoded nodes visited on the way to a key. Inline
    // children travel inside their parent, so only two nodes are needed here:
    let root_hash = blake2_256(&encoded_root);
    let proof = StorageProof::new([encoded_root, code.encode()])?;
    assert_eq!(proof.len(), 2);

    // Keys are looked up nibble by nibble from the trusted root:
    assert_eq!(
        proof.verify(root_hash, &[0x12, 0x3a, 0xbc])?,
        1_000u64.to_le_bytes()
    );
    assert_eq!(proof.verify(root_hash, &[0x12, 0xde])?, vec![0x60; 100]);

    // Failures say where the walk stopped:
    assert_eq!(
        proof.verify(root_hash, &[0x12, 0x3a, 0xbd]),
        Err(ProofError::KeyMismatch { offset: 3 })
    );
    assert_eq!(
        proof.verify(root_hash, &[0x12, 0x4a]),
        Err(ProofError::NoSuchChild {
            nibble: 4,
            offset: 2
        })
    );

    Ok(())
}
