//! The trie's single digest function.

use blake2::{digest::consts::U32, Blake2b, Digest};
use ethereum_types::H256;

type Blake2b256 = Blake2b<U32>;

/// Length in bytes of a node digest.
pub const HASH_LEN: usize = 32;

/// BLAKE2b with a 256-bit output, over the full encoding of a node.
pub fn blake2_256(bytes: &[u8]) -> H256 {
    H256::from_slice(Blake2b256::digest(bytes).as_slice())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn hashes_the_empty_input() {
        assert_eq!(
            blake2_256(&[]),
            H256(hex!(
                "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
            ))
        );
    }
}
