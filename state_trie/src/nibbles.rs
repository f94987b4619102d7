//! Nibble-level views over trie partial keys and lookup keys.

use std::fmt::{self, Display};

/// A Nibble has 4 bits and is stored as `u8`.
pub type Nibble = u8;

/// Number of nibbles packed into one byte.
pub const NIBBLES_PER_BYTE: usize = 2;

/// Largest nibble count a node header can express.
pub const MAX_PARTIAL_KEY_NIBBLES: usize = 65535;

/// The partial key stored in a leaf or branch node.
///
/// Stored as in the node encoding: nibbles packed two per byte, and when the
/// count is odd the unused upper half of the first byte is zero.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PartialKey {
    bytes: Vec<u8>,
    count: usize,
}

impl PartialKey {
    /// Wraps packed key bytes holding `count` nibbles. `bytes` must be
    /// exactly `ceil(count / 2)` long with a zero padding nibble when `count`
    /// is odd, which the node decoder checks before calling this.
    pub(crate) fn from_packed(bytes: Vec<u8>, count: usize) -> Self {
        debug_assert_eq!(bytes.len(), count.div_ceil(NIBBLES_PER_BYTE));
        Self { bytes, count }
    }

    /// Packs a nibble sequence. Every nibble must be below 16.
    pub fn from_nibbles(nibbles: &[Nibble]) -> Self {
        let padded = nibbles.len() % NIBBLES_PER_BYTE != 0;
        let bytes = padded
            .then_some(0)
            .into_iter()
            .chain(nibbles.iter().copied())
            .collect::<Vec<_>>()
            .chunks(NIBBLES_PER_BYTE)
            .map(|pair| (pair[0] << 4) | (pair[1] & 0x0f))
            .collect();

        Self {
            bytes,
            count: nibbles.len(),
        }
    }

    /// Number of nibbles.
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` if the key has no nibbles.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` if the nibble count is odd, ie. the first byte is padded.
    pub fn is_padded(&self) -> bool {
        self.count % NIBBLES_PER_BYTE != 0
    }

    /// The packed bytes, as they appear in the node encoding.
    pub fn packed(&self) -> &[u8] {
        &self.bytes
    }

    /// The `i`-th nibble.
    pub fn nibble(&self, i: usize) -> Option<Nibble> {
        (i < self.count).then(|| nibble_at(&self.bytes, i + usize::from(self.is_padded())))
    }

    /// Iterates over the nibbles in order.
    pub fn iter(&self) -> impl Iterator<Item = Nibble> + '_ {
        (0..self.count).filter_map(|i| self.nibble(i))
    }
}

/// Renders the nibbles as hex digits, without the padding nibble.
impl Display for PartialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|n| write!(f, "{n:x}"))
    }
}

fn nibble_at(bytes: &[u8], i: usize) -> Nibble {
    let b = bytes[i / NIBBLES_PER_BYTE];
    match i % NIBBLES_PER_BYTE {
        0 => b >> 4,
        _ => b & 0x0f,
    }
}

/// A cursor over the nibbles of a lookup key.
///
/// The verifier advances it through each node's partial key and the child
/// index below it. It never moves backwards.
#[derive(Clone, Debug)]
pub struct KeyNibbles<'a> {
    key: &'a [u8],
    offset: usize,
}

impl<'a> KeyNibbles<'a> {
    /// Starts at the first nibble of `key`.
    pub fn new(key: &'a [u8]) -> Self {
        Self { key, offset: 0 }
    }

    /// Nibbles consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Nibbles left.
    pub fn remaining(&self) -> usize {
        self.key.len() * NIBBLES_PER_BYTE - self.offset
    }

    /// `true` once every nibble has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes one nibble.
    pub fn next_nibble(&mut self) -> Option<Nibble> {
        if self.is_empty() {
            return None;
        }

        let n = nibble_at(self.key, self.offset);
        self.offset += 1;
        Some(n)
    }

    /// Consumes `prefix` if the key continues with exactly those nibbles.
    /// Leaves the cursor untouched and returns `false` otherwise.
    pub fn consume_prefix(&mut self, prefix: &PartialKey) -> bool {
        let matches = prefix.len() <= self.remaining()
            && prefix
                .iter()
                .enumerate()
                .all(|(i, n)| nibble_at(self.key, self.offset + i) == n);

        if matches {
            self.offset += prefix.len();
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_odd_keys_with_leading_padding() {
        let key = PartialKey::from_nibbles(&[0x1, 0x2, 0x3]);

        assert_eq!(key.packed(), &[0x01, 0x23]);
        assert!(key.is_padded());
        assert_eq!(key.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(key.to_string(), "123");
        assert_eq!(key.nibble(3), None);
    }

    #[test]
    fn packs_even_keys_densely() {
        let key = PartialKey::from_nibbles(&[0xa, 0xb]);

        assert_eq!(key.packed(), &[0xab]);
        assert!(!key.is_padded());
        assert_eq!(PartialKey::from_nibbles(&[]).packed(), &[] as &[u8]);
    }

    #[test]
    fn key_cursor_consumes_matching_prefixes_only() {
        let mut key = KeyNibbles::new(&[0x12, 0x34]);

        assert!(key.consume_prefix(&PartialKey::from_nibbles(&[1, 2])));
        assert!(!key.consume_prefix(&PartialKey::from_nibbles(&[4])));
        assert_eq!(key.offset(), 2);
        assert!(!key.consume_prefix(&PartialKey::from_nibbles(&[3, 4, 5])));

        assert_eq!(key.next_nibble(), Some(3));
        assert_eq!(key.next_nibble(), Some(4));
        assert_eq!(key.next_nibble(), None);
        assert!(key.is_empty());
    }
}
