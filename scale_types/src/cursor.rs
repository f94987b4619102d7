//! A position-tracking view over a byte buffer. All decoding reads through a
//! [`Cursor`].

use crate::error::{CodecError, CodecResult};

/// A read position over an immutable byte buffer.
///
/// Reads either succeed and advance the offset, or fail with
/// [`CodecError::TruncatedInput`] and leave the offset untouched. Composite
/// decoders that perform several reads use [`Cursor::atomically`] so that a
/// failure half-way through restores the offset they started from.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    strict: bool,
}

/// An opaque saved position, see [`Cursor::checkpoint`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Checkpoint(usize);

impl<'a> Cursor<'a> {
    /// Creates a new lenient cursor at offset zero.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            strict: false,
        }
    }

    /// When `strict` is set, compact integers must use their canonical
    /// (shortest) encoding.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether non-canonical compact encodings are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// `true` once every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread part of the buffer.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    /// Looks at the next `len` bytes without consuming them.
    pub fn peek_bytes(&self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::TruncatedInput {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }

        Ok(&self.bytes[self.offset..self.offset + len])
    }

    /// Looks at the next byte without consuming it.
    pub fn peek_byte(&self) -> CodecResult<u8> {
        self.peek_bytes(1).map(|b| b[0])
    }

    /// Reads exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let bytes = self.peek_bytes(len)?;
        self.offset += len;

        Ok(bytes)
    }

    /// Reads a single byte.
    pub fn read_byte(&mut self) -> CodecResult<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Reads a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_bytes(N)?);

        Ok(out)
    }

    /// Saves the current position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.offset)
    }

    /// Returns to a position saved by [`Cursor::checkpoint`] on this cursor.
    pub fn reset(&mut self, checkpoint: Checkpoint) {
        debug_assert!(checkpoint.0 <= self.offset);
        self.offset = checkpoint.0;
    }

    /// Runs `f`, restoring the offset if it fails.
    pub fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> CodecResult<T>) -> CodecResult<T> {
        let start = self.checkpoint();
        let res = f(self);
        if res.is_err() {
            self.reset(start);
        }

        res
    }
}

impl<'a> From<&'a [u8]> for Cursor<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Cursor::new(bytes)
    }
}
