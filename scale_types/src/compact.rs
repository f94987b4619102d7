//! The compact (variable-length) integer encoding.
//!
//! The low two bits of the first byte select the mode:
//! - `0b00`: single byte, value in the upper six bits.
//! - `0b01`: two bytes, little-endian, value in the upper 14 bits.
//! - `0b10`: four bytes, little-endian, value in the upper 30 bits.
//! - `0b11`: "big integer" mode. The upper six bits hold `byte_count - 4` and
//!   the value follows as `byte_count` little-endian bytes.
//!
//! Values are held as [`U256`], so big integer mode accepts at most 32
//! significant bytes.

use ethereum_types::U256;

use crate::{
    cursor::Cursor,
    error::{CodecError, CodecResult},
};

const COMPACT: &str = "Compact";

const SINGLE_BYTE_MAX: u64 = (1 << 6) - 1;
const TWO_BYTE_MAX: u64 = (1 << 14) - 1;
const FOUR_BYTE_MAX: u64 = (1 << 30) - 1;

/// Smallest byte count allowed in big integer mode.
const BIG_INT_MIN_BYTES: usize = 4;
const U256_BYTES: usize = 32;

/// Decodes a compact integer.
///
/// Lenient cursors accept non-minimal encodings; strict ones (see
/// [`Cursor::with_strict`]) reject them. The cursor is not advanced on
/// failure.
pub fn decode_compact(cursor: &mut Cursor<'_>) -> CodecResult<U256> {
    let first = cursor.peek_byte()?;

    let (value, width) = match first & 0b11 {
        0b00 => (U256::from(first >> 2), 1),
        0b01 => {
            let b = cursor.peek_bytes(2)?;
            let raw = u16::from_le_bytes([b[0], b[1]]);
            let v = u64::from(raw >> 2);
            check_canonical(cursor, v > SINGLE_BYTE_MAX)?;
            (U256::from(v), 2)
        }
        0b10 => {
            let b = cursor.peek_bytes(4)?;
            let raw = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
            let v = u64::from(raw >> 2);
            check_canonical(cursor, v > TWO_BYTE_MAX)?;
            (U256::from(v), 4)
        }
        _ => {
            let len = usize::from(first >> 2) + BIG_INT_MIN_BYTES;
            let body = &cursor.peek_bytes(len + 1)?[1..];

            let (low, high) = body.split_at(len.min(U256_BYTES));
            if high.iter().any(|b| *b != 0) {
                return Err(CodecError::IntegerOverflow { bits: 256 });
            }

            let v = U256::from_little_endian(low);
            let minimal = v > U256::from(FOUR_BYTE_MAX) && body.last() != Some(&0);
            check_canonical(cursor, minimal)?;
            (v, len + 1)
        }
    };

    cursor.read_bytes(width)?;
    Ok(value)
}

fn check_canonical(cursor: &Cursor<'_>, minimal: bool) -> CodecResult<()> {
    match minimal || !cursor.is_strict() {
        true => Ok(()),
        false => Err(CodecError::invalid_encoding(
            COMPACT,
            "value is not in its shortest encoding",
        )),
    }
}

/// Decodes a compact integer that is used as a length or count.
pub fn decode_compact_len(cursor: &mut Cursor<'_>) -> CodecResult<usize> {
    cursor.atomically(|c| {
        let v = decode_compact(c)?;
        match v > U256::from(usize::MAX) {
            true => Err(CodecError::IntegerOverflow {
                bits: usize::BITS,
            }),
            false => Ok(v.as_usize()),
        }
    })
}

/// Appends the canonical (shortest) compact encoding of `value` to `out`.
pub fn encode_compact(value: U256, out: &mut Vec<u8>) {
    if value <= U256::from(SINGLE_BYTE_MAX) {
        out.push((value.low_u32() as u8) << 2);
    } else if value <= U256::from(TWO_BYTE_MAX) {
        out.extend_from_slice(&(((value.low_u32() as u16) << 2) | 0b01).to_le_bytes());
    } else if value <= U256::from(FOUR_BYTE_MAX) {
        out.extend_from_slice(&((value.low_u32() << 2) | 0b10).to_le_bytes());
    } else {
        let len = (value.bits() + 7) / 8;
        out.push((((len - BIG_INT_MIN_BYTES) as u8) << 2) | 0b11);

        let mut buf = [0; U256_BYTES];
        value.to_little_endian(&mut buf);
        out.extend_from_slice(&buf[..len]);
    }
}

/// Appends the compact encoding of a length or count.
pub fn encode_compact_len(len: usize, out: &mut Vec<u8>) {
    encode_compact(U256::from(len), out)
}
