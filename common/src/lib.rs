//! Helpers for the `0x`-prefixed hex strings that every public entry point of
//! the workspace exchanges with its callers.
//!
//! Internally all crates work on raw byte slices; conversion happens once at
//! the outer boundary through the functions in this crate.

pub use hex::FromHexError;

/// The prefix carried by every hex string produced by this workspace.
pub const HEX_PREFIX: &str = "0x";

/// Strips a leading `0x` (or `0X`) if present.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix(HEX_PREFIX)
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parses a hex string, with or without a preceding "0x", into bytes.
///
/// Surrounding whitespace is ignored. An odd number of hex digits is an error.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, FromHexError> {
    hex::decode(strip_hex_prefix(s.trim()))
}

/// Parses a hex string into a fixed-size byte array.
pub fn hex_to_array<const N: usize>(s: &str) -> Result<[u8; N], FromHexError> {
    let mut out = [0; N];
    hex::decode_to_slice(strip_hex_prefix(s.trim()), &mut out)?;
    Ok(out)
}

/// Renders bytes as a lowercase, `0x`-prefixed hex string.
pub fn bytes_to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("{}{}", HEX_PREFIX, hex::encode(bytes))
}
