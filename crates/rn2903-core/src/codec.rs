//! Hex codec for moving binary payloads through the modem's text channel.
//!
//! The modem accepts and returns binary data (EUIs, keys, application
//! payloads, the MAC status word) as strings of hex digits. Encoding always
//! produces uppercase digits, high nibble first. Decoding accepts either
//! case but validates the whole input before converting, so a malformed
//! string never yields partial output.
//!
//! # Example
//!
//! ```
//! use rn2903_core::codec::{from_hex, to_hex};
//!
//! let hex = to_hex(b"Hi").unwrap();
//! assert_eq!(hex, "4869");
//! assert_eq!(from_hex(&hex).unwrap(), b"Hi");
//! ```

use crate::error::{Error, Result};

/// Encode `bytes` as uppercase hex digits.
///
/// Returns `None` for empty input; otherwise the result is exactly
/// `2 * bytes.len()` characters long.
pub fn to_hex(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    Some(hex::encode_upper(bytes))
}

/// Check that `text` is an even-length string of hex digits.
///
/// An empty string passes; callers that need a payload check for that
/// themselves (see [`from_hex`]).
pub fn validate_hex(text: &str) -> Result<()> {
    if text.len() % 2 != 0 {
        return Err(Error::Validation(format!(
            "hex string length must be a multiple of 2 (got {})",
            text.len()
        )));
    }
    if let Some(pos) = text.bytes().position(|b| !b.is_ascii_hexdigit()) {
        return Err(Error::Validation(format!(
            "invalid hex character at position {pos}"
        )));
    }
    Ok(())
}

/// Decode a hex string into bytes.
///
/// Fails with [`Error::Validation`] for empty, odd-length or non-hex input.
/// The returned vector is exactly `text.len() / 2` bytes; binary consumers
/// must rely on its length, not on any terminator.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Err(Error::Validation("empty hex string".into()));
    }
    validate_hex(text)?;
    hex::decode(text).map_err(|e| Error::Validation(e.to_string()))
}

/// Decode a hex string and interpret the bytes as text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; use
/// [`from_hex`] when the payload is binary.
pub fn from_hex_str(text: &str) -> Result<String> {
    let bytes = from_hex(text)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
