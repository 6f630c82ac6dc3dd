use thiserror::Error;

use crate::encoding::ByteCodec;

/// Error types for hex encoding/decoding operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
    #[error("Hex string is empty")]
    EmptyString,
    #[error("Hex string has odd length: {0}")]
    OddLength(usize),
}

impl From<hex::FromHexError> for HexError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::OddLength => HexError::OddLength(0),
            other => HexError::InvalidHex(other.to_string()),
        }
    }
}

/// Decode a hex string, accepting an optional `0x` prefix
pub fn decode_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    if stripped.len() % 2 != 0 {
        return Err(HexError::OddLength(stripped.len()));
    }
    Ok(hex::decode(stripped)?)
}

/// Trait for types that can be converted to and from hex strings
pub trait HexEncodable {
    /// Convert the value to a hex string
    fn to_hex(&self) -> String;

    /// Convert the value to a hex string with a prefix (e.g., "0x")
    fn to_hex_with_prefix(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.to_hex())
    }

    /// Convert from a hex string
    fn from_hex(hex: &str) -> Result<Self, HexError>
    where
        Self: Sized;

    /// Convert from a hex string, optionally removing a prefix
    fn from_hex_with_prefix(hex: &str, prefix: &str) -> Result<Self, HexError>
    where
        Self: Sized,
    {
        let hex = hex.strip_prefix(prefix).unwrap_or(hex);
        Self::from_hex(hex)
    }
}

impl<T: ByteCodec> HexEncodable for T {
    fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn from_hex(hex: &str) -> Result<Self, HexError> {
        if hex.is_empty() {
            return Err(HexError::EmptyString);
        }
        let bytes = decode_hex(hex)?;
        T::from_bytes(&bytes).map_err(|e| HexError::InvalidHex(e.to_string()))
    }
}
