//! Pure conversion helpers between raw bytes and their textual forms.

use base64::{engine::general_purpose, Engine as _};
use bech32::{Bech32, Hrp};
use primitive_types::U256;
use sha2::{Digest, Sha256};

use crate::{
    errors::{DataStructureError, SerializationError, WalletResult},
    hex_utils::decode_hex,
};

pub const CHECKSUM_LEN: usize = 4;
pub const PRIVATE_KEY_PREFIX: &str = "PrivateKey-";
pub const NODE_ID_PREFIX: &str = "NodeID-";

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Append the last four bytes of the payload's SHA-256 digest
pub fn add_checksum(bytes: &[u8]) -> Vec<u8> {
    let digest = sha256(bytes);
    let mut out = Vec::with_capacity(bytes.len() + CHECKSUM_LEN);
    out.extend_from_slice(bytes);
    out.extend_from_slice(&digest[32 - CHECKSUM_LEN..]);
    out
}

/// Check the trailing checksum and return the payload without it
pub fn validate_checksum(bytes: &[u8]) -> WalletResult<Vec<u8>> {
    if bytes.len() < CHECKSUM_LEN {
        return Err(SerializationError::InvalidChecksum(format!(
            "{} bytes is shorter than the checksum",
            bytes.len()
        ))
        .into());
    }
    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let digest = sha256(payload);
    if checksum != &digest[32 - CHECKSUM_LEN..] {
        return Err(SerializationError::InvalidChecksum(format!(
            "expected {}, got {}",
            hex::encode(&digest[32 - CHECKSUM_LEN..]),
            hex::encode(checksum)
        ))
        .into());
    }
    Ok(payload.to_vec())
}

pub fn cb58_encode(bytes: &[u8]) -> String {
    bs58::encode(add_checksum(bytes)).into_string()
}

pub fn cb58_decode(input: &str) -> WalletResult<Vec<u8>> {
    validate_checksum(&base58_decode(input)?)
}

pub fn base58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

pub fn base58_decode(input: &str) -> WalletResult<Vec<u8>> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| SerializationError::InvalidEncoding(format!("base58: {e}")).into())
}

pub fn base64_encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn base64_decode(input: &str) -> WalletResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(input)
        .map_err(|e| SerializationError::InvalidEncoding(format!("base64: {e}")).into())
}

pub fn hex_decode(input: &str) -> WalletResult<Vec<u8>> {
    Ok(decode_hex(input)?)
}

/// Big-endian bytes of `value`. Without a length hint leading zeros are
/// trimmed; with one the result is left-padded to exactly that length.
pub fn u256_to_bytes(value: U256, len_hint: Option<usize>) -> WalletResult<Vec<u8>> {
    let mut full = [0u8; 32];
    value.to_big_endian(&mut full);
    let first = full.iter().position(|b| *b != 0).unwrap_or(32);
    let significant = &full[first..];
    match len_hint {
        None => Ok(significant.to_vec()),
        Some(len) if len >= significant.len() => {
            let mut out = vec![0u8; len - significant.len()];
            out.extend_from_slice(significant);
            Ok(out)
        }
        Some(len) => Err(DataStructureError::IncorrectLength {
            expected: len,
            actual: significant.len(),
        }
        .into()),
    }
}

pub fn bytes_to_u256(bytes: &[u8]) -> WalletResult<U256> {
    if bytes.len() > 32 {
        return Err(DataStructureError::IncorrectLength {
            expected: 32,
            actual: bytes.len(),
        }
        .into());
    }
    Ok(U256::from_big_endian(bytes))
}

pub fn decimal_to_u256(input: &str) -> WalletResult<U256> {
    U256::from_dec_str(input.trim())
        .map_err(|e| SerializationError::InvalidEncoding(format!("decimal string: {e:?}")).into())
}

/// `"<chain alias>-<bech32 address>"`
pub fn address_to_string(hrp: &str, chain_alias: &str, bytes: &[u8]) -> WalletResult<String> {
    let hrp = Hrp::parse(hrp)
        .map_err(|e| DataStructureError::InvalidAddress(format!("bad hrp {hrp}: {e}")))?;
    let encoded = bech32::encode::<Bech32>(hrp, bytes)
        .map_err(|e| SerializationError::InvalidEncoding(format!("bech32: {e}")))?;
    Ok(format!("{chain_alias}-{encoded}"))
}

/// Parse a bech32 address, with or without the chain alias, checking the hrp
/// when one is expected.
pub fn string_to_address(input: &str, expected_hrp: Option<&str>) -> WalletResult<Vec<u8>> {
    let encoded = match input.split_once('-') {
        Some((_, rest)) => rest,
        None => input,
    };
    let (hrp, data) = bech32::decode(encoded)
        .map_err(|e| DataStructureError::InvalidAddress(format!("{input}: {e}")))?;
    if let Some(expected) = expected_hrp {
        let expected_hrp = Hrp::parse(expected)
            .map_err(|e| DataStructureError::InvalidAddress(format!("bad hrp {expected}: {e}")))?;
        if hrp != expected_hrp {
            return Err(DataStructureError::InvalidAddress(format!(
                "expected hrp {expected}, got {hrp}"
            ))
            .into());
        }
    }
    Ok(data)
}

pub fn prefixed_cb58_encode(prefix: &str, bytes: &[u8]) -> String {
    format!("{prefix}{}", cb58_encode(bytes))
}

pub fn prefixed_cb58_decode(prefix: &str, input: &str) -> WalletResult<Vec<u8>> {
    let body = input.strip_prefix(prefix).ok_or_else(|| {
        SerializationError::InvalidEncoding(format!("expected prefix {prefix} on {input}"))
    })?;
    cb58_decode(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WalletError;

    #[test]
    fn test_cb58_known_vector() {
        let bytes = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let encoded = cb58_encode(&bytes);
        assert_eq!(cb58_decode(&encoded).unwrap(), bytes.to_vec());
        assert_eq!(add_checksum(&bytes).len(), 14);
    }

    #[test]
    fn test_cb58_rejects_bad_checksum() {
        let mut raw = add_checksum(b"payload");
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        let tampered = base58_encode(&raw);
        let err = cb58_decode(&tampered).unwrap_err();
        assert!(matches!(
            err,
            WalletError::SerializationError(SerializationError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn test_u256_length_hint() {
        let value = U256::from(258u64);
        assert_eq!(u256_to_bytes(value, None).unwrap(), vec![1, 2]);
        assert_eq!(u256_to_bytes(value, Some(4)).unwrap(), vec![0, 0, 1, 2]);
        assert!(u256_to_bytes(value, Some(1)).is_err());
        assert_eq!(bytes_to_u256(&[1, 2]).unwrap(), value);
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(decimal_to_u256("1000").unwrap(), U256::from(1000u64));
        assert!(decimal_to_u256("12a").is_err());
    }

    #[test]
    fn test_address_round_trip() {
        let bytes = [7u8; 20];
        let text = address_to_string("local", "P", &bytes).unwrap();
        assert!(text.starts_with("P-local1"));
        assert_eq!(string_to_address(&text, Some("local")).unwrap(), bytes.to_vec());
        assert!(string_to_address(&text, Some("camino")).is_err());
    }

    #[test]
    fn test_prefixed_identifiers() {
        let node = prefixed_cb58_encode(NODE_ID_PREFIX, &[9u8; 20]);
        assert!(node.starts_with("NodeID-"));
        assert_eq!(prefixed_cb58_decode(NODE_ID_PREFIX, &node).unwrap(), vec![9u8; 20]);
        assert!(prefixed_cb58_decode(PRIVATE_KEY_PREFIX, &node).is_err());
    }
}
