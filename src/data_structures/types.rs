use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    data_structures::constants::{ADDRESS_LEN, ID_LEN, SIGNATURE_LEN},
    encoding::{bintools, ByteCodec, ByteReader, ByteWriter, Encoding, Serialization, SerializedValue},
    errors::{DataStructureError, WalletError, WalletResult},
};

/// Fixed-length byte string, ordered by byte value
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedBytes<const N: usize>(pub [u8; N]);

/// 20-byte address hash
pub type Address = FixedBytes<ADDRESS_LEN>;
/// Transaction id
pub type TxId = FixedBytes<ID_LEN>;
/// Fungible asset id
pub type AssetId = FixedBytes<ID_LEN>;
/// Blockchain id
pub type ChainId = FixedBytes<ID_LEN>;
/// Recoverable secp256k1 signature
pub type Signature = FixedBytes<SIGNATURE_LEN>;

impl<const N: usize> FixedBytes<N> {
    pub const LEN: usize = N;

    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0u8; N])
    }

    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        let array: [u8; N] =
            bytes
                .try_into()
                .map_err(|_| DataStructureError::IncorrectLength {
                    expected: N,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// An all-zero value stands for "no id"
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn to_cb58(&self) -> String {
        bintools::cb58_encode(&self.0)
    }

    pub fn from_cb58(input: &str) -> WalletResult<Self> {
        Self::from_slice(&bintools::cb58_decode(input)?)
    }
}

impl FixedBytes<ADDRESS_LEN> {
    /// Human readable `<alias>-<hrp>1...` form
    pub fn to_address_string(&self, ctx: &Serialization) -> WalletResult<String> {
        match ctx.bytes_to_type(&self.0, Encoding::Bech32, None)? {
            SerializedValue::Text(s) => Ok(s),
            other => Err(DataStructureError::InvalidAddress(format!("{other:?}")).into()),
        }
    }

    pub fn from_address_string(ctx: &Serialization, input: &str) -> WalletResult<Self> {
        let bytes = ctx.type_to_bytes(&SerializedValue::Text(input.to_string()), Encoding::Bech32)?;
        Self::from_slice(&bytes)
            .map_err(|_| DataStructureError::InvalidAddress(input.to_string()).into())
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBytes<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Debug for FixedBytes<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl<const N: usize> Display for FixedBytes<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cb58())
    }
}

impl<const N: usize> FromStr for FixedBytes<N> {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cb58(s)
    }
}

impl<const N: usize> ByteCodec for FixedBytes<N> {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_slice(&self.0);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        Ok(Self(reader.take_array()?))
    }
}

/// serde form is lowercase hex; cb58 is kept for `Display`/`FromStr`
impl<const N: usize> Serialize for FixedBytes<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::encode(self.0).serialize(serializer)
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedBytes<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = crate::hex_utils::decode_hex(&hex_string).map_err(serde::de::Error::custom)?;
        if bytes.len() != N {
            return Err(serde::de::Error::custom(format!(
                "Expected {} bytes, got {}",
                N,
                bytes.len()
            )));
        }
        let mut array = [0u8; N];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }
}

/// Current UNIX time in seconds
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hex_utils::HexEncodable;

    #[test]
    fn test_fixed_bytes_ordering() {
        let a = Address::new([1u8; 20]);
        let b = Address::new([2u8; 20]);
        assert!(a < b);
        assert!(Address::zero().is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn test_from_slice_length() {
        assert!(TxId::from_slice(&[0u8; 31]).is_err());
        assert_eq!(TxId::from_slice(&[3u8; 32]).unwrap(), TxId::new([3u8; 32]));
    }

    #[test]
    fn test_cb58_display_round_trip() {
        let id = AssetId::new([42u8; 32]);
        let text = id.to_string();
        assert_eq!(text.parse::<AssetId>().unwrap(), id);
    }

    #[test]
    fn test_address_string() {
        let ctx = Serialization::new("local", "X");
        let address = Address::new([5u8; 20]);
        let text = address.to_address_string(&ctx).unwrap();
        assert!(text.starts_with("X-local1"));
        assert_eq!(Address::from_address_string(&ctx, &text).unwrap(), address);
    }

    #[test]
    fn test_hex_and_serde() {
        let sig = Signature::new([9u8; 65]);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);

        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, format!("\"{}\"", "09".repeat(65)));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);

        let id: TxId = serde_json::from_str(&format!("\"0x{}\"", "ab".repeat(32))).unwrap();
        assert_eq!(id, TxId::new([0xab; 32]));
        assert!(serde_json::from_str::<TxId>("\"abab\"").is_err());
    }
}
