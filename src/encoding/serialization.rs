//! Codec context and the human readable "reflection" form.
//!
//! `Serialization` converts between raw bytes and the textual or numeric
//! representations callers exchange with nodes and explorers. It carries the
//! network hrp and chain alias needed for address strings, so it is built
//! once from a [`NetworkConfig`](crate::config::NetworkConfig) and passed
//! explicitly wherever conversion happens.

use std::{fmt, str::FromStr};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::bintools;
use crate::errors::{SerializationError, WalletResult};

/// Wire and display representations a value can be converted between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Encoding {
    /// Raw bytes
    Buffer,
    /// Arbitrary precision unsigned integer
    Bn,
    /// Base-58 with a 4-byte trailing SHA-256 checksum
    Cb58,
    Base58,
    Base64,
    /// Hex, `0x` prefix accepted on input
    Hex,
    Utf8,
    /// Integer as base-10 text
    DecimalString,
    /// `<alias>-<hrp>1...` address
    Bech32,
    /// `PrivateKey-` prefixed cb58
    PrivateKey,
    /// `NodeID-` prefixed cb58
    NodeId,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Buffer => "Buffer",
            Encoding::Bn => "BN",
            Encoding::Cb58 => "cb58",
            Encoding::Base58 => "base58",
            Encoding::Base64 => "base64",
            Encoding::Hex => "hex",
            Encoding::Utf8 => "utf8",
            Encoding::DecimalString => "decimalString",
            Encoding::Bech32 => "bech32",
            Encoding::PrivateKey => "privateKey",
            Encoding::NodeId => "nodeID",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Encoding {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buffer" => Ok(Encoding::Buffer),
            "BN" => Ok(Encoding::Bn),
            "cb58" => Ok(Encoding::Cb58),
            "base58" => Ok(Encoding::Base58),
            "base64" => Ok(Encoding::Base64),
            "hex" => Ok(Encoding::Hex),
            "utf8" => Ok(Encoding::Utf8),
            "decimalString" => Ok(Encoding::DecimalString),
            "bech32" => Ok(Encoding::Bech32),
            "privateKey" => Ok(Encoding::PrivateKey),
            "nodeID" => Ok(Encoding::NodeId),
            other => Err(SerializationError::InvalidEncoding(format!(
                "unknown encoding {other}"
            ))),
        }
    }
}

/// A value in one of the supported representations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedValue {
    Bytes(Vec<u8>),
    Number(U256),
    Text(String),
}

impl SerializedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SerializedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            SerializedValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

pub type Fields = Map<String, Value>;

/// Explicitly constructed codec context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Serialization {
    hrp: String,
    chain_alias: String,
}

impl Serialization {
    pub fn new(hrp: impl Into<String>, chain_alias: impl Into<String>) -> Self {
        Self {
            hrp: hrp.into(),
            chain_alias: chain_alias.into(),
        }
    }

    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn chain_alias(&self) -> &str {
        &self.chain_alias
    }

    /// Convert a value held in representation `src` to raw bytes
    pub fn type_to_bytes(&self, value: &SerializedValue, src: Encoding) -> WalletResult<Vec<u8>> {
        match (src, value) {
            (Encoding::Buffer, SerializedValue::Bytes(bytes)) => Ok(bytes.clone()),
            (Encoding::Bn, SerializedValue::Number(n)) => bintools::u256_to_bytes(*n, None),
            (Encoding::Cb58, SerializedValue::Text(s)) => bintools::cb58_decode(s),
            (Encoding::Base58, SerializedValue::Text(s)) => bintools::base58_decode(s),
            (Encoding::Base64, SerializedValue::Text(s)) => bintools::base64_decode(s),
            (Encoding::Hex, SerializedValue::Text(s)) => bintools::hex_decode(s),
            (Encoding::Utf8, SerializedValue::Text(s)) => Ok(s.as_bytes().to_vec()),
            (Encoding::DecimalString, SerializedValue::Text(s)) => {
                bintools::u256_to_bytes(bintools::decimal_to_u256(s)?, None)
            }
            (Encoding::Bech32, SerializedValue::Text(s)) => {
                bintools::string_to_address(s, Some(&self.hrp))
            }
            (Encoding::PrivateKey, SerializedValue::Text(s)) => {
                bintools::prefixed_cb58_decode(bintools::PRIVATE_KEY_PREFIX, s)
            }
            (Encoding::NodeId, SerializedValue::Text(s)) => {
                bintools::prefixed_cb58_decode(bintools::NODE_ID_PREFIX, s)
            }
            (src, value) => Err(SerializationError::UnsupportedConversion {
                from: format!("{value:?}"),
                to: src.to_string(),
            }
            .into()),
        }
    }

    /// Convert raw bytes to representation `dst`. `len_hint` pads numeric
    /// values to a fixed width.
    pub fn bytes_to_type(
        &self,
        bytes: &[u8],
        dst: Encoding,
        len_hint: Option<usize>,
    ) -> WalletResult<SerializedValue> {
        let value = match dst {
            Encoding::Buffer => SerializedValue::Bytes(match len_hint {
                Some(len) => {
                    bintools::u256_to_bytes(bintools::bytes_to_u256(bytes)?, Some(len))?
                }
                None => bytes.to_vec(),
            }),
            Encoding::Bn => SerializedValue::Number(bintools::bytes_to_u256(bytes)?),
            Encoding::Cb58 => SerializedValue::Text(bintools::cb58_encode(bytes)),
            Encoding::Base58 => SerializedValue::Text(bintools::base58_encode(bytes)),
            Encoding::Base64 => SerializedValue::Text(bintools::base64_encode(bytes)),
            Encoding::Hex => SerializedValue::Text(format!("0x{}", hex::encode(bytes))),
            Encoding::Utf8 => SerializedValue::Text(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| SerializationError::InvalidEncoding(format!("utf8: {e}")))?,
            ),
            Encoding::DecimalString => {
                SerializedValue::Text(bintools::bytes_to_u256(bytes)?.to_string())
            }
            Encoding::Bech32 => SerializedValue::Text(bintools::address_to_string(
                &self.hrp,
                &self.chain_alias,
                bytes,
            )?),
            Encoding::PrivateKey => SerializedValue::Text(bintools::prefixed_cb58_encode(
                bintools::PRIVATE_KEY_PREFIX,
                bytes,
            )),
            Encoding::NodeId => SerializedValue::Text(bintools::prefixed_cb58_encode(
                bintools::NODE_ID_PREFIX,
                bytes,
            )),
        };
        Ok(value)
    }

    /// Convert `value` from representation `src` into representation `dst`
    pub fn encode(
        &self,
        value: &SerializedValue,
        src: Encoding,
        dst: Encoding,
        len_hint: Option<usize>,
    ) -> WalletResult<SerializedValue> {
        let bytes = self.type_to_bytes(value, src)?;
        self.bytes_to_type(&bytes, dst, len_hint)
    }

    /// Inverse of [`encode`](Self::encode): `value` is held in `encoded_as`
    /// and is converted back into `target`.
    pub fn decode(
        &self,
        value: &SerializedValue,
        encoded_as: Encoding,
        target: Encoding,
        len_hint: Option<usize>,
    ) -> WalletResult<SerializedValue> {
        self.encode(value, encoded_as, target, len_hint)
    }

    /// Encode bytes as a JSON string field
    pub fn bytes_field(&self, bytes: &[u8], encoding: Encoding) -> WalletResult<Value> {
        match self.bytes_to_type(bytes, encoding, None)? {
            SerializedValue::Text(s) => Ok(Value::String(s)),
            SerializedValue::Number(n) => Ok(Value::String(n.to_string())),
            SerializedValue::Bytes(b) => Ok(Value::String(hex::encode(b))),
        }
    }

    /// Decode a JSON string field produced by [`bytes_field`](Self::bytes_field)
    pub fn field_bytes(&self, value: &Value, encoding: Encoding) -> WalletResult<Vec<u8>> {
        let text = value
            .as_str()
            .ok_or_else(|| SerializationError::TypeMismatch {
                field: "value".into(),
                expected: "string".into(),
                actual: value.to_string(),
            })?;
        match encoding {
            Encoding::Buffer => Ok(bintools::hex_decode(text)?),
            Encoding::Bn => bintools::u256_to_bytes(bintools::decimal_to_u256(text)?, None),
            other => self.type_to_bytes(&SerializedValue::Text(text.to_string()), other),
        }
    }

    /// Fixed-length variant of [`field_bytes`](Self::field_bytes)
    pub fn field_array<const N: usize>(
        &self,
        value: &Value,
        encoding: Encoding,
    ) -> WalletResult<[u8; N]> {
        let bytes = self.field_bytes(value, encoding)?;
        bytes.as_slice().try_into().map_err(|_| {
            crate::errors::DataStructureError::IncorrectLength {
                expected: N,
                actual: bytes.len(),
            }
            .into()
        })
    }
}

/// Escape markup characters in every string (keys included) of an incoming
/// JSON document.
pub fn sanitize(value: &Value) -> Value {
    fn clean(s: &str) -> String {
        s.replace('<', "&lt;").replace('>', "&gt;")
    }
    match value {
        Value::String(s) => Value::String(clean(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (clean(k), sanitize(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

pub fn get_field<'a>(fields: &'a Fields, name: &str) -> WalletResult<&'a Value> {
    fields
        .get(name)
        .ok_or_else(|| SerializationError::MissingField(name.to_string()).into())
}

pub fn get_object<'a>(fields: &'a Fields, name: &str) -> WalletResult<&'a Fields> {
    let value = get_field(fields, name)?;
    value.as_object().ok_or_else(|| {
        SerializationError::TypeMismatch {
            field: name.to_string(),
            expected: "object".into(),
            actual: value.to_string(),
        }
        .into()
    })
}

pub fn get_array<'a>(fields: &'a Fields, name: &str) -> WalletResult<&'a Vec<Value>> {
    let value = get_field(fields, name)?;
    value.as_array().ok_or_else(|| {
        SerializationError::TypeMismatch {
            field: name.to_string(),
            expected: "array".into(),
            actual: value.to_string(),
        }
        .into()
    })
}

/// Numbers are carried as decimal strings so 64-bit values survive JSON
pub fn get_u64(fields: &Fields, name: &str) -> WalletResult<u64> {
    value_u64(get_field(fields, name)?, name)
}

/// Parse a bare JSON value the way [`get_u64`] parses a field
pub fn value_u64(value: &Value, name: &str) -> WalletResult<u64> {
    let parsed = match value {
        Value::String(s) => s.parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        SerializationError::TypeMismatch {
            field: name.to_string(),
            expected: "u64".into(),
            actual: value.to_string(),
        }
        .into()
    })
}

pub fn get_u32(fields: &Fields, name: &str) -> WalletResult<u32> {
    let value = get_u64(fields, name)?;
    u32::try_from(value).map_err(|_| {
        SerializationError::TypeMismatch {
            field: name.to_string(),
            expected: "u32".into(),
            actual: value.to_string(),
        }
        .into()
    })
}

pub fn u64_value(value: u64) -> Value {
    Value::String(value.to_string())
}

/// Types with a reflection form tagged by `_typeName`, and optionally
/// `_typeID` and `_codecID`.
pub trait Serializable: Sized {
    fn type_name(&self) -> &'static str;

    fn type_id(&self) -> Option<u32> {
        None
    }

    fn codec_id(&self) -> Option<u16> {
        None
    }

    /// The body of the reflection form, without the header fields
    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields>;

    /// Rebuild the value from an already sanitized object
    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self>;

    fn serialize_json(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Value> {
        let mut fields = Fields::new();
        fields.insert("_typeName".into(), Value::String(self.type_name().into()));
        if let Some(type_id) = self.type_id() {
            fields.insert("_typeID".into(), Value::from(type_id));
        }
        if let Some(codec_id) = self.codec_id() {
            fields.insert("_codecID".into(), Value::from(codec_id));
        }
        fields.extend(self.serialize_fields(ctx, encoding)?);
        Ok(Value::Object(fields))
    }

    fn deserialize_json(value: &Value, ctx: &Serialization, encoding: Encoding) -> WalletResult<Self> {
        let clean = sanitize(value);
        let fields = clean
            .as_object()
            .ok_or_else(|| SerializationError::TypeMismatch {
                field: "root".into(),
                expected: "object".into(),
                actual: value.to_string(),
            })?;
        let result = Self::deserialize_fields(fields, ctx, encoding)?;
        check_header(fields, &result)?;
        Ok(result)
    }
}

/// Reject a reflection form whose header disagrees with the value built from it
pub fn check_header<T: Serializable>(fields: &Fields, value: &T) -> WalletResult<()> {
    let type_name = get_field(fields, "_typeName")?;
    if type_name.as_str() != Some(value.type_name()) {
        return Err(SerializationError::TypeMismatch {
            field: "_typeName".into(),
            expected: value.type_name().into(),
            actual: type_name.to_string(),
        }
        .into());
    }
    if let Some(type_id) = fields.get("_typeID") {
        if type_id.as_u64() != value.type_id().map(u64::from) {
            return Err(SerializationError::TypeMismatch {
                field: "_typeID".into(),
                expected: format!("{:?}", value.type_id()),
                actual: type_id.to_string(),
            }
            .into());
        }
    }
    if let Some(codec_id) = fields.get("_codecID") {
        if codec_id.as_u64() != value.codec_id().map(u64::from) {
            return Err(SerializationError::TypeMismatch {
                field: "_codecID".into(),
                expected: format!("{:?}", value.codec_id()),
                actual: codec_id.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
