use thiserror::Error;

/// Main error type for the UTXO and transaction libraries
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Data structure error: {0}")]
    DataStructureError(#[from] DataStructureError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerializationError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Hex error: {0}")]
    HexError(#[from] crate::hex_utils::HexError),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// A spender address was not part of the owner set it was selected from.
    /// This is an internal invariant failure, never a caller mistake.
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("Merge rule error: {0}")]
    MergeRule(String),

    #[error("Threshold error: {0}")]
    Threshold(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Errors related to data structure construction and dispatch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataStructureError {
    #[error("Unknown {kind} type id: {type_id}")]
    UnknownTypeId { kind: &'static str, type_id: u32 },

    #[error("Incorrect data length: expected {expected}, got {actual}")]
    IncorrectLength { expected: usize, actual: usize },

    #[error("Invalid owners: {0}")]
    InvalidOwners(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid UTXO: {0}")]
    InvalidUtxo(String),
}

/// Errors related to serialization and deserialization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Buffer underflow: needed {needed} bytes at offset {offset}, {available} available")]
    BufferUnderflow {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Trailing bytes: {0} unread bytes after value")]
    TrailingBytes(usize),

    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("Type mismatch for {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("JSON deserialization error: {0}")]
    JsonDeserializationError(String),
}

/// Errors related to validation of assembled transactions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Credential validation failed: {0}")]
    CredentialValidationFailed(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::SerializationError(SerializationError::JsonDeserializationError(
            err.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_display() {
        let err: WalletError = DataStructureError::UnknownTypeId {
            kind: "output",
            type_id: 99,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Data structure error: Unknown output type id: 99"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err: WalletError =
            ValidationError::CredentialValidationFailed("2 inputs but 1 credentials".into()).into();
        assert_eq!(
            err.to_string(),
            "Validation error: Credential validation failed: 2 inputs but 1 credentials"
        );
    }

    #[test]
    fn test_flat_variants() {
        let err = WalletError::InsufficientFunds("need 10".to_string());
        assert!(err.to_string().contains("need 10"));
        assert!(matches!(err, WalletError::InsufficientFunds(_)));
    }
}
