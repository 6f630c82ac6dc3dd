//! Codec and type identifiers used on the wire

pub const LATEST_CODEC: u16 = 0;

// Output type ids
pub const SECP_TRANSFER_OUTPUT_ID: u32 = 7;
pub const SECP_OWNER_OUTPUT_ID: u32 = 11;
pub const STAKEABLE_LOCK_OUT_ID: u32 = 22;
pub const LOCKED_OUT_ID: u32 = 0x2000_0001;

// Input type ids
pub const SECP_INPUT_ID: u32 = 5;
pub const STAKEABLE_LOCK_IN_ID: u32 = 21;
pub const LOCKED_IN_ID: u32 = 0x2000_0000;

// Credential type ids
pub const SECP_CREDENTIAL_ID: u32 = 9;
pub const SECP_MULTISIG_CREDENTIAL_ID: u32 = 0x2000_0002;

// Transaction type ids
pub const BASE_TX_ID: u32 = 0;
pub const IMPORT_TX_ID: u32 = 17;
pub const EXPORT_TX_ID: u32 = 18;

pub const ADDRESS_LEN: usize = 20;
pub const ID_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 65;
