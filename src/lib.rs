//! UTXO and transaction libraries
//!
//! This crate provides the data layer of a UTXO wallet: the canonical binary
//! codec and string encodings, output/input/credential types, UTXO sets with
//! set algebra, coin selection with stakeable locks, and the unsigned and
//! signed transaction envelopes.
//!
//! Nothing here performs I/O. Keys stay behind the [`Signer`] trait and
//! network specific settings come from a [`NetworkConfig`].
//!
//! ```no_run
//! use utxo_tx_libs::{build_base_tx, BaseTxRequest, ByteCodec, UtxoSet};
//!
//! # fn example(set: &UtxoSet, request: &BaseTxRequest) -> utxo_tx_libs::WalletResult<()> {
//! if let Some(unsigned) = build_base_tx(set, request)? {
//!     println!("{} byte transaction", unsigned.to_bytes().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data_structures;
pub mod encoding;
pub mod errors;
pub mod fees;
pub mod hex_utils;
pub mod signing;
pub mod utxo_set;

pub use config::{FeeConfig, NetworkConfig};
pub use data_structures::*;
pub use encoding::{ByteCodec, Encoding, Serializable, Serialization, SerializedValue};
pub use errors::*;
pub use fees::{calculate_fee, calculate_fee_for, FeeKind};
pub use hex_utils::*;
pub use signing::*;
pub use utxo_set::{parse_utxo, MergeRule, UtxoInput, UtxoSet};
