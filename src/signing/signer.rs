//! Key access seam used when turning an unsigned transaction into a signed one

use crate::{
    data_structures::types::{Address, Signature},
    errors::WalletResult,
};

/// Produces recoverable signatures for addresses it holds keys for.
///
/// Implementations decide where keys live; this crate only hands over the
/// 32-byte message hash and the address named by each signer index.
pub trait Signer {
    fn sign(&self, message: &[u8; 32], signer: &Address) -> WalletResult<Signature>;
}
