//! Transaction fee formula
//!
//! `bytes * tx_bytes_gas + fixed_fee`, plus a signature component for
//! imports and exports.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    config::FeeConfig,
    data_structures::{
        constants::{BASE_TX_ID, EXPORT_TX_ID, IMPORT_TX_ID},
        transaction::UnsignedTx,
    },
    encoding::ByteCodec,
    errors::{DataStructureError, WalletError, WalletResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeKind {
    Base,
    /// Pays for every signer index of every input
    Import,
    /// Pays one signature per input
    Export,
}

impl TryFrom<u32> for FeeKind {
    type Error = WalletError;

    fn try_from(type_id: u32) -> Result<Self, Self::Error> {
        match type_id {
            BASE_TX_ID => Ok(FeeKind::Base),
            IMPORT_TX_ID => Ok(FeeKind::Import),
            EXPORT_TX_ID => Ok(FeeKind::Export),
            other => Err(DataStructureError::UnknownTypeId {
                kind: "transaction",
                type_id: other,
            }
            .into()),
        }
    }
}

pub fn calculate_fee(config: &FeeConfig, kind: FeeKind, tx: &UnsignedTx) -> u64 {
    let bytes = tx.to_bytes().len() as u64;
    let base = bytes
        .saturating_mul(config.tx_bytes_gas)
        .saturating_add(config.fixed_fee);
    let signatures: u64 = match kind {
        FeeKind::Base => 0,
        FeeKind::Import => tx
            .base_tx
            .ins
            .iter()
            .map(|input| input.input().sig_idxs().len() as u64)
            .sum(),
        FeeKind::Export => tx.base_tx.ins.len() as u64,
    };
    let fee = base.saturating_add(signatures.saturating_mul(config.cost_per_signature));
    trace!(?kind, bytes, signatures, fee, "Calculated fee");
    fee
}

/// Fee for `tx` using the kind implied by its type id
pub fn calculate_fee_for(config: &FeeConfig, tx: &UnsignedTx) -> WalletResult<u64> {
    Ok(calculate_fee(config, FeeKind::try_from(tx.type_id)?, tx))
}
