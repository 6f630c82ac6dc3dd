//! Outputs, inputs, credentials, UTXOs and the transaction envelope

pub mod asset_amount;
pub mod constants;
pub mod credential;
pub mod output_owners;
pub mod transaction;
pub mod transaction_input;
pub mod transaction_output;
pub mod types;
pub mod utxo;

pub use asset_amount::{AssetAmount, AssetAmountDestination};
pub use credential::Credential;
pub use output_owners::{Ownable, OutputOwners};
pub use transaction::{BaseTx, Tx, UnsignedTx};
pub use transaction_input::{
    sorted_inputs, Input, LockedInput, SigIdx, StakeableLockInput, TransferInput,
    TransferableInput,
};
pub use transaction_output::{
    sorted_outputs, LockedIds, LockedOutput, OwnerOutput, Output, StakeableLockOutput,
    TransferOutput, TransferableOutput,
};
pub use types::{unix_now, Address, AssetId, ChainId, FixedBytes, Signature, TxId};
pub use utxo::Utxo;
