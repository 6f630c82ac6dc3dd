//! Coin selection, transaction assembly and signing

pub mod prepare;
pub mod signer;

pub use prepare::{
    base_transaction::{build_base_tx, BaseTxRequest},
    input_selector::{InputSelector, LockMode, SelectionOptions},
};
pub use signer::Signer;
