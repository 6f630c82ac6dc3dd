use tracing::debug;

use crate::{
    config::NetworkConfig,
    data_structures::{
        asset_amount::AssetAmountDestination,
        transaction::{BaseTx, UnsignedTx},
        types::{unix_now, Address, AssetId, ChainId},
    },
    errors::{WalletError, WalletResult},
    signing::prepare::input_selector::{InputSelector, LockMode, SelectionOptions},
    utxo_set::UtxoSet,
};

/// A simple send of one asset, with the fee burned in the fee asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTxRequest {
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub asset_id: AssetId,
    pub amount: u64,
    pub to_addresses: Vec<Address>,
    pub from_addresses: Vec<Address>,
    pub change_addresses: Vec<Address>,
    pub fee: u64,
    pub fee_asset_id: AssetId,
    pub memo: Vec<u8>,
    pub as_of: u64,
    pub locktime: u64,
    /// Signatures required to spend the destination output
    pub threshold: u32,
}

impl BaseTxRequest {
    /// Request paying the network's flat fee, valid now, 1-of-n destination
    pub fn new(
        config: &NetworkConfig,
        asset_id: AssetId,
        amount: u64,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
    ) -> Self {
        Self {
            network_id: config.network_id,
            blockchain_id: config.blockchain_id,
            asset_id,
            amount,
            to_addresses,
            from_addresses,
            change_addresses,
            fee: config.tx_fee,
            fee_asset_id: config.fee_asset_id,
            memo: Vec::new(),
            as_of: unix_now(),
            locktime: 0,
            threshold: 1,
        }
    }

    pub fn with_memo(mut self, memo: Vec<u8>) -> Self {
        self.memo = memo;
        self
    }

    pub fn with_as_of(mut self, as_of: u64) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_locktime(mut self, locktime: u64) -> Self {
        self.locktime = locktime;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_fee(mut self, fee: u64, fee_asset_id: AssetId) -> Self {
        self.fee = fee;
        self.fee_asset_id = fee_asset_id;
        self
    }
}

/// Select inputs for `request` and assemble the unsigned transaction.
///
/// Returns `None` for a zero amount. Destination outputs come before change.
pub fn build_base_tx(
    utxo_set: &UtxoSet,
    request: &BaseTxRequest,
) -> WalletResult<Option<UnsignedTx>> {
    if request.threshold as usize > request.to_addresses.len() {
        return Err(WalletError::Threshold(format!(
            "threshold {} exceeds {} destination addresses",
            request.threshold,
            request.to_addresses.len()
        )));
    }
    if request.amount == 0 {
        return Ok(None);
    }

    let mut aad = AssetAmountDestination::new(
        request.to_addresses.clone(),
        request.threshold,
        request.from_addresses.clone(),
        request.change_addresses.clone(),
        1,
    );
    if request.asset_id == request.fee_asset_id {
        aad.add_asset_amount(request.asset_id, request.amount, request.fee);
    } else {
        aad.add_asset_amount(request.asset_id, request.amount, 0);
        if request.fee > 0 {
            aad.add_asset_amount(request.fee_asset_id, 0, request.fee);
        }
    }

    let options = SelectionOptions::new()
        .with_as_of(request.as_of)
        .with_locktime(request.locktime)
        .with_lock_mode(LockMode::Unlocked);
    let funded = InputSelector::new(utxo_set, options).select(aad)?;
    let outs = funded.get_all_outputs();
    let (ins, _, _) = funded.into_parts();

    debug!(
        inputs = ins.len(),
        outputs = outs.len(),
        amount = request.amount,
        fee = request.fee,
        "Built base transaction"
    );
    let base_tx = BaseTx::new(
        request.network_id,
        request.blockchain_id,
        outs,
        ins,
        request.memo.clone(),
    );
    Ok(Some(UnsignedTx::new(base_tx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{transaction_output::Output, types::TxId, utxo::Utxo};

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn funded_set(asset: AssetId, amount: u64) -> UtxoSet {
        let mut set = UtxoSet::new();
        let utxo = Utxo::new(
            TxId::new([1u8; 32]),
            0,
            asset,
            Output::transfer(amount, vec![addr(1)], 0, 1).unwrap(),
        );
        set.add(&utxo, false).unwrap();
        set
    }

    fn request(asset: AssetId, amount: u64) -> BaseTxRequest {
        BaseTxRequest::new(
            &NetworkConfig::default(),
            asset,
            amount,
            vec![addr(2)],
            vec![addr(1)],
            vec![addr(1)],
        )
        .with_as_of(100)
    }

    #[test]
    fn test_zero_amount_builds_nothing() {
        let set = funded_set(AssetId::zero(), 10);
        assert!(build_base_tx(&set, &request(AssetId::zero(), 0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_threshold_above_destinations() {
        let set = funded_set(AssetId::zero(), 10);
        let err = build_base_tx(&set, &request(AssetId::zero(), 1).with_threshold(2)).unwrap_err();
        assert!(matches!(err, WalletError::Threshold(_)));
    }

    #[test]
    fn test_fee_folded_into_burn() {
        let set = funded_set(AssetId::zero(), 2_000_000);
        let unsigned = build_base_tx(&set, &request(AssetId::zero(), 500_000).with_memo(b"hi".to_vec()))
            .unwrap()
            .unwrap();
        let base = unsigned.base_tx();
        assert_eq!(base.ins.len(), 1);
        assert_eq!(base.total_input() - base.total_output(), 1_000_000);
        assert_eq!(base.outs[0].amount(), 500_000);
        assert_eq!(base.outs[1].amount(), 500_000);
        assert_eq!(base.memo, b"hi".to_vec());
    }

    #[test]
    fn test_separate_fee_asset_must_be_funded() {
        let asset = AssetId::new([5u8; 32]);
        let set = funded_set(asset, 100);
        let err = build_base_tx(&set, &request(asset, 10)).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds(_)));
    }
}
