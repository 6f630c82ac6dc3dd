use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        transaction_input::TransferableInput,
        transaction_output::TransferableOutput,
        types::{Address, AssetId},
    },
    errors::{WalletError, WalletResult},
};

/// Progress of funding one asset: the target, the burn and how much has
/// been consumed so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    asset_id: AssetId,
    amount: u64,
    burn: u64,
    spent: u64,
    stakeable_lock_spent: u64,
    change: u64,
    stakeable_lock_change: bool,
    finished: bool,
}

impl AssetAmount {
    pub fn new(asset_id: AssetId, amount: u64, burn: u64) -> Self {
        Self {
            asset_id,
            amount,
            burn,
            spent: 0,
            stakeable_lock_spent: 0,
            change: 0,
            stakeable_lock_change: false,
            finished: false,
        }
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn burn(&self) -> u64 {
        self.burn
    }

    pub fn spent(&self) -> u64 {
        self.spent
    }

    pub fn stakeable_lock_spent(&self) -> u64 {
        self.stakeable_lock_spent
    }

    pub fn change(&self) -> u64 {
        self.change
    }

    /// Whether the change was produced by a stakeable-locked spend
    pub fn stakeable_lock_change(&self) -> bool {
        self.stakeable_lock_change
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Target plus burn
    pub fn total(&self) -> u64 {
        self.amount.saturating_add(self.burn)
    }

    /// Consume `amount` towards the target. `stake_locked` marks value that
    /// may only be used for staking.
    pub fn spend_amount(&mut self, amount: u64, stake_locked: bool) -> WalletResult<bool> {
        if self.finished {
            return Err(WalletError::InsufficientFunds(format!(
                "asset {} is already fully funded",
                self.asset_id
            )));
        }
        self.spent = self.spent.saturating_add(amount);
        if stake_locked {
            self.stakeable_lock_spent = self.stakeable_lock_spent.saturating_add(amount);
        }
        let total = self.total();
        if self.spent >= total {
            self.change = self.spent - total;
            self.stakeable_lock_change = stake_locked;
            self.finished = true;
        }
        Ok(self.finished)
    }
}

/// Everything a funding request needs: per-asset targets, who receives and
/// who pays, and the inputs and outputs selection has produced so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmountDestination {
    destinations: Vec<Address>,
    destinations_threshold: u32,
    senders: Vec<Address>,
    change_addresses: Vec<Address>,
    change_threshold: u32,
    amounts: Vec<AssetAmount>,
    inputs: Vec<TransferableInput>,
    outputs: Vec<TransferableOutput>,
    change: Vec<TransferableOutput>,
}

impl AssetAmountDestination {
    pub fn new(
        destinations: Vec<Address>,
        destinations_threshold: u32,
        senders: Vec<Address>,
        change_addresses: Vec<Address>,
        change_threshold: u32,
    ) -> Self {
        Self {
            destinations,
            destinations_threshold,
            senders,
            change_addresses,
            change_threshold,
            ..Default::default()
        }
    }

    /// Track an asset. Adding the same asset twice keeps both entries; the
    /// first one is the one selection funds.
    pub fn add_asset_amount(&mut self, asset_id: AssetId, amount: u64, burn: u64) {
        self.amounts.push(AssetAmount::new(asset_id, amount, burn));
    }

    pub fn get_asset_amount(&self, asset_id: &AssetId) -> Option<&AssetAmount> {
        self.amounts.iter().find(|a| &a.asset_id == asset_id)
    }

    pub fn get_asset_amount_mut(&mut self, asset_id: &AssetId) -> Option<&mut AssetAmount> {
        self.amounts.iter_mut().find(|a| &a.asset_id == asset_id)
    }

    pub fn asset_exists(&self, asset_id: &AssetId) -> bool {
        self.get_asset_amount(asset_id).is_some()
    }

    pub fn amounts(&self) -> &[AssetAmount] {
        &self.amounts
    }

    /// True once every tracked asset is funded
    pub fn can_complete(&self) -> bool {
        self.amounts.iter().all(|a| a.finished)
    }

    pub fn destinations(&self) -> &[Address] {
        &self.destinations
    }

    pub fn destinations_threshold(&self) -> u32 {
        self.destinations_threshold
    }

    pub fn senders(&self) -> &[Address] {
        &self.senders
    }

    pub fn change_addresses(&self) -> &[Address] {
        &self.change_addresses
    }

    pub fn change_threshold(&self) -> u32 {
        self.change_threshold
    }

    pub fn add_input(&mut self, input: TransferableInput) {
        self.inputs.push(input);
    }

    pub fn add_output(&mut self, output: TransferableOutput) {
        self.outputs.push(output);
    }

    pub fn add_change(&mut self, output: TransferableOutput) {
        self.change.push(output);
    }

    pub fn inputs(&self) -> &[TransferableInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransferableOutput] {
        &self.outputs
    }

    pub fn change(&self) -> &[TransferableOutput] {
        &self.change
    }

    /// Destination outputs followed by change
    pub fn get_all_outputs(&self) -> Vec<TransferableOutput> {
        self.outputs.iter().chain(self.change.iter()).cloned().collect()
    }

    pub fn into_parts(
        self,
    ) -> (
        Vec<TransferableInput>,
        Vec<TransferableOutput>,
        Vec<TransferableOutput>,
    ) {
        (self.inputs, self.outputs, self.change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_until_finished() {
        let mut amount = AssetAmount::new(AssetId::new([1u8; 32]), 60, 5);
        assert!(!amount.spend_amount(40, false).unwrap());
        assert!(amount.spent() <= amount.total());
        assert!(amount.spend_amount(40, false).unwrap());
        assert_eq!(amount.change(), 15);
        assert!(!amount.stakeable_lock_change());
        assert!(amount.spend_amount(1, false).is_err());
        assert_eq!(amount.spent(), 80);
    }

    #[test]
    fn test_exact_spend_has_no_change() {
        let mut amount = AssetAmount::new(AssetId::zero(), 10, 0);
        assert!(amount.spend_amount(10, false).unwrap());
        assert_eq!(amount.change(), 0);
    }

    #[test]
    fn test_locked_spend_tracks_change_source() {
        let mut amount = AssetAmount::new(AssetId::zero(), 10, 0);
        amount.spend_amount(4, false).unwrap();
        amount.spend_amount(20, true).unwrap();
        assert_eq!(amount.stakeable_lock_spent(), 20);
        assert_eq!(amount.change(), 14);
        assert!(amount.stakeable_lock_change());
    }

    #[test]
    fn test_destination_completion() {
        let a = AssetId::new([1u8; 32]);
        let b = AssetId::new([2u8; 32]);
        let mut aad = AssetAmountDestination::new(vec![], 1, vec![], vec![], 1);
        aad.add_asset_amount(a, 1, 0);
        aad.add_asset_amount(b, 1, 0);
        assert!(aad.asset_exists(&b));
        assert!(!aad.can_complete());
        aad.get_asset_amount_mut(&a).unwrap().spend_amount(1, false).unwrap();
        assert!(!aad.can_complete());
        aad.get_asset_amount_mut(&b).unwrap().spend_amount(2, false).unwrap();
        assert!(aad.can_complete());
    }

    #[test]
    fn test_empty_destination_is_complete() {
        assert!(AssetAmountDestination::default().can_complete());
    }
}
