use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    data_structures::{
        asset_amount::{AssetAmount, AssetAmountDestination},
        output_owners::Ownable,
        transaction_input::{Input, TransferInput, TransferableInput},
        transaction_output::{Output, StakeableLockOutput, TransferOutput, TransferableOutput},
        types::{unix_now, AssetId},
        utxo::Utxo,
    },
    errors::{WalletError, WalletResult},
    utxo_set::UtxoSet,
};

/// Which stakeable-locked value a selection may touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockMode {
    /// Only value that is freely transferable at the spend time
    #[default]
    Unlocked,
    /// Staking spends may also consume still-locked stakeable value
    Stake,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Unlocked => write!(f, "Unlocked"),
            LockMode::Stake => write!(f, "Stake"),
        }
    }
}

impl FromStr for LockMode {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unlocked" => Ok(LockMode::Unlocked),
            "Stake" => Ok(LockMode::Stake),
            other => Err(WalletError::ConfigurationError(format!(
                "unknown lock mode {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Time the spend must be valid at
    pub as_of: u64,
    /// Locktime applied to the destination output
    pub locktime: u64,
    pub lock_mode: LockMode,
}

impl SelectionOptions {
    /// Spend valid now, unlocked destination, no stakeable value
    pub fn new() -> Self {
        Self {
            as_of: unix_now(),
            locktime: 0,
            lock_mode: LockMode::Unlocked,
        }
    }

    pub fn with_as_of(mut self, as_of: u64) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_locktime(mut self, locktime: u64) -> Self {
        self.locktime = locktime;
        self
    }

    pub fn with_lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the UTXOs that fund an [`AssetAmountDestination`] and produces the
/// matching inputs, destination outputs and change
pub struct InputSelector<'a> {
    pub utxo_set: &'a UtxoSet,
    pub options: SelectionOptions,
}

impl<'a> InputSelector<'a> {
    pub fn new(utxo_set: &'a UtxoSet, options: SelectionOptions) -> Self {
        Self { utxo_set, options }
    }

    /// UTXOs eligible under the lock mode, in the order they are consumed.
    /// Staking spends the longest stakeable-locked value first.
    fn candidates(&self) -> Vec<&'a Utxo> {
        let as_of = self.options.as_of;
        match self.options.lock_mode {
            LockMode::Unlocked => self
                .utxo_set
                .iter()
                .filter(|utxo| !utxo.output.is_stakeable_locked_at(as_of))
                .collect(),
            LockMode::Stake => {
                let (mut stakeable, rest): (Vec<&Utxo>, Vec<&Utxo>) = self
                    .utxo_set
                    .iter()
                    .partition(|utxo| matches!(utxo.output, Output::StakeableLock(_)));
                stakeable.sort_by(|a, b| {
                    let a = a.output.stakeable_locktime().unwrap_or_default();
                    let b = b.output.stakeable_locktime().unwrap_or_default();
                    b.cmp(&a)
                });
                stakeable.extend(rest);
                stakeable
            }
        }
    }

    /// Fund every asset in `aad`. On failure nothing is returned, so a
    /// partially funded request never escapes.
    pub fn select(&self, mut aad: AssetAmountDestination) -> WalletResult<AssetAmountDestination> {
        let as_of = self.options.as_of;
        let candidates = self.candidates();
        debug!(
            assets = aad.amounts().len(),
            candidates = candidates.len(),
            lock_mode = %self.options.lock_mode,
            as_of,
            "Starting input selection"
        );

        let mut locked_sources: IndexMap<AssetId, Vec<&StakeableLockOutput>> = IndexMap::new();
        for utxo in candidates {
            if aad.can_complete() {
                break;
            }
            let Some(transfer) = utxo.output.transfer_output() else {
                continue;
            };
            if utxo.output.locked_ids().is_some() {
                trace!(utxo_id = %utxo.id(), "Skipping deposit/bond locked output");
                continue;
            }
            match aad.get_asset_amount(&utxo.asset_id) {
                Some(amount) if !amount.is_finished() => {}
                _ => continue,
            }
            if !utxo.output.meets_threshold(aad.senders(), as_of) {
                trace!(utxo_id = %utxo.id(), "Skipping output below signing threshold");
                continue;
            }

            let stake_locked = utxo.output.is_stakeable_locked_at(as_of);
            let transfer_input = TransferInput::new(transfer.amount);
            let mut input = match &utxo.output {
                Output::StakeableLock(lock) if stake_locked => {
                    locked_sources
                        .entry(utxo.asset_id)
                        .or_default()
                        .push(lock);
                    Input::stakeable_lock(lock.stakeable_locktime, transfer_input)
                }
                _ => Input::Transfer(transfer_input),
            };

            for spender in utxo.output.get_spenders(aad.senders(), as_of) {
                let idx = utxo.output.get_address_idx(&spender).ok_or_else(|| {
                    WalletError::AddressNotFound(format!(
                        "spender {spender:?} is not an owner of UTXO {}",
                        utxo.id()
                    ))
                })?;
                input.add_signature_idx(idx, spender);
            }

            if let Some(amount) = aad.get_asset_amount_mut(&utxo.asset_id) {
                amount.spend_amount(transfer.amount, stake_locked)?;
            }
            trace!(
                utxo_id = %utxo.id(),
                amount = transfer.amount,
                stake_locked,
                "Selected UTXO"
            );
            aad.add_input(TransferableInput::new(
                utxo.tx_id,
                utxo.output_idx,
                utxo.asset_id,
                input,
            ));
        }

        if let Some(unfunded) = aad.amounts().iter().find(|a| !a.is_finished()) {
            return Err(WalletError::InsufficientFunds(format!(
                "Not enough funds for asset {}. Available: {}, required: {}",
                unfunded.asset_id(),
                unfunded.spent(),
                unfunded.total()
            )));
        }

        let amounts: Vec<AssetAmount> = aad.amounts().to_vec();
        for amount in &amounts {
            let sources = locked_sources
                .get(amount.asset_id())
                .map(Vec::as_slice)
                .unwrap_or_default();
            self.emit_outputs(&mut aad, amount, sources)?;
        }

        debug!(
            inputs = aad.inputs().len(),
            outputs = aad.outputs().len(),
            change = aad.change().len(),
            "Input selection complete"
        );
        Ok(aad)
    }

    fn emit_outputs(
        &self,
        aad: &mut AssetAmountDestination,
        amount: &AssetAmount,
        locked_sources: &[&StakeableLockOutput],
    ) -> WalletResult<()> {
        let asset_id = *amount.asset_id();
        let change = amount.change();
        let locked_change = if amount.stakeable_lock_change() { change } else { 0 };

        // Locked value goes back to its owners with the same lock; the last
        // source carries the locked change
        for (position, source) in locked_sources.iter().enumerate() {
            let is_last = position + 1 == locked_sources.len();
            let owners = source.transfer.owners.clone();
            let mut value = source.transfer.amount;
            if is_last {
                value = value.saturating_sub(locked_change);
            }
            if value > 0 {
                aad.add_output(TransferableOutput::new(
                    asset_id,
                    Output::stakeable_lock(
                        source.stakeable_locktime,
                        TransferOutput::new(value, owners.clone()),
                    ),
                ));
            }
            if is_last && locked_change > 0 {
                aad.add_change(TransferableOutput::new(
                    asset_id,
                    Output::stakeable_lock(
                        source.stakeable_locktime,
                        TransferOutput::new(locked_change, owners),
                    ),
                ));
            }
        }

        let unlocked_change = if amount.stakeable_lock_change() { 0 } else { change };
        if unlocked_change > 0 {
            aad.add_change(TransferableOutput::new(
                asset_id,
                Output::transfer(
                    unlocked_change,
                    aad.change_addresses().to_vec(),
                    0,
                    aad.change_threshold(),
                )?,
            ));
        }

        let unlocked_spent = amount.spent() - amount.stakeable_lock_spent();
        let unlocked_amount = unlocked_spent
            .checked_sub(amount.burn())
            .and_then(|rest| rest.checked_sub(unlocked_change))
            .ok_or_else(|| {
                WalletError::InsufficientFunds(format!(
                    "Not enough unlocked funds for asset {asset_id} to cover burn. Available: {unlocked_spent}, required: {}",
                    amount.burn().saturating_add(unlocked_change)
                ))
            })?;
        if unlocked_amount > 0 {
            aad.add_output(TransferableOutput::new(
                asset_id,
                Output::transfer(
                    unlocked_amount,
                    aad.destinations().to_vec(),
                    self.options.locktime,
                    aad.destinations_threshold(),
                )?,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        output_owners::OutputOwners,
        transaction_output::LockedIds,
        types::{Address, TxId},
    };

    const NOW: u64 = 1_000;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn asset() -> AssetId {
        AssetId::new([1u8; 32])
    }

    fn owners(owner: u8) -> OutputOwners {
        OutputOwners::new(vec![addr(owner)], 0, 1).unwrap()
    }

    fn plain(tx: u8, amount: u64) -> Utxo {
        Utxo::new(
            TxId::new([tx; 32]),
            0,
            asset(),
            Output::Transfer(TransferOutput::new(amount, owners(1))),
        )
    }

    fn stakeable(tx: u8, amount: u64, until: u64) -> Utxo {
        Utxo::new(
            TxId::new([tx; 32]),
            0,
            asset(),
            Output::stakeable_lock(until, TransferOutput::new(amount, owners(1))),
        )
    }

    fn request(amount: u64, burn: u64) -> AssetAmountDestination {
        let mut aad = AssetAmountDestination::new(vec![addr(2)], 1, vec![addr(1)], vec![addr(1)], 1);
        aad.add_asset_amount(asset(), amount, burn);
        aad
    }

    fn set(utxos: &[Utxo]) -> UtxoSet {
        let mut set = UtxoSet::new();
        set.add_array(utxos, false).unwrap();
        set
    }

    fn options(mode: LockMode) -> SelectionOptions {
        SelectionOptions::new().with_as_of(NOW).with_lock_mode(mode)
    }

    #[test]
    fn test_unlocked_mode_skips_stakeable_locked() {
        let set = set(&[stakeable(1, 100, NOW + 10), plain(2, 50)]);
        let result = InputSelector::new(&set, options(LockMode::Unlocked))
            .select(request(40, 0))
            .unwrap();
        assert_eq!(result.inputs().len(), 1);
        assert_eq!(result.inputs()[0].tx_id, TxId::new([2u8; 32]));
        assert_eq!(result.inputs()[0].input().type_id(), 5);
    }

    #[test]
    fn test_expired_stakeable_lock_is_plain_value() {
        let set = set(&[stakeable(1, 100, NOW)]);
        let result = InputSelector::new(&set, options(LockMode::Unlocked))
            .select(request(40, 0))
            .unwrap();
        assert!(matches!(result.inputs()[0].input(), Input::Transfer(_)));
        assert_eq!(result.outputs()[0].amount(), 40);
        assert_eq!(result.change()[0].amount(), 60);
    }

    #[test]
    fn test_stake_mode_relocks_value() {
        let set = set(&[plain(2, 50), stakeable(1, 60, NOW + 10)]);
        let result = InputSelector::new(&set, options(LockMode::Stake))
            .select(request(70, 10))
            .unwrap();
        assert_eq!(result.inputs().len(), 2);
        assert!(matches!(result.inputs()[0].input(), Input::StakeableLock(_)));
        assert!(matches!(result.inputs()[1].input(), Input::Transfer(_)));

        // 60 locked is re-emitted with its lock, 50 unlocked pays the burn,
        // 30 change and the remaining 10 of the target
        let outputs: Vec<u64> = result.outputs().iter().map(|o| o.amount()).collect();
        assert_eq!(outputs, vec![60, 10]);
        assert_eq!(
            result.outputs()[0].output().stakeable_locktime(),
            Some(NOW + 10)
        );
        assert_eq!(result.change().len(), 1);
        assert_eq!(result.change()[0].amount(), 30);
        let total_out: u64 = result.get_all_outputs().iter().map(|o| o.amount()).sum();
        let total_in: u64 = result.inputs().iter().map(|i| i.amount()).sum();
        assert_eq!(total_in, total_out + 10);
    }

    #[test]
    fn test_locked_change_stays_locked() {
        let set = set(&[stakeable(1, 100, NOW + 10), plain(2, 50)]);
        let result = InputSelector::new(&set, options(LockMode::Stake))
            .select(request(70, 0))
            .unwrap();
        assert_eq!(result.inputs().len(), 1);
        assert_eq!(result.outputs()[0].amount(), 70);
        assert_eq!(result.change()[0].amount(), 30);
        assert_eq!(
            result.change()[0].output().stakeable_locktime(),
            Some(NOW + 10)
        );
    }

    #[test]
    fn test_burn_needs_unlocked_value() {
        let set = set(&[stakeable(1, 100, NOW + 10)]);
        let err = InputSelector::new(&set, options(LockMode::Stake))
            .select(request(50, 10))
            .unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds(_)));
    }

    #[test]
    fn test_locked_outputs_never_selected() {
        let locked = Utxo::new(
            TxId::new([3u8; 32]),
            0,
            asset(),
            Output::locked(
                LockedIds::new(TxId::new([9u8; 32]), TxId::zero()),
                TransferOutput::new(500, owners(1)),
            ),
        );
        let set = set(&[locked]);
        let err = InputSelector::new(&set, options(LockMode::Stake))
            .select(request(1, 0))
            .unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds(_)));
    }

    #[test]
    fn test_foreign_owner_not_selected() {
        let foreign = Utxo::new(
            TxId::new([4u8; 32]),
            0,
            asset(),
            Output::Transfer(TransferOutput::new(500, owners(7))),
        );
        let set = set(&[foreign]);
        assert!(InputSelector::new(&set, options(LockMode::Unlocked))
            .select(request(1, 0))
            .is_err());
    }

    #[test]
    fn test_lock_mode_names() {
        assert_eq!("Stake".parse::<LockMode>().unwrap(), LockMode::Stake);
        assert_eq!(LockMode::Unlocked.to_string(), "Unlocked");
        assert!("stake".parse::<LockMode>().is_err());
    }
}
