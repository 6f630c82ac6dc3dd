//! End-to-end coin selection through `UtxoSet::get_minimum_spendable`

use rand::{rngs::StdRng, Rng, SeedableRng};
use utxo_tx_libs::{
    Address, AssetAmountDestination, AssetId, Input, LockMode, LockedIds, Output, OutputOwners,
    SelectionOptions, TransferOutput, TxId, Utxo, UtxoSet, WalletError,
};

const NOW: u64 = 1_700_000_000;

fn addr(b: u8) -> Address {
    Address::new([b; 20])
}

fn avax() -> AssetId {
    AssetId::new([9u8; 32])
}

fn plain(seed: u8, owner: u8, amount: u64) -> Utxo {
    Utxo::new(
        TxId::new([seed; 32]),
        0,
        avax(),
        Output::transfer(amount, vec![addr(owner)], 0, 1).unwrap(),
    )
}

fn stakeable(seed: u8, owner: u8, amount: u64, until: u64) -> Utxo {
    let transfer = TransferOutput::new(amount, OutputOwners::new(vec![addr(owner)], 0, 1).unwrap());
    Utxo::new(
        TxId::new([seed; 32]),
        0,
        avax(),
        Output::stakeable_lock(until, transfer),
    )
}

fn request(amount: u64, burn: u64) -> AssetAmountDestination {
    let mut aad = AssetAmountDestination::new(vec![addr(2)], 1, vec![addr(1)], vec![addr(1)], 1);
    aad.add_asset_amount(avax(), amount, burn);
    aad
}

fn options(lock_mode: LockMode) -> SelectionOptions {
    SelectionOptions::new()
        .with_as_of(NOW)
        .with_lock_mode(lock_mode)
}

fn set_of(utxos: &[Utxo]) -> UtxoSet {
    let mut set = UtxoSet::new();
    set.add_array(utxos, false).unwrap();
    set
}

#[test]
fn test_single_utxo_pays_target_burn_and_change() {
    let set = set_of(&[plain(1, 1, 100)]);
    let funded = set
        .get_minimum_spendable(request(60, 5), options(LockMode::Unlocked))
        .unwrap();

    assert_eq!(funded.inputs().len(), 1);
    assert_eq!(funded.inputs()[0].amount(), 100);

    assert_eq!(funded.outputs().len(), 1);
    let sent = funded.outputs()[0].output();
    assert_eq!(sent.amount(), Some(60));
    assert_eq!(sent.transfer_output().unwrap().owners.addresses(), &[addr(2)]);

    assert_eq!(funded.change().len(), 1);
    let change = funded.change()[0].output();
    assert_eq!(change.amount(), Some(35));
    assert_eq!(change.transfer_output().unwrap().owners.addresses(), &[addr(1)]);
}

#[test]
fn test_empty_set_is_insufficient() {
    let err = UtxoSet::new()
        .get_minimum_spendable(request(1, 0), options(LockMode::Unlocked))
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds(_)));
}

#[test]
fn test_stake_consumes_longest_lock_first() {
    let set = set_of(&[
        stakeable(1, 1, 50, NOW + 100),
        stakeable(2, 1, 50, NOW + 200),
    ]);
    let funded = set
        .get_minimum_spendable(request(50, 0), options(LockMode::Stake))
        .unwrap();

    assert_eq!(funded.inputs().len(), 1);
    let input = &funded.inputs()[0];
    assert_eq!(input.tx_id, TxId::new([2u8; 32]));
    assert!(matches!(input.input(), Input::StakeableLock(_)));

    assert_eq!(funded.outputs().len(), 1);
    assert_eq!(
        funded.outputs()[0].output().stakeable_locktime(),
        Some(NOW + 200)
    );
    assert!(funded.change().is_empty());
}

#[test]
fn test_unlocked_mode_excludes_live_locks() {
    let set = set_of(&[stakeable(1, 1, 500, NOW + 10)]);
    let err = set
        .get_minimum_spendable(request(10, 0), options(LockMode::Unlocked))
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds(_)));
}

#[test]
fn test_expired_lock_spends_as_plain_value() {
    let set = set_of(&[stakeable(1, 1, 500, NOW - 10)]);
    let funded = set
        .get_minimum_spendable(request(10, 0), options(LockMode::Unlocked))
        .unwrap();
    assert!(matches!(funded.inputs()[0].input(), Input::Transfer(_)));
    assert_eq!(funded.change()[0].output().amount(), Some(490));
}

#[test]
fn test_deposit_locked_value_is_never_selected() {
    let transfer = TransferOutput::new(1_000, OutputOwners::new(vec![addr(1)], 0, 1).unwrap());
    let locked = Utxo::new(
        TxId::new([3u8; 32]),
        0,
        avax(),
        Output::locked(LockedIds::new(TxId::new([4u8; 32]), TxId::zero()), transfer),
    );
    let set = set_of(&[locked, plain(5, 1, 20)]);
    for mode in [LockMode::Unlocked, LockMode::Stake] {
        let funded = set.get_minimum_spendable(request(15, 0), options(mode)).unwrap();
        assert_eq!(funded.inputs().len(), 1);
        assert_eq!(funded.inputs()[0].tx_id, TxId::new([5u8; 32]));
    }
}

#[test]
fn test_outputs_owned_by_others_are_skipped() {
    let set = set_of(&[plain(1, 8, 100), plain(2, 1, 30)]);
    let funded = set
        .get_minimum_spendable(request(20, 0), options(LockMode::Unlocked))
        .unwrap();
    assert_eq!(funded.inputs().len(), 1);
    assert_eq!(funded.inputs()[0].tx_id, TxId::new([2u8; 32]));
    assert_eq!(funded.inputs()[0].input().sig_idxs().len(), 1);
}

#[test]
fn test_value_is_conserved() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let utxos: Vec<Utxo> = (0..rng.gen_range(1..8u8))
            .map(|seed| plain(seed + 1, 1, rng.gen_range(1..1_000)))
            .collect();
        let available: u64 = utxos.iter().filter_map(Utxo::amount).sum();
        let burn = rng.gen_range(0..=available / 4);
        let amount = rng.gen_range(1..=available - burn);
        let set = set_of(&utxos);

        let funded = set
            .get_minimum_spendable(request(amount, burn), options(LockMode::Unlocked))
            .unwrap();
        let consumed: u64 = funded.inputs().iter().map(|i| i.amount()).sum();
        let produced: u64 = funded.get_all_outputs().iter().map(|o| o.amount()).sum();
        assert_eq!(consumed, produced + burn);
        assert_eq!(
            funded.outputs().iter().map(|o| o.amount()).sum::<u64>(),
            amount
        );
    }
}

#[test]
fn test_over_budget_request_fails() {
    let set = set_of(&[plain(1, 1, 40), plain(2, 1, 40)]);
    let err = set
        .get_minimum_spendable(request(75, 10), options(LockMode::Unlocked))
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds(_)));
}
