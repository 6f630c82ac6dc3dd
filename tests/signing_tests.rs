//! Build, fee and sign a base transaction against a keyed test signer

use std::collections::HashMap;

use utxo_tx_libs::{
    build_base_tx, calculate_fee_for, Address, AssetId, BaseTxRequest, ByteCodec, Encoding,
    NetworkConfig, Output, Serializable, Signature, Signer, Tx, TxId, Utxo, UtxoSet, WalletError,
    WalletResult,
};

const NOW: u64 = 1_700_000_000;

/// Holds one 65-byte "key" per address and stamps it over the message
struct KeyringSigner {
    keys: HashMap<Address, u8>,
}

impl KeyringSigner {
    fn new(addresses: &[Address]) -> Self {
        let keys = addresses
            .iter()
            .enumerate()
            .map(|(i, address)| (*address, i as u8 + 1))
            .collect();
        Self { keys }
    }
}

impl Signer for KeyringSigner {
    fn sign(&self, message: &[u8; 32], signer: &Address) -> WalletResult<Signature> {
        let key = self
            .keys
            .get(signer)
            .ok_or_else(|| WalletError::Signing(format!("no key for {signer:?}")))?;
        let mut bytes = [*key; 65];
        bytes[..32].copy_from_slice(message);
        Ok(Signature::new(bytes))
    }
}

fn addr(b: u8) -> Address {
    Address::new([b; 20])
}

fn config() -> NetworkConfig {
    NetworkConfig::default().with_tx_fee(1_000)
}

fn wallet(config: &NetworkConfig) -> UtxoSet {
    let mut set = UtxoSet::new();
    let utxos = [
        Utxo::new(
            TxId::new([1u8; 32]),
            0,
            config.fee_asset_id,
            Output::transfer(3_000, vec![addr(1)], 0, 1).unwrap(),
        ),
        Utxo::new(
            TxId::new([2u8; 32]),
            1,
            config.fee_asset_id,
            Output::transfer(4_000, vec![addr(1), addr(3)], 0, 2).unwrap(),
        ),
    ];
    set.add_array(&utxos, false).unwrap();
    set
}

fn send(config: &NetworkConfig, amount: u64) -> BaseTxRequest {
    BaseTxRequest::new(
        config,
        config.fee_asset_id,
        amount,
        vec![addr(2)],
        vec![addr(1), addr(3)],
        vec![addr(1)],
    )
    .with_as_of(NOW)
    .with_memo(b"rent".to_vec())
}

#[test]
fn test_build_sign_and_reparse() {
    let config = config();
    let set = wallet(&config);
    let unsigned = build_base_tx(&set, &send(&config, 5_000)).unwrap().unwrap();

    let base = unsigned.base_tx();
    assert_eq!(base.network_id, config.network_id);
    assert_eq!(base.total_input() - base.total_output(), config.tx_fee);

    let signer = KeyringSigner::new(&[addr(1), addr(3)]);
    let tx = unsigned.sign(&signer).unwrap();
    tx.verify_credential_alignment().unwrap();
    let signatures: usize = tx.credentials().iter().map(|c| c.signatures().len()).sum();
    assert_eq!(signatures, 3);

    let parsed = Tx::from_bytes(&tx.to_bytes()).unwrap();
    assert_eq!(parsed.id(), tx.id());
    parsed.verify_credential_alignment().unwrap();
}

#[test]
fn test_every_signature_commits_to_the_message() {
    let config = config();
    let unsigned = build_base_tx(&wallet(&config), &send(&config, 100))
        .unwrap()
        .unwrap();
    let tx = unsigned
        .sign(&KeyringSigner::new(&[addr(1), addr(3)]))
        .unwrap();
    let message = unsigned.message_hash();
    for credential in tx.credentials() {
        for signature in credential.signatures() {
            assert_eq!(&signature.as_bytes()[..32], &message);
        }
    }
}

#[test]
fn test_missing_key_fails_signing() {
    let config = config();
    let unsigned = build_base_tx(&wallet(&config), &send(&config, 5_000))
        .unwrap()
        .unwrap();
    let err = unsigned.sign(&KeyringSigner::new(&[addr(1)])).unwrap_err();
    assert!(matches!(err, WalletError::Signing(_)));
}

#[test]
fn test_signed_tx_reflection_round_trip() {
    let config = config();
    let ctx = config.serialization();
    let tx = build_base_tx(&wallet(&config), &send(&config, 100))
        .unwrap()
        .unwrap()
        .sign(&KeyringSigner::new(&[addr(1), addr(3)]))
        .unwrap();
    let value = tx.serialize_json(&ctx, Encoding::Cb58).unwrap();
    assert_eq!(value["_typeName"], "Tx");
    let back = Tx::deserialize_json(&value, &ctx, Encoding::Cb58).unwrap();
    assert_eq!(back.to_bytes(), tx.to_bytes());
}

#[test]
fn test_fee_grows_with_transaction_size() {
    let config = config();
    let short = build_base_tx(&wallet(&config), &send(&config, 100))
        .unwrap()
        .unwrap();
    let long = build_base_tx(
        &wallet(&config),
        &send(&config, 100).with_memo(vec![0u8; 64]),
    )
    .unwrap()
    .unwrap();
    let short_fee = calculate_fee_for(&config.fees, &short).unwrap();
    let long_fee = calculate_fee_for(&config.fees, &long).unwrap();
    assert_eq!(long_fee - short_fee, 60);
}

#[test]
fn test_separate_fee_asset() {
    let config = config();
    let token = AssetId::new([5u8; 32]);
    let mut set = wallet(&config);
    let token_utxo = Utxo::new(
        TxId::new([6u8; 32]),
        0,
        token,
        Output::transfer(50, vec![addr(1)], 0, 1).unwrap(),
    );
    set.add(&token_utxo, false).unwrap();

    let request = BaseTxRequest::new(
        &config,
        token,
        20,
        vec![addr(2)],
        vec![addr(1)],
        vec![addr(1)],
    )
    .with_as_of(NOW);
    let unsigned = build_base_tx(&set, &request).unwrap().unwrap();
    let base = unsigned.base_tx();
    let token_in: u64 = base
        .ins
        .iter()
        .filter(|i| i.asset_id == token)
        .map(|i| i.amount())
        .sum();
    let token_out: u64 = base
        .outs
        .iter()
        .filter(|o| o.asset_id() == &token)
        .map(|o| o.amount())
        .sum();
    assert_eq!(token_in, token_out);
    assert_eq!(base.total_input() - base.total_output(), config.tx_fee);
}
