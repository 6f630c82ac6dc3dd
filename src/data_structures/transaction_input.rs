use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data_structures::{
        constants::{LOCKED_IN_ID, SECP_CREDENTIAL_ID, SECP_INPUT_ID, STAKEABLE_LOCK_IN_ID},
        transaction_output::LockedIds,
        types::{Address, AssetId, TxId},
    },
    encoding::{
        serialization::{
            check_header, get_array, get_field, get_object, get_u32, get_u64, u64_value, value_u64,
        },
        ByteCodec, ByteReader, ByteWriter, Encoding, Fields, Serializable, Serialization,
    },
    errors::{DataStructureError, WalletResult},
};

/// Index of a signing address within the spent output's owner list.
///
/// The source address is kept so a signer knows which key to use; it is not
/// part of the wire form and does not take part in equality.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct SigIdx {
    pub address_idx: u32,
    pub source: Option<Address>,
}

impl SigIdx {
    pub fn new(address_idx: u32, source: Address) -> Self {
        Self {
            address_idx,
            source: Some(source),
        }
    }
}

impl PartialEq for SigIdx {
    fn eq(&self, other: &Self) -> bool {
        self.address_idx == other.address_idx
    }
}

impl Hash for SigIdx {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address_idx.hash(state);
    }
}

/// Plain value input authorised by a list of signer indices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TransferInput {
    pub amount: u64,
    pub sig_idxs: Vec<SigIdx>,
}

impl TransferInput {
    pub fn new(amount: u64) -> Self {
        Self {
            amount,
            sig_idxs: Vec::new(),
        }
    }
}

/// `[8B amount][4B sig count][count x 4B address index]`
impl ByteCodec for TransferInput {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u64(self.amount);
        writer.put_u32(self.sig_idxs.len() as u32);
        for sig in &self.sig_idxs {
            writer.put_u32(sig.address_idx);
        }
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let amount = reader.get_u64()?;
        let count = reader.get_count(4)?;
        let sig_idxs = (0..count)
            .map(|_| {
                Ok(SigIdx {
                    address_idx: reader.get_u32()?,
                    source: None,
                })
            })
            .collect::<WalletResult<Vec<_>>>()?;
        Ok(Self { amount, sig_idxs })
    }
}

/// Input spending a stakeable-lock output before its stakeable locktime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StakeableLockInput {
    pub stakeable_locktime: u64,
    pub transfer: TransferInput,
}

/// Input spending a deposit/bond locked output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedInput {
    pub ids: LockedIds,
    pub transfer: TransferInput,
}

/// Every input kind, mirroring [`Output`](super::transaction_output::Output)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Input {
    Transfer(TransferInput),
    StakeableLock(StakeableLockInput),
    Locked(LockedInput),
}

impl Input {
    pub fn transfer(amount: u64) -> Self {
        Input::Transfer(TransferInput::new(amount))
    }

    /// Re-lock `transfer` until `stakeable_locktime`
    pub fn stakeable_lock(stakeable_locktime: u64, transfer: TransferInput) -> Self {
        Input::StakeableLock(StakeableLockInput {
            stakeable_locktime,
            transfer,
        })
    }

    pub fn locked(ids: LockedIds, transfer: TransferInput) -> Self {
        Input::Locked(LockedInput { ids, transfer })
    }

    pub fn type_id(&self) -> u32 {
        match self {
            Input::Transfer(_) => SECP_INPUT_ID,
            Input::StakeableLock(_) => STAKEABLE_LOCK_IN_ID,
            Input::Locked(_) => LOCKED_IN_ID,
        }
    }

    /// Type id of the credential that authorises this input
    pub fn credential_id(&self) -> u32 {
        SECP_CREDENTIAL_ID
    }

    fn inner(&self) -> &TransferInput {
        match self {
            Input::Transfer(t) => t,
            Input::StakeableLock(s) => &s.transfer,
            Input::Locked(l) => &l.transfer,
        }
    }

    fn inner_mut(&mut self) -> &mut TransferInput {
        match self {
            Input::Transfer(t) => t,
            Input::StakeableLock(s) => &mut s.transfer,
            Input::Locked(l) => &mut l.transfer,
        }
    }

    pub fn amount(&self) -> u64 {
        self.inner().amount
    }

    pub fn sig_idxs(&self) -> &[SigIdx] {
        &self.inner().sig_idxs
    }

    /// Append a signer; credential signatures must follow the same order
    pub fn add_signature_idx(&mut self, address_idx: u32, address: Address) {
        self.inner_mut()
            .sig_idxs
            .push(SigIdx::new(address_idx, address));
    }

    pub fn read_tagged(type_id: u32, reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        match type_id {
            SECP_INPUT_ID => Ok(Input::Transfer(TransferInput::read_from(reader)?)),
            STAKEABLE_LOCK_IN_ID => {
                let stakeable_locktime = reader.get_u64()?;
                let transfer = read_nested_transfer(reader)?;
                Ok(Input::stakeable_lock(stakeable_locktime, transfer))
            }
            LOCKED_IN_ID => {
                let ids = LockedIds::read_from(reader)?;
                let transfer = read_nested_transfer(reader)?;
                Ok(Input::locked(ids, transfer))
            }
            other => Err(DataStructureError::UnknownTypeId {
                kind: "input",
                type_id: other,
            }
            .into()),
        }
    }

    pub fn write_body(&self, writer: &mut ByteWriter) {
        match self {
            Input::Transfer(t) => t.write_to(writer),
            Input::StakeableLock(s) => {
                writer.put_u64(s.stakeable_locktime);
                writer.put_u32(SECP_INPUT_ID);
                s.transfer.write_to(writer);
            }
            Input::Locked(l) => {
                l.ids.write_to(writer);
                writer.put_u32(SECP_INPUT_ID);
                l.transfer.write_to(writer);
            }
        }
    }
}

fn read_nested_transfer(reader: &mut ByteReader<'_>) -> WalletResult<TransferInput> {
    let inner_id = reader.get_u32()?;
    if inner_id != SECP_INPUT_ID {
        return Err(DataStructureError::UnknownTypeId {
            kind: "nested input",
            type_id: inner_id,
        }
        .into());
    }
    TransferInput::read_from(reader)
}

impl ByteCodec for Input {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.type_id());
        self.write_body(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let type_id = reader.get_u32()?;
        Self::read_tagged(type_id, reader)
    }
}

impl Serializable for Input {
    fn type_name(&self) -> &'static str {
        match self {
            Input::Transfer(_) => "SECPTransferInput",
            Input::StakeableLock(_) => "StakeableLockIn",
            Input::Locked(_) => "LockedIn",
        }
    }

    fn type_id(&self) -> Option<u32> {
        Some(Input::type_id(self))
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        match self {
            Input::Transfer(t) => {
                fields.insert("amount".into(), u64_value(t.amount));
                let idxs = t
                    .sig_idxs
                    .iter()
                    .map(|s| u64_value(s.address_idx.into()))
                    .collect();
                fields.insert("sigIdxs".into(), Value::Array(idxs));
            }
            Input::StakeableLock(s) => {
                fields.insert("stakeableLocktime".into(), u64_value(s.stakeable_locktime));
                fields.insert(
                    "transferableInput".into(),
                    Input::Transfer(s.transfer.clone()).serialize_json(ctx, encoding)?,
                );
            }
            Input::Locked(l) => {
                fields.insert(
                    "depositTxID".into(),
                    ctx.bytes_field(l.ids.deposit_tx_id.as_bytes(), encoding)?,
                );
                fields.insert(
                    "bondTxID".into(),
                    ctx.bytes_field(l.ids.bond_tx_id.as_bytes(), encoding)?,
                );
                fields.insert(
                    "transferableInput".into(),
                    Input::Transfer(l.transfer.clone()).serialize_json(ctx, encoding)?,
                );
            }
        }
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        let nested = |fields: &Fields| -> WalletResult<TransferInput> {
            let inner_fields = get_object(fields, "transferableInput")?;
            let inner = Input::deserialize_fields(inner_fields, ctx, encoding)?;
            check_header(inner_fields, &inner)?;
            match inner {
                Input::Transfer(t) => Ok(t),
                other => Err(DataStructureError::UnknownTypeId {
                    kind: "nested input",
                    type_id: other.type_id(),
                }
                .into()),
            }
        };
        match get_u32(fields, "_typeID")? {
            SECP_INPUT_ID => {
                let mut transfer = TransferInput::new(get_u64(fields, "amount")?);
                for idx in get_array(fields, "sigIdxs")? {
                    let address_idx = value_u64(idx, "sigIdxs")?;
                    transfer.sig_idxs.push(SigIdx {
                        address_idx: u32::try_from(address_idx).map_err(|_| {
                            DataStructureError::InvalidInput(format!(
                                "signature index {address_idx} out of range"
                            ))
                        })?,
                        source: None,
                    });
                }
                Ok(Input::Transfer(transfer))
            }
            STAKEABLE_LOCK_IN_ID => Ok(Input::stakeable_lock(
                get_u64(fields, "stakeableLocktime")?,
                nested(fields)?,
            )),
            LOCKED_IN_ID => Ok(Input::locked(
                LockedIds::new(
                    TxId::new(ctx.field_array(get_field(fields, "depositTxID")?, encoding)?),
                    TxId::new(ctx.field_array(get_field(fields, "bondTxID")?, encoding)?),
                ),
                nested(fields)?,
            )),
            other => Err(DataStructureError::UnknownTypeId {
                kind: "input",
                type_id: other,
            }
            .into()),
        }
    }
}

/// An input bound to the UTXO it consumes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferableInput {
    pub tx_id: TxId,
    pub output_idx: u32,
    pub asset_id: AssetId,
    pub input: Input,
}

impl TransferableInput {
    pub fn new(tx_id: TxId, output_idx: u32, asset_id: AssetId, input: Input) -> Self {
        Self {
            tx_id,
            output_idx,
            asset_id,
            input,
        }
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn amount(&self) -> u64 {
        self.input.amount()
    }
}

/// `[32B tx id][4B output index][32B asset id][4B type id][body]`
impl ByteCodec for TransferableInput {
    fn write_to(&self, writer: &mut ByteWriter) {
        self.tx_id.write_to(writer);
        writer.put_u32(self.output_idx);
        self.asset_id.write_to(writer);
        self.input.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        Ok(Self {
            tx_id: TxId::read_from(reader)?,
            output_idx: reader.get_u32()?,
            asset_id: AssetId::read_from(reader)?,
            input: Input::read_from(reader)?,
        })
    }
}

impl PartialOrd for TransferableInput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TransferableInput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Serializable for TransferableInput {
    fn type_name(&self) -> &'static str {
        "TransferableInput"
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert("txid".into(), ctx.bytes_field(self.tx_id.as_bytes(), encoding)?);
        fields.insert("outputidx".into(), u64_value(self.output_idx.into()));
        fields.insert(
            "assetID".into(),
            ctx.bytes_field(self.asset_id.as_bytes(), encoding)?,
        );
        fields.insert("input".into(), self.input.serialize_json(ctx, encoding)?);
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        Ok(Self {
            tx_id: TxId::new(ctx.field_array(get_field(fields, "txid")?, encoding)?),
            output_idx: get_u32(fields, "outputidx")?,
            asset_id: AssetId::new(ctx.field_array(get_field(fields, "assetID")?, encoding)?),
            input: Input::deserialize_json(get_field(fields, "input")?, ctx, encoding)?,
        })
    }
}

/// Sorted copy of `inputs` in canonical wire order
pub fn sorted_inputs(inputs: &[TransferableInput]) -> Vec<TransferableInput> {
    let mut keyed: Vec<(Vec<u8>, &TransferableInput)> =
        inputs.iter().map(|i| (i.to_bytes(), i)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, i)| i.clone()).collect()
}
