use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        constants::{
            LOCKED_OUT_ID, SECP_OWNER_OUTPUT_ID, SECP_TRANSFER_OUTPUT_ID, STAKEABLE_LOCK_OUT_ID,
        },
        output_owners::{Ownable, OutputOwners},
        types::{Address, AssetId, TxId},
    },
    encoding::{
        serialization::{check_header, get_field, get_object, get_u32, get_u64, u64_value},
        ByteCodec, ByteReader, ByteWriter, Encoding, Fields, Serializable, Serialization,
    },
    errors::{DataStructureError, WalletResult},
};

/// Value-bearing output paying `amount` to its owners
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferOutput {
    pub amount: u64,
    pub owners: OutputOwners,
}

impl TransferOutput {
    pub fn new(amount: u64, owners: OutputOwners) -> Self {
        Self { amount, owners }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl Ownable for TransferOutput {
    fn owners(&self) -> &OutputOwners {
        &self.owners
    }
}

impl ByteCodec for TransferOutput {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u64(self.amount);
        self.owners.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let amount = reader.get_u64()?;
        let owners = OutputOwners::read_from(reader)?;
        Ok(Self { amount, owners })
    }
}

/// Ownership without value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerOutput {
    pub owners: OutputOwners,
}

impl Ownable for OwnerOutput {
    fn owners(&self) -> &OutputOwners {
        &self.owners
    }
}

/// Transfer output that can only be staked until `stakeable_locktime`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StakeableLockOutput {
    pub stakeable_locktime: u64,
    pub transfer: TransferOutput,
}

impl StakeableLockOutput {
    pub fn new(stakeable_locktime: u64, transfer: TransferOutput) -> Self {
        Self {
            stakeable_locktime,
            transfer,
        }
    }

    /// Still restricted to staking at `as_of`
    pub fn is_locked_at(&self, as_of: u64) -> bool {
        self.stakeable_locktime > as_of
    }
}

impl Ownable for StakeableLockOutput {
    fn owners(&self) -> &OutputOwners {
        &self.transfer.owners
    }
}

/// Deposit and bond transaction references restricting a [`LockedOutput`].
/// An all-zero id means "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedIds {
    pub deposit_tx_id: TxId,
    pub bond_tx_id: TxId,
}

impl LockedIds {
    pub fn new(deposit_tx_id: TxId, bond_tx_id: TxId) -> Self {
        Self {
            deposit_tx_id,
            bond_tx_id,
        }
    }

    pub fn is_deposited(&self) -> bool {
        !self.deposit_tx_id.is_empty()
    }

    pub fn is_bonded(&self) -> bool {
        !self.bond_tx_id.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_deposited() && !self.is_bonded()
    }
}

impl ByteCodec for LockedIds {
    fn write_to(&self, writer: &mut ByteWriter) {
        self.deposit_tx_id.write_to(writer);
        self.bond_tx_id.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        Ok(Self {
            deposit_tx_id: TxId::read_from(reader)?,
            bond_tx_id: TxId::read_from(reader)?,
        })
    }
}

/// Transfer output held by a deposit and/or bond
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedOutput {
    pub ids: LockedIds,
    pub transfer: TransferOutput,
}

impl Ownable for LockedOutput {
    fn owners(&self) -> &OutputOwners {
        &self.transfer.owners
    }
}

/// Every output kind, dispatched by its wire type id.
///
/// `StakeableLock` and `Locked` are exclusive wrappers: each wraps a plain
/// transfer, never the other wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Output {
    Transfer(TransferOutput),
    OwnerOnly(OwnerOutput),
    StakeableLock(StakeableLockOutput),
    Locked(LockedOutput),
}

impl Output {
    pub fn transfer(
        amount: u64,
        addresses: Vec<Address>,
        locktime: u64,
        threshold: u32,
    ) -> WalletResult<Self> {
        Ok(Output::Transfer(TransferOutput::new(
            amount,
            OutputOwners::new(addresses, locktime, threshold)?,
        )))
    }

    pub fn owner_only(
        addresses: Vec<Address>,
        locktime: u64,
        threshold: u32,
    ) -> WalletResult<Self> {
        Ok(Output::OwnerOnly(OwnerOutput {
            owners: OutputOwners::new(addresses, locktime, threshold)?,
        }))
    }

    pub fn stakeable_lock(stakeable_locktime: u64, transfer: TransferOutput) -> Self {
        Output::StakeableLock(StakeableLockOutput::new(stakeable_locktime, transfer))
    }

    pub fn locked(ids: LockedIds, transfer: TransferOutput) -> Self {
        Output::Locked(LockedOutput { ids, transfer })
    }

    pub fn type_id(&self) -> u32 {
        match self {
            Output::Transfer(_) => SECP_TRANSFER_OUTPUT_ID,
            Output::OwnerOnly(_) => SECP_OWNER_OUTPUT_ID,
            Output::StakeableLock(_) => STAKEABLE_LOCK_OUT_ID,
            Output::Locked(_) => LOCKED_OUT_ID,
        }
    }

    /// Value carried by the output, `None` for ownership-only outputs
    pub fn amount(&self) -> Option<u64> {
        self.transfer_output().map(|t| t.amount)
    }

    /// The plain transfer at the core of an amount-bearing output
    pub fn transfer_output(&self) -> Option<&TransferOutput> {
        match self {
            Output::Transfer(t) => Some(t),
            Output::OwnerOnly(_) => None,
            Output::StakeableLock(s) => Some(&s.transfer),
            Output::Locked(l) => Some(&l.transfer),
        }
    }

    pub fn stakeable_locktime(&self) -> Option<u64> {
        match self {
            Output::StakeableLock(s) => Some(s.stakeable_locktime),
            _ => None,
        }
    }

    pub fn locked_ids(&self) -> Option<&LockedIds> {
        match self {
            Output::Locked(l) => Some(&l.ids),
            _ => None,
        }
    }

    pub fn is_stakeable_locked_at(&self, as_of: u64) -> bool {
        matches!(self, Output::StakeableLock(s) if s.is_locked_at(as_of))
    }

    /// Maps a type id to the parser for that output kind
    pub fn read_tagged(type_id: u32, reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        match type_id {
            SECP_TRANSFER_OUTPUT_ID => Ok(Output::Transfer(TransferOutput::read_from(reader)?)),
            SECP_OWNER_OUTPUT_ID => Ok(Output::OwnerOnly(OwnerOutput {
                owners: OutputOwners::read_from(reader)?,
            })),
            STAKEABLE_LOCK_OUT_ID => {
                let stakeable_locktime = reader.get_u64()?;
                let transfer = read_nested_transfer(reader)?;
                Ok(Output::stakeable_lock(stakeable_locktime, transfer))
            }
            LOCKED_OUT_ID => {
                let ids = LockedIds::read_from(reader)?;
                let transfer = read_nested_transfer(reader)?;
                Ok(Output::locked(ids, transfer))
            }
            other => Err(DataStructureError::UnknownTypeId {
                kind: "output",
                type_id: other,
            }
            .into()),
        }
    }

    /// Body bytes without the leading type id
    pub fn write_body(&self, writer: &mut ByteWriter) {
        match self {
            Output::Transfer(t) => t.write_to(writer),
            Output::OwnerOnly(o) => o.owners.write_to(writer),
            Output::StakeableLock(s) => {
                writer.put_u64(s.stakeable_locktime);
                writer.put_u32(SECP_TRANSFER_OUTPUT_ID);
                s.transfer.write_to(writer);
            }
            Output::Locked(l) => {
                l.ids.write_to(writer);
                writer.put_u32(SECP_TRANSFER_OUTPUT_ID);
                l.transfer.write_to(writer);
            }
        }
    }
}

fn read_nested_transfer(reader: &mut ByteReader<'_>) -> WalletResult<TransferOutput> {
    let inner_id = reader.get_u32()?;
    if inner_id != SECP_TRANSFER_OUTPUT_ID {
        return Err(DataStructureError::UnknownTypeId {
            kind: "nested output",
            type_id: inner_id,
        }
        .into());
    }
    TransferOutput::read_from(reader)
}

impl Ownable for Output {
    fn owners(&self) -> &OutputOwners {
        match self {
            Output::Transfer(t) => t.owners(),
            Output::OwnerOnly(o) => o.owners(),
            Output::StakeableLock(s) => s.owners(),
            Output::Locked(l) => l.owners(),
        }
    }
}

/// `[4B type id][body]`
impl ByteCodec for Output {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.type_id());
        self.write_body(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let type_id = reader.get_u32()?;
        Self::read_tagged(type_id, reader)
    }
}

/// Canonical order: type id then body, compared as bytes
impl PartialOrd for Output {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Output {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Serializable for Output {
    fn type_name(&self) -> &'static str {
        match self {
            Output::Transfer(_) => "SECPTransferOutput",
            Output::OwnerOnly(_) => "SECPOwnerOutput",
            Output::StakeableLock(_) => "StakeableLockOut",
            Output::Locked(_) => "LockedOut",
        }
    }

    fn type_id(&self) -> Option<u32> {
        Some(Output::type_id(self))
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        match self {
            Output::Transfer(t) => {
                fields.insert("amount".into(), u64_value(t.amount));
                fields.insert("owners".into(), t.owners.serialize_json(ctx, encoding)?);
            }
            Output::OwnerOnly(o) => {
                fields.insert("owners".into(), o.owners.serialize_json(ctx, encoding)?);
            }
            Output::StakeableLock(s) => {
                fields.insert("stakeableLocktime".into(), u64_value(s.stakeable_locktime));
                fields.insert(
                    "transferableOutput".into(),
                    Output::Transfer(s.transfer.clone()).serialize_json(ctx, encoding)?,
                );
            }
            Output::Locked(l) => {
                fields.insert(
                    "depositTxID".into(),
                    ctx.bytes_field(l.ids.deposit_tx_id.as_bytes(), encoding)?,
                );
                fields.insert(
                    "bondTxID".into(),
                    ctx.bytes_field(l.ids.bond_tx_id.as_bytes(), encoding)?,
                );
                fields.insert(
                    "transferableOutput".into(),
                    Output::Transfer(l.transfer.clone()).serialize_json(ctx, encoding)?,
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
        let type_id = get_u32(fields, "_typeID")?;
        let nested = |fields: &Fields| -> WalletResult<TransferOutput> {
            let inner_fields = get_object(fields, "transferableOutput")?;
            let inner = Output::deserialize_fields(inner_fields, ctx, encoding)?;
            check_header(inner_fields, &inner)?;
            match inner {
                Output::Transfer(t) => Ok(t),
                other => Err(DataStructureError::UnknownTypeId {
                    kind: "nested output",
                    type_id: other.type_id(),
                }
                .into()),
            }
        };
        match type_id {
            SECP_TRANSFER_OUTPUT_ID => Ok(Output::Transfer(TransferOutput::new(
                get_u64(fields, "amount")?,
                OutputOwners::deserialize_json(get_field(fields, "owners")?, ctx, encoding)?,
            ))),
            SECP_OWNER_OUTPUT_ID => Ok(Output::OwnerOnly(OwnerOutput {
                owners: OutputOwners::deserialize_json(get_field(fields, "owners")?, ctx, encoding)?,
            })),
            STAKEABLE_LOCK_OUT_ID => Ok(Output::stakeable_lock(
                get_u64(fields, "stakeableLocktime")?,
                nested(fields)?,
            )),
            LOCKED_OUT_ID => Ok(Output::locked(
                LockedIds::new(
                    TxId::new(ctx.field_array(get_field(fields, "depositTxID")?, encoding)?),
                    TxId::new(ctx.field_array(get_field(fields, "bondTxID")?, encoding)?),
                ),
                nested(fields)?,
            )),
            other => Err(DataStructureError::UnknownTypeId {
                kind: "output",
                type_id: other,
            }
            .into()),
        }
    }
}

/// An output tagged with the asset it carries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferableOutput {
    pub asset_id: AssetId,
    pub output: Output,
}

impl TransferableOutput {
    pub fn new(asset_id: AssetId, output: Output) -> Self {
        Self { asset_id, output }
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn amount(&self) -> u64 {
        self.output.amount().unwrap_or_default()
    }
}

/// `[32B asset id][4B type id][body]`
impl ByteCodec for TransferableOutput {
    fn write_to(&self, writer: &mut ByteWriter) {
        self.asset_id.write_to(writer);
        self.output.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let asset_id = AssetId::read_from(reader)?;
        let output = Output::read_from(reader)?;
        Ok(Self { asset_id, output })
    }
}

impl PartialOrd for TransferableOutput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TransferableOutput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Display for TransferableOutput {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            fmt,
            "{} x {} (type {}, locktime {}, threshold {}, {} owners)",
            self.asset_id,
            self.amount(),
            self.output.type_id(),
            self.output.locktime(),
            self.output.threshold(),
            self.output.addresses().len()
        )
    }
}

impl Serializable for TransferableOutput {
    fn type_name(&self) -> &'static str {
        "TransferableOutput"
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert(
            "assetID".into(),
            ctx.bytes_field(self.asset_id.as_bytes(), encoding)?,
        );
        fields.insert("output".into(), self.output.serialize_json(ctx, encoding)?);
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        Ok(Self {
            asset_id: AssetId::new(ctx.field_array(get_field(fields, "assetID")?, encoding)?),
            output: Output::deserialize_json(get_field(fields, "output")?, ctx, encoding)?,
        })
    }
}

/// Sorted copy of `outputs` in canonical wire order
pub fn sorted_outputs(outputs: &[TransferableOutput]) -> Vec<TransferableOutput> {
    let mut keyed: Vec<(Vec<u8>, &TransferableOutput)> =
        outputs.iter().map(|o| (o.to_bytes(), o)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, o)| o.clone()).collect()
}
