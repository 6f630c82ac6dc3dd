//! Transaction envelope: the base body, its unsigned wrapper and the signed form

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::{
    data_structures::{
        constants::{BASE_TX_ID, EXPORT_TX_ID, ID_LEN, IMPORT_TX_ID, LATEST_CODEC},
        credential::Credential,
        transaction_input::{sorted_inputs, TransferableInput},
        transaction_output::{sorted_outputs, TransferableOutput},
        types::{ChainId, TxId},
    },
    encoding::{
        bintools,
        serialization::{get_array, get_field, get_u32, u64_value},
        ByteCodec, ByteReader, ByteWriter, Encoding, Fields, Serializable, Serialization,
    },
    errors::{DataStructureError, ValidationError, WalletError, WalletResult},
    signing::Signer,
};

/// Network, chain, outputs, inputs and memo shared by every transaction type.
///
/// Outputs and inputs are kept in the order they were added; the bytes always
/// use the canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub outs: Vec<TransferableOutput>,
    pub ins: Vec<TransferableInput>,
    pub memo: Vec<u8>,
}

impl BaseTx {
    pub fn new(
        network_id: u32,
        blockchain_id: ChainId,
        outs: Vec<TransferableOutput>,
        ins: Vec<TransferableInput>,
        memo: Vec<u8>,
    ) -> Self {
        Self {
            network_id,
            blockchain_id,
            outs,
            ins,
            memo,
        }
    }

    /// Copy with outputs and inputs in canonical order
    pub fn canonical(&self) -> Self {
        Self {
            network_id: self.network_id,
            blockchain_id: self.blockchain_id,
            outs: sorted_outputs(&self.outs),
            ins: sorted_inputs(&self.ins),
            memo: self.memo.clone(),
        }
    }

    pub fn total_input(&self) -> u64 {
        self.ins.iter().map(|i| i.amount()).sum()
    }

    pub fn total_output(&self) -> u64 {
        self.outs.iter().map(|o| o.amount()).sum()
    }
}

/// `[4B network][32B chain][4B n][outs][4B n][ins][4B len][memo]`
impl ByteCodec for BaseTx {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.network_id);
        self.blockchain_id.write_to(writer);
        let outs = sorted_outputs(&self.outs);
        writer.put_u32(outs.len() as u32);
        for out in &outs {
            out.write_to(writer);
        }
        let ins = sorted_inputs(&self.ins);
        writer.put_u32(ins.len() as u32);
        for input in &ins {
            input.write_to(writer);
        }
        writer.put_var_bytes(&self.memo);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let network_id = reader.get_u32()?;
        let blockchain_id = ChainId::read_from(reader)?;
        let out_count = reader.get_count(ID_LEN + 4)?;
        let outs = (0..out_count)
            .map(|_| TransferableOutput::read_from(reader))
            .collect::<WalletResult<Vec<_>>>()?;
        let in_count = reader.get_count(2 * ID_LEN + 8)?;
        let ins = (0..in_count)
            .map(|_| TransferableInput::read_from(reader))
            .collect::<WalletResult<Vec<_>>>()?;
        let memo = reader.get_var_bytes()?;
        Ok(Self {
            network_id,
            blockchain_id,
            outs,
            ins,
            memo,
        })
    }
}

impl Serializable for BaseTx {
    fn type_name(&self) -> &'static str {
        "BaseTx"
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert("networkID".into(), u64_value(self.network_id.into()));
        fields.insert(
            "blockchainID".into(),
            ctx.bytes_field(self.blockchain_id.as_bytes(), encoding)?,
        );
        let outs = sorted_outputs(&self.outs)
            .iter()
            .map(|o| o.serialize_json(ctx, encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        fields.insert("outs".into(), Value::Array(outs));
        let ins = sorted_inputs(&self.ins)
            .iter()
            .map(|i| i.serialize_json(ctx, encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        fields.insert("ins".into(), Value::Array(ins));
        fields.insert("memo".into(), ctx.bytes_field(&self.memo, Encoding::Hex)?);
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        let outs = get_array(fields, "outs")?
            .iter()
            .map(|v| TransferableOutput::deserialize_json(v, ctx, encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        let ins = get_array(fields, "ins")?
            .iter()
            .map(|v| TransferableInput::deserialize_json(v, ctx, encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        Ok(Self {
            network_id: get_u32(fields, "networkID")?,
            blockchain_id: ChainId::new(
                ctx.field_array(get_field(fields, "blockchainID")?, encoding)?,
            ),
            outs,
            ins,
            memo: ctx.field_bytes(get_field(fields, "memo")?, Encoding::Hex)?,
        })
    }
}

/// A [`BaseTx`] tagged with its codec version and transaction type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub codec_id: u16,
    pub type_id: u32,
    pub base_tx: BaseTx,
}

impl UnsignedTx {
    pub fn new(base_tx: BaseTx) -> Self {
        Self::with_type(BASE_TX_ID, base_tx)
    }

    pub fn with_type(type_id: u32, base_tx: BaseTx) -> Self {
        Self {
            codec_id: LATEST_CODEC,
            type_id,
            base_tx,
        }
    }

    pub fn base_tx(&self) -> &BaseTx {
        &self.base_tx
    }

    /// Digest every credential signature commits to
    pub fn message_hash(&self) -> [u8; 32] {
        bintools::sha256(&self.to_bytes())
    }

    /// Sign every input in canonical order, one signature per signer index
    pub fn sign(&self, signer: &dyn Signer) -> WalletResult<Tx> {
        let message = self.message_hash();
        let mut credentials = Vec::with_capacity(self.base_tx.ins.len());
        for input in sorted_inputs(&self.base_tx.ins) {
            let mut credential = Credential::from_type_id(input.input().credential_id())?;
            for sig_idx in input.input().sig_idxs() {
                let source = sig_idx.source.ok_or_else(|| {
                    WalletError::Signing(format!(
                        "signer index {} of input {}:{} has no source address",
                        sig_idx.address_idx, input.tx_id, input.output_idx
                    ))
                })?;
                credential.add_signature(signer.sign(&message, &source)?);
            }
            credentials.push(credential);
        }
        trace!(
            inputs = self.base_tx.ins.len(),
            credentials = credentials.len(),
            "Signed transaction"
        );
        Ok(Tx {
            unsigned: self.clone(),
            credentials,
        })
    }
}

fn check_tx_type(type_id: u32) -> WalletResult<u32> {
    match type_id {
        BASE_TX_ID | IMPORT_TX_ID | EXPORT_TX_ID => Ok(type_id),
        _ => Err(DataStructureError::UnknownTypeId {
            kind: "transaction",
            type_id,
        }
        .into()),
    }
}

/// `[2B codec][4B type][base tx]`
impl ByteCodec for UnsignedTx {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u16(self.codec_id);
        writer.put_u32(self.type_id);
        self.base_tx.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let codec_id = reader.get_u16()?;
        let type_id = check_tx_type(reader.get_u32()?)?;
        Ok(Self {
            codec_id,
            type_id,
            base_tx: BaseTx::read_from(reader)?,
        })
    }
}

impl Serializable for UnsignedTx {
    fn type_name(&self) -> &'static str {
        "UnsignedTx"
    }

    fn type_id(&self) -> Option<u32> {
        Some(self.type_id)
    }

    fn codec_id(&self) -> Option<u16> {
        Some(self.codec_id)
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert(
            "transaction".into(),
            self.base_tx.serialize_json(ctx, encoding)?,
        );
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        Ok(Self {
            codec_id: get_u32(fields, "_codecID")? as u16,
            type_id: check_tx_type(get_u32(fields, "_typeID")?)?,
            base_tx: BaseTx::deserialize_json(get_field(fields, "transaction")?, ctx, encoding)?,
        })
    }
}

/// A signed transaction: the unsigned body plus one credential per input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub unsigned: UnsignedTx,
    pub credentials: Vec<Credential>,
}

impl Tx {
    pub fn new(unsigned: UnsignedTx, credentials: Vec<Credential>) -> Self {
        Self {
            unsigned,
            credentials,
        }
    }

    pub fn unsigned(&self) -> &UnsignedTx {
        &self.unsigned
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// SHA-256 of the signed bytes
    pub fn id(&self) -> TxId {
        TxId::new(bintools::sha256(&self.to_bytes()))
    }

    pub fn to_cb58(&self) -> String {
        bintools::cb58_encode(&self.to_bytes())
    }

    pub fn from_cb58(input: &str) -> WalletResult<Self> {
        Self::from_bytes(&bintools::cb58_decode(input)?)
    }

    /// Check that credential `i` carries exactly one signature per signer
    /// index of canonical input `i`
    pub fn verify_credential_alignment(&self) -> WalletResult<()> {
        let inputs = sorted_inputs(&self.unsigned.base_tx.ins);
        if inputs.len() != self.credentials.len() {
            return Err(ValidationError::CredentialValidationFailed(format!(
                "{} inputs but {} credentials",
                inputs.len(),
                self.credentials.len()
            ))
            .into());
        }
        for (position, (input, credential)) in inputs.iter().zip(&self.credentials).enumerate() {
            let expected = input.input().sig_idxs().len();
            let actual = credential.signatures().len();
            if expected != actual {
                return Err(ValidationError::CredentialValidationFailed(format!(
                    "credential {position} has {actual} signatures, input expects {expected}"
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// `[unsigned tx][4B n][n x (4B credential type, credential body)]`
impl ByteCodec for Tx {
    fn write_to(&self, writer: &mut ByteWriter) {
        self.unsigned.write_to(writer);
        writer.put_u32(self.credentials.len() as u32);
        for credential in &self.credentials {
            credential.write_to(writer);
        }
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let unsigned = UnsignedTx::read_from(reader)?;
        let count = reader.get_count(8)?;
        let credentials = (0..count)
            .map(|_| Credential::read_from(reader))
            .collect::<WalletResult<Vec<_>>>()?;
        Ok(Self {
            unsigned,
            credentials,
        })
    }
}

impl Serializable for Tx {
    fn type_name(&self) -> &'static str {
        "Tx"
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert(
            "unsignedTx".into(),
            self.unsigned.serialize_json(ctx, encoding)?,
        );
        let credentials = self
            .credentials
            .iter()
            .map(|c| c.serialize_json(ctx, encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        fields.insert("credentials".into(), Value::Array(credentials));
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        let credentials = get_array(fields, "credentials")?
            .iter()
            .map(|v| Credential::deserialize_json(v, ctx, encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        Ok(Self {
            unsigned: UnsignedTx::deserialize_json(
                get_field(fields, "unsignedTx")?,
                ctx,
                encoding,
            )?,
            credentials,
        })
    }
}
