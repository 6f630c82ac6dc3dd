use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        constants::LATEST_CODEC,
        transaction_output::Output,
        types::{AssetId, TxId},
    },
    encoding::{
        bintools,
        serialization::{get_field, get_u32},
        ByteCodec, ByteReader, ByteWriter, Encoding, Fields, Serializable, Serialization,
    },
    errors::{DataStructureError, WalletError, WalletResult},
};

/// An unspent output together with the transaction position it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    pub codec_id: u16,
    pub tx_id: TxId,
    pub output_idx: u32,
    pub asset_id: AssetId,
    pub output: Output,
}

impl Utxo {
    pub fn new(tx_id: TxId, output_idx: u32, asset_id: AssetId, output: Output) -> Self {
        Self {
            codec_id: LATEST_CODEC,
            tx_id,
            output_idx,
            asset_id,
            output,
        }
    }

    /// Plain base-58 of the transaction id followed by the big-endian
    /// output index, no checksum
    pub fn id(&self) -> String {
        let mut writer = ByteWriter::with_capacity(36);
        self.tx_id.write_to(&mut writer);
        writer.put_u32(self.output_idx);
        bintools::base58_encode(&writer.into_bytes())
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn amount(&self) -> Option<u64> {
        self.output.amount()
    }

    pub fn to_cb58(&self) -> String {
        bintools::cb58_encode(&self.to_bytes())
    }

    pub fn from_cb58(input: &str) -> WalletResult<Self> {
        Self::from_bytes(&bintools::cb58_decode(input)?)
    }
}

/// `[2B codec][32B tx id][4B output index][32B asset id][4B type id][body]`
impl ByteCodec for Utxo {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u16(self.codec_id);
        self.tx_id.write_to(writer);
        writer.put_u32(self.output_idx);
        self.asset_id.write_to(writer);
        self.output.write_to(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let codec_id = reader.get_u16()?;
        if codec_id != LATEST_CODEC {
            return Err(DataStructureError::InvalidUtxo(format!(
                "unsupported codec version {codec_id}"
            ))
            .into());
        }
        Ok(Self {
            codec_id,
            tx_id: TxId::read_from(reader)?,
            output_idx: reader.get_u32()?,
            asset_id: AssetId::read_from(reader)?,
            output: Output::read_from(reader)?,
        })
    }
}

impl Display for Utxo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_cb58())
    }
}

impl FromStr for Utxo {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cb58(s)
    }
}

impl Serializable for Utxo {
    fn type_name(&self) -> &'static str {
        "UTXO"
    }

    fn codec_id(&self) -> Option<u16> {
        Some(self.codec_id)
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert("txid".into(), ctx.bytes_field(self.tx_id.as_bytes(), encoding)?);
        fields.insert(
            "outputidx".into(),
            ctx.bytes_field(&self.output_idx.to_be_bytes(), encoding)?,
        );
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
        let codec_id = match fields.get("_codecID") {
            Some(_) => get_u32(fields, "_codecID")? as u16,
            None => LATEST_CODEC,
        };
        let idx_bytes: [u8; 4] = ctx.field_array(get_field(fields, "outputidx")?, encoding)?;
        Ok(Self {
            codec_id,
            tx_id: TxId::new(ctx.field_array(get_field(fields, "txid")?, encoding)?),
            output_idx: u32::from_be_bytes(idx_bytes),
            asset_id: AssetId::new(ctx.field_array(get_field(fields, "assetID")?, encoding)?),
            output: Output::deserialize_json(get_field(fields, "output")?, ctx, encoding)?,
        })
    }
}
