use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data_structures::{
        constants::{ADDRESS_LEN, SECP_CREDENTIAL_ID, SECP_MULTISIG_CREDENTIAL_ID, SIGNATURE_LEN},
        transaction_input::SigIdx,
        types::{Address, Signature},
    },
    encoding::{
        serialization::{get_array, get_field, get_u32, value_u64},
        ByteCodec, ByteReader, ByteWriter, Encoding, Fields, Serializable, Serialization,
    },
    errors::{DataStructureError, SerializationError, WalletResult},
};

/// Signatures authorising one input, in the same order as its signer indices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Credential {
    Secp {
        signatures: Vec<Signature>,
    },
    /// Also records which owner each signature came from
    Multisig {
        signatures: Vec<Signature>,
        sig_idxs: Vec<SigIdx>,
    },
}

impl Credential {
    pub fn secp() -> Self {
        Credential::Secp {
            signatures: Vec::new(),
        }
    }

    pub fn multisig() -> Self {
        Credential::Multisig {
            signatures: Vec::new(),
            sig_idxs: Vec::new(),
        }
    }

    pub fn from_type_id(type_id: u32) -> WalletResult<Self> {
        match type_id {
            SECP_CREDENTIAL_ID => Ok(Self::secp()),
            SECP_MULTISIG_CREDENTIAL_ID => Ok(Self::multisig()),
            other => Err(DataStructureError::UnknownTypeId {
                kind: "credential",
                type_id: other,
            }
            .into()),
        }
    }

    pub fn type_id(&self) -> u32 {
        match self {
            Credential::Secp { .. } => SECP_CREDENTIAL_ID,
            Credential::Multisig { .. } => SECP_MULTISIG_CREDENTIAL_ID,
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        match self {
            Credential::Secp { signatures } | Credential::Multisig { signatures, .. } => signatures,
        }
    }

    pub fn add_signature(&mut self, signature: Signature) {
        match self {
            Credential::Secp { signatures } | Credential::Multisig { signatures, .. } => {
                signatures.push(signature)
            }
        }
    }

    /// Record the signer of the next signature; ignored by plain credentials
    pub fn add_sig_idx(&mut self, address_idx: u32, address: Address) {
        if let Credential::Multisig { sig_idxs, .. } = self {
            sig_idxs.push(SigIdx::new(address_idx, address));
        }
    }

    pub fn read_tagged(type_id: u32, reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let mut credential = Self::from_type_id(type_id)?;
        let count = reader.get_count(SIGNATURE_LEN)?;
        for _ in 0..count {
            credential.add_signature(Signature::read_from(reader)?);
        }
        if let Credential::Multisig { sig_idxs, .. } = &mut credential {
            let count = reader.get_count(4 + ADDRESS_LEN)?;
            for _ in 0..count {
                let address_idx = reader.get_u32()?;
                let address = Address::read_from(reader)?;
                sig_idxs.push(SigIdx::new(address_idx, address));
            }
        }
        Ok(credential)
    }

    pub fn write_body(&self, writer: &mut ByteWriter) {
        let signatures = self.signatures();
        writer.put_u32(signatures.len() as u32);
        for signature in signatures {
            signature.write_to(writer);
        }
        if let Credential::Multisig { sig_idxs, .. } = self {
            writer.put_u32(sig_idxs.len() as u32);
            for sig in sig_idxs {
                writer.put_u32(sig.address_idx);
                sig.source.unwrap_or_default().write_to(writer);
            }
        }
    }
}

/// `[4B type id][4B sig count][count x 65B signature]`, multisig appends
/// `[4B idx count][count x (4B index, 20B address)]`
impl ByteCodec for Credential {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.type_id());
        self.write_body(writer);
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let type_id = reader.get_u32()?;
        Self::read_tagged(type_id, reader)
    }
}

impl Serializable for Credential {
    fn type_name(&self) -> &'static str {
        match self {
            Credential::Secp { .. } => "SECPCredential",
            Credential::Multisig { .. } => "SECPMultisigCredential",
        }
    }

    fn type_id(&self) -> Option<u32> {
        Some(Credential::type_id(self))
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        let signatures = self
            .signatures()
            .iter()
            .map(|s| ctx.bytes_field(s.as_bytes(), encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        fields.insert("sigArray".into(), Value::Array(signatures));
        if let Credential::Multisig { sig_idxs, .. } = self {
            let idxs = sig_idxs
                .iter()
                .map(|s| {
                    let mut entry = Fields::new();
                    entry.insert("idx".into(), Value::String(s.address_idx.to_string()));
                    entry.insert(
                        "source".into(),
                        ctx.bytes_field(s.source.unwrap_or_default().as_bytes(), encoding)?,
                    );
                    Ok(Value::Object(entry))
                })
                .collect::<WalletResult<Vec<_>>>()?;
            fields.insert("sigIdxs".into(), Value::Array(idxs));
        }
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        let mut credential = Self::from_type_id(get_u32(fields, "_typeID")?)?;
        for value in get_array(fields, "sigArray")? {
            credential.add_signature(Signature::new(ctx.field_array(value, encoding)?));
        }
        if let Credential::Multisig { sig_idxs, .. } = &mut credential {
            for entry in get_array(fields, "sigIdxs")? {
                let idx = value_u64(get_field_of(entry, "idx")?, "idx")?;
                let address_idx = u32::try_from(idx).map_err(|_| {
                    DataStructureError::InvalidInput(format!("signature index {idx} out of range"))
                })?;
                let source = Address::new(ctx.field_array(get_field_of(entry, "source")?, encoding)?);
                sig_idxs.push(SigIdx::new(address_idx, source));
            }
        }
        Ok(credential)
    }
}

fn get_field_of<'a>(entry: &'a Value, name: &str) -> WalletResult<&'a Value> {
    let fields = entry.as_object().ok_or_else(|| {
        SerializationError::TypeMismatch {
            field: name.to_string(),
            expected: "object".into(),
            actual: entry.to_string(),
        }
    })?;
    get_field(fields, name)
}
