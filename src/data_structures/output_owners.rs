use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data_structures::{constants::ADDRESS_LEN, types::Address},
    encoding::{
        serialization::{get_array, get_u32, get_u64, u64_value},
        ByteCodec, ByteReader, ByteWriter, Encoding, Fields, Serializable, Serialization,
    },
    errors::{DataStructureError, WalletResult},
};

/// Threshold-of-addresses ownership with an optional unlock time.
///
/// Addresses are kept sorted by byte value and free of duplicates, so the
/// serialized form and equality never depend on the order callers supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputOwners {
    locktime: u64,
    threshold: u32,
    addresses: Vec<Address>,
}

impl OutputOwners {
    pub fn new(addresses: Vec<Address>, locktime: u64, threshold: u32) -> WalletResult<Self> {
        let mut addresses = addresses;
        addresses.sort();
        addresses.dedup();
        if addresses.is_empty() {
            return Err(DataStructureError::InvalidOwners("empty address list".into()).into());
        }
        if threshold as usize > addresses.len() {
            return Err(DataStructureError::InvalidOwners(format!(
                "threshold {threshold} exceeds {} addresses",
                addresses.len()
            ))
            .into());
        }
        Ok(Self {
            locktime,
            threshold,
            addresses,
        })
    }

    pub fn locktime(&self) -> u64 {
        self.locktime
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Position of `address` in the sorted owner list
    pub fn get_address_idx(&self, address: &Address) -> Option<u32> {
        self.addresses
            .iter()
            .position(|a| a == address)
            .map(|idx| idx as u32)
    }

    pub fn get_address(&self, idx: u32) -> Option<&Address> {
        self.addresses.get(idx as usize)
    }

    /// The candidate addresses able to sign for this owner set at `as_of`,
    /// in owner order and capped at the threshold. Nothing is spendable
    /// while `as_of <= locktime`.
    pub fn get_spenders(&self, addresses: &[Address], as_of: u64) -> Vec<Address> {
        let mut qualified = Vec::new();
        if as_of <= self.locktime {
            return qualified;
        }
        let threshold = self.threshold as usize;
        for owner in &self.addresses {
            if qualified.len() >= threshold {
                break;
            }
            if addresses.contains(owner) {
                qualified.push(*owner);
            }
        }
        qualified
    }

    pub fn meets_threshold(&self, addresses: &[Address], as_of: u64) -> bool {
        if as_of <= self.locktime {
            return false;
        }
        self.get_spenders(addresses, as_of).len() >= self.threshold as usize
    }
}

impl ByteCodec for OutputOwners {
    fn write_to(&self, writer: &mut ByteWriter) {
        writer.put_u64(self.locktime);
        writer.put_u32(self.threshold);
        writer.put_u32(self.addresses.len() as u32);
        for address in &self.addresses {
            address.write_to(writer);
        }
    }

    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self> {
        let locktime = reader.get_u64()?;
        let threshold = reader.get_u32()?;
        let count = reader.get_count(ADDRESS_LEN)?;
        let addresses = (0..count)
            .map(|_| Address::read_from(reader))
            .collect::<WalletResult<Vec<_>>>()?;
        Self::new(addresses, locktime, threshold)
    }
}

impl Serializable for OutputOwners {
    fn type_name(&self) -> &'static str {
        "OutputOwners"
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut fields = Fields::new();
        fields.insert("locktime".into(), u64_value(self.locktime));
        fields.insert("threshold".into(), u64_value(self.threshold.into()));
        let addresses = self
            .addresses
            .iter()
            .map(|a| ctx.bytes_field(a.as_bytes(), encoding))
            .collect::<WalletResult<Vec<_>>>()?;
        fields.insert("addresses".into(), Value::Array(addresses));
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        let addresses = get_array(fields, "addresses")?
            .iter()
            .map(|v| Ok(Address::new(ctx.field_array(v, encoding)?)))
            .collect::<WalletResult<Vec<_>>>()?;
        Self::new(
            addresses,
            get_u64(fields, "locktime")?,
            get_u32(fields, "threshold")?,
        )
    }
}

/// Threshold, locktime and address logic shared by every output kind
pub trait Ownable {
    fn owners(&self) -> &OutputOwners;

    fn locktime(&self) -> u64 {
        self.owners().locktime()
    }

    fn threshold(&self) -> u32 {
        self.owners().threshold()
    }

    fn addresses(&self) -> &[Address] {
        self.owners().addresses()
    }

    fn get_address_idx(&self, address: &Address) -> Option<u32> {
        self.owners().get_address_idx(address)
    }

    fn get_spenders(&self, addresses: &[Address], as_of: u64) -> Vec<Address> {
        self.owners().get_spenders(addresses, as_of)
    }

    fn meets_threshold(&self, addresses: &[Address], as_of: u64) -> bool {
        self.owners().meets_threshold(addresses, as_of)
    }
}

impl Ownable for OutputOwners {
    fn owners(&self) -> &OutputOwners {
        self
    }
}
