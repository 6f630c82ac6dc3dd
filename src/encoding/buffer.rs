//! Big-endian byte buffers and the canonical binary codec trait.

use crate::errors::{SerializationError, WalletError, WalletResult};

/// Append-only big-endian writer
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a 4-byte length prefix followed by the bytes
    pub fn put_var_bytes(&mut self, bytes: &[u8]) {
        self.put_u32(bytes.len() as u32);
        self.put_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a borrowed byte slice reading big-endian integers
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub fn take(&mut self, len: usize) -> WalletResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(SerializationError::BufferUnderflow {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            }
            .into());
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn take_array<const N: usize>(&mut self) -> WalletResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u16(&mut self) -> WalletResult<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn get_u32(&mut self) -> WalletResult<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn get_u64(&mut self) -> WalletResult<u64> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    /// Read a 4-byte length prefix followed by that many bytes
    pub fn get_var_bytes(&mut self) -> WalletResult<Vec<u8>> {
        let len = self.get_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Read a 4-byte element count, bounded by the bytes left so a corrupt
    /// count cannot trigger a huge allocation.
    pub fn get_count(&mut self, min_element_size: usize) -> WalletResult<usize> {
        let count = self.get_u32()? as usize;
        let needed = count.saturating_mul(min_element_size.max(1));
        if needed > self.remaining() {
            return Err(SerializationError::BufferUnderflow {
                offset: self.offset,
                needed,
                available: self.remaining(),
            }
            .into());
        }
        Ok(count)
    }
}

/// Canonical binary codec shared by every structured value
pub trait ByteCodec: Sized {
    /// Append the canonical bytes of this value
    fn write_to(&self, writer: &mut ByteWriter);

    /// Parse a value starting at the reader's current offset
    fn read_from(reader: &mut ByteReader<'_>) -> WalletResult<Self>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Parse a value that must span the whole slice
    fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let value = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(WalletError::SerializationError(
                SerializationError::TrailingBytes(reader.remaining()),
            ));
        }
        Ok(value)
    }

    /// Parse a value at `offset`, returning it with the offset of the next unread byte
    fn from_bytes_at(bytes: &[u8], offset: usize) -> WalletResult<(Self, usize)> {
        let mut reader = ByteReader::at(bytes, offset);
        let value = Self::read_from(&mut reader)?;
        Ok((value, reader.offset()))
    }
}
