//! Binary codec, string representations and the reflection form

pub mod bintools;
pub mod buffer;
pub mod serialization;

pub use buffer::{ByteCodec, ByteReader, ByteWriter};
pub use serialization::{sanitize, Encoding, Fields, Serializable, Serialization, SerializedValue};
