//! The per-key metadata record.
//!
//! Every logical key is stored as exactly one physical record. The record carries the type of the
//! value, its absolute expiration and, for strings, the value itself:
//!
//! ```text
//! +---------+------+-----------------+-------------------+
//! | version | type | expire_at_ms BE | value (remaining) |
//! |   u8    |  u8  |       u64       |       bytes       |
//! +---------+------+-----------------+-------------------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use strum_macros::{Display, EnumIter};
use thiserror::Error as ThisError;

const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 1 + 8;

/// Separates the namespace from the rest of the physical key.
const NAMESPACE_SEPARATOR: u8 = 0x00;
/// Marks a physical key as holding a meta record.
const META_MARKER: u8 = b'M';

/// `0` is reserved for "no expiration", it is never a computed timestamp.
pub const NO_EXPIRATION: u64 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter)]
pub enum DataType {
    #[strum(serialize = "string")]
    String,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "hash")]
    Hash,
    #[strum(serialize = "set")]
    Set,
    #[strum(serialize = "zset")]
    SortedSet,
}

impl TryFrom<u8> for DataType {
    type Error = CorruptRecord;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b's' => Ok(Self::String),
            b'l' => Ok(Self::List),
            b'h' => Ok(Self::Hash),
            b'S' => Ok(Self::Set),
            b'z' => Ok(Self::SortedSet),
            _ => Err(CorruptRecord::UnknownType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::String => b's',
            DataType::List => b'l',
            DataType::Hash => b'h',
            DataType::Set => b'S',
            DataType::SortedSet => b'z',
        }
    }
}

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum CorruptRecord {
    #[error("record is {0} bytes long, shorter than its header")]
    Truncated(usize),
    #[error("unknown record format version {0}")]
    UnknownVersion(u8),
    #[error("unknown type tag {0:#04x}")]
    UnknownType(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaRecord {
    pub data_type: DataType,
    /// Absolute epoch milliseconds, or [`NO_EXPIRATION`].
    pub expire_at_ms: u64,
    pub value: Bytes,
}

impl MetaRecord {
    pub fn string(value: Bytes, expire_at_ms: u64) -> MetaRecord {
        MetaRecord {
            data_type: DataType::String,
            expire_at_ms,
            value,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.value.len());
        buf.put_u8(FORMAT_VERSION);
        buf.put_u8(u8::from(self.data_type));
        buf.put_u64(self.expire_at_ms);
        buf.put_slice(&self.value);
        buf.freeze()
    }

    pub fn decode(mut blob: Bytes) -> Result<MetaRecord, CorruptRecord> {
        if blob.len() < HEADER_LEN {
            return Err(CorruptRecord::Truncated(blob.len()));
        }

        let version = blob.get_u8();
        if version != FORMAT_VERSION {
            return Err(CorruptRecord::UnknownVersion(version));
        }

        let data_type = DataType::try_from(blob.get_u8())?;
        let expire_at_ms = blob.get_u64();

        // What is left after the header is the value, shared with the original buffer.
        Ok(MetaRecord {
            data_type,
            expire_at_ms,
            value: blob,
        })
    }
}

/// Builds the physical key of the meta record for `key` inside `namespace`.
pub fn meta_key(namespace: &str, key: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(namespace.len() + 2 + key.len());
    buf.put_slice(namespace.as_bytes());
    buf.put_u8(NAMESPACE_SEPARATOR);
    buf.put_u8(META_MARKER);
    buf.put_slice(key);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn encode_then_decode_string() {
        let record = MetaRecord::string(Bytes::from("hello"), 1_700_000_000_000);

        let decoded = MetaRecord::decode(record.encode()).unwrap();

        assert_eq!(decoded, record);
    }

    #[test]
    fn encode_layout() {
        let record = MetaRecord::string(Bytes::from("v"), 258);

        let blob = record.encode();

        assert_eq!(&blob[..], &[1, b's', 0, 0, 0, 0, 0, 0, 1, 2, b'v'][..]);
    }

    #[test]
    fn empty_value_without_expiration() {
        let record = MetaRecord::string(Bytes::new(), NO_EXPIRATION);

        let decoded = MetaRecord::decode(record.encode()).unwrap();

        assert_eq!(decoded.value, Bytes::new());
        assert_eq!(decoded.expire_at_ms, NO_EXPIRATION);
    }

    #[test]
    fn every_type_tag_survives() {
        for data_type in DataType::iter() {
            let record = MetaRecord {
                data_type,
                expire_at_ms: 7,
                value: Bytes::new(),
            };

            assert_eq!(MetaRecord::decode(record.encode()).unwrap(), record);
        }
    }

    #[test]
    fn truncated_blob() {
        let res = MetaRecord::decode(Bytes::from_static(&[1, b's', 0, 0]));

        assert_eq!(res, Err(CorruptRecord::Truncated(4)));
    }

    #[test]
    fn unknown_version() {
        let mut blob = MetaRecord::string(Bytes::from("x"), 0).encode().to_vec();
        blob[0] = 9;

        let res = MetaRecord::decode(Bytes::from(blob));

        assert_eq!(res, Err(CorruptRecord::UnknownVersion(9)));
    }

    #[test]
    fn unknown_type() {
        let mut blob = MetaRecord::string(Bytes::from("x"), 0).encode().to_vec();
        blob[1] = b'?';

        let res = MetaRecord::decode(Bytes::from(blob));

        assert_eq!(res, Err(CorruptRecord::UnknownType(b'?')));
    }

    #[test]
    fn type_names() {
        assert_eq!(DataType::String.to_string(), "string");
        assert_eq!(DataType::SortedSet.to_string(), "zset");
    }

    #[test]
    fn namespaces_do_not_collide() {
        assert_eq!(&meta_key("db0", b"k")[..], b"db0\x00Mk");
        assert_ne!(meta_key("a", b"bc"), meta_key("ab", b"c"));
    }
}
