//! Expiration and type checks shared by every string command.
//!
//! Expired records are never deleted eagerly. Any record whose expiration lies in the past is
//! treated as if it did not exist, by readers and writers alike.

use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::meta::{DataType, MetaRecord, NO_EXPIRATION};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    Absent,
    Live { value: Bytes, expire_at_ms: u64 },
    WrongType(DataType),
}

/// Classifies a stored record as seen at `now_ms`.
pub fn resolve(record: Option<MetaRecord>, now_ms: u64) -> Resolved {
    let Some(record) = record else {
        return Resolved::Absent;
    };

    if is_expired(record.expire_at_ms, now_ms) {
        return Resolved::Absent;
    }

    match record.data_type {
        DataType::String => Resolved::Live {
            value: record.value,
            expire_at_ms: record.expire_at_ms,
        },
        other => Resolved::WrongType(other),
    }
}

pub fn is_expired(expire_at_ms: u64, now_ms: u64) -> bool {
    expire_at_ms != NO_EXPIRATION && expire_at_ms < now_ms
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
