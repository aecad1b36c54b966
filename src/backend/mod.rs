//! The transactional key-value backend the string engine runs on.
//!
//! A backend only offers optimistic transactions: reads and buffered writes, then a commit that
//! either applies every write or reports a conflict with a concurrent committer.

use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error as ThisError;

pub mod memory;

pub use memory::MemoryBackend;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Another transaction committed an overlapping write first. Safe to retry.
    #[error("write conflict")]
    Conflict,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend request timed out")]
    Timeout,
}

impl BackendError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Conflict)
    }
}

pub trait Backend: Send + Sync {
    fn begin(&self) -> Result<Box<dyn Transaction>, BackendError>;
}

pub trait Transaction: Send {
    fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>, BackendError>;

    /// Reads all `keys` from the same snapshot. Keys that do not exist are missing from the map.
    fn batch_get(&mut self, keys: &[Bytes]) -> Result<HashMap<Bytes, Bytes>, BackendError>;

    /// Buffers a write. Nothing is visible to other transactions before `commit`.
    fn put(&mut self, key: Bytes, value: Bytes);

    fn commit(self: Box<Self>) -> Result<(), BackendError>;

    fn rollback(self: Box<Self>);
}
