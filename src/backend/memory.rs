use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

use crate::backend::{Backend, BackendError, Transaction};

/// An in-process backend with optimistic concurrency control.
///
/// Every committed record carries the version of the transaction that wrote it. A transaction
/// remembers the version of each key it read, and at commit time it is validated against the
/// current state: if any key it read or wrote has been committed by someone else in the meantime,
/// the commit fails with [`BackendError::Conflict`] and none of its writes are applied. The first
/// committer wins.
///
/// The backend is cheap to clone, clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    records: HashMap<Bytes, Versioned>,
    // Version of the last committed transaction. Monotonically increasing.
    version: u64,
}

struct Versioned {
    value: Bytes,
    version: u64,
}

impl State {
    // Absent keys are at version 0.
    fn version_of(&self, key: &[u8]) -> u64 {
        self.records.get(key).map_or(0, |v| v.version)
    }
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        Self::default()
    }

    /// Number of physical records currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().map_or(0, |state| state.records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unavailable("state lock poisoned".to_string()))
    }
}

impl Backend for MemoryBackend {
    fn begin(&self) -> Result<Box<dyn Transaction>, BackendError> {
        let start_version = self.inner.lock()?.version;

        Ok(Box::new(MemoryTransaction {
            inner: self.inner.clone(),
            start_version,
            reads: HashMap::new(),
            writes: HashMap::new(),
        }))
    }
}

pub struct MemoryTransaction {
    inner: Arc<Inner>,
    // Writes to keys that were never read are validated against this.
    start_version: u64,
    reads: HashMap<Bytes, u64>,
    writes: HashMap<Bytes, Bytes>,
}

impl MemoryTransaction {
    fn read(&mut self, state: &State, key: &[u8]) -> Option<Bytes> {
        if let Some(value) = self.writes.get(key) {
            return Some(value.clone());
        }

        let record = state.records.get(key);
        // Keep the first observed version, that is the one the transaction decided on.
        self.reads
            .entry(Bytes::copy_from_slice(key))
            .or_insert_with(|| record.map_or(0, |r| r.version));

        record.map(|r| r.value.clone())
    }
}

impl Transaction for MemoryTransaction {
    fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>, BackendError> {
        let inner = self.inner.clone();
        let state = inner.lock()?;

        Ok(self.read(&state, key))
    }

    fn batch_get(&mut self, keys: &[Bytes]) -> Result<HashMap<Bytes, Bytes>, BackendError> {
        let inner = self.inner.clone();
        let state = inner.lock()?;

        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.read(&state, key) {
                found.insert(key.clone(), value);
            }
        }

        Ok(found)
    }

    fn put(&mut self, key: Bytes, value: Bytes) {
        self.writes.insert(key, value);
    }

    fn commit(self: Box<Self>) -> Result<(), BackendError> {
        let MemoryTransaction {
            inner,
            start_version,
            reads,
            writes,
        } = *self;

        if writes.is_empty() {
            return Ok(());
        }

        let mut state = inner.lock()?;

        let stale_read = reads
            .iter()
            .any(|(key, seen)| state.version_of(key) != *seen);
        let stale_write = writes
            .keys()
            .filter(|key| !reads.contains_key(*key))
            .any(|key| state.version_of(key) > start_version);

        if stale_read || stale_write {
            trace!(writes = writes.len(), "commit rejected");
            return Err(BackendError::Conflict);
        }

        state.version += 1;
        let version = state.version;

        for (key, value) in writes {
            state.records.insert(key, Versioned { value, version });
        }

        trace!(version, "commit applied");
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}
