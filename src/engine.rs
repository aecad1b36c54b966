//! The string engine.
//!
//! Each command is one read, decide, write unit executed inside a single backend transaction. The
//! commit is the atomicity boundary: if a concurrent writer commits first, the whole unit is
//! re-run from scratch on a fresh transaction, a bounded number of times.

use bytes::Bytes;
use std::collections::HashMap;
use std::str;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

use crate::backend::{Backend, BackendError, Transaction};
use crate::guard::{self, Resolved};
use crate::meta::{meta_key, CorruptRecord, MetaRecord, NO_EXPIRATION};

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum StringError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    TypeMismatch,
    /// An NX or XX precondition did not hold. Not an error from the client's point of view.
    #[error("condition not met")]
    ConditionFailed,
    #[error("ERR value is not an integer or out of range")]
    NotInteger,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("TRYAGAIN transaction conflict, gave up after {attempts} attempts")]
    Conflict { attempts: u32 },
    #[error("ERR corrupted record: {0}")]
    Corrupt(#[from] CorruptRecord),
    #[error("ERR backend failure: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for StringError {
    fn from(err: BackendError) -> Self {
        StringError::Backend(err)
    }
}

/// Everything an engine needs to reach its keyspace. Immutable once built.
#[derive(Clone)]
pub struct Context {
    pub namespace: String,
    pub backend: Arc<dyn Backend>,
    /// Extra attempts made after a commit conflict before giving up.
    pub max_retries: u32,
}

impl Context {
    pub fn new(backend: Arc<dyn Backend>) -> Context {
        Context {
            namespace: DEFAULT_NAMESPACE.to_string(),
            backend,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Context {
        self.namespace = namespace.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Context {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Absolute epoch milliseconds, `0` for no expiration.
    pub expire_at_ms: u64,
    /// Only set the key if it does not exist.
    pub nx: bool,
    /// Only set the key if it already exists.
    pub xx: bool,
}

/// Redis string commands over a transactional backend.
///
/// The engine keeps no state besides its [`Context`], so it is cheap to clone and safe to share
/// between connections. Concurrent commands on the same key are serialized by the backend.
#[derive(Clone)]
pub struct StringEngine {
    ctx: Context,
}

impl StringEngine {
    pub fn new(ctx: Context) -> StringEngine {
        StringEngine { ctx }
    }

    pub fn namespace(&self) -> &str {
        &self.ctx.namespace
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StringError> {
        self.read(|txn| match self.load(txn, key)? {
            Resolved::Absent => Ok(None),
            Resolved::Live { value, .. } => Ok(Some(value)),
            Resolved::WrongType(_) => Err(StringError::TypeMismatch),
        })
    }

    /// Values of `keys`, positionally. Keys holding another type read as missing.
    pub fn mget(&self, keys: &[Bytes]) -> Result<Vec<Option<Bytes>>, StringError> {
        let physical: Vec<Bytes> = keys.iter().map(|key| self.physical_key(key)).collect();

        self.read(|txn| {
            let mut found = txn.batch_get(&physical)?;
            let now = guard::now_ms();

            physical
                .iter()
                .map(|key| {
                    // A corrupt record fails the whole reply, only type mismatches read as nil.
                    let record = found.remove(key).map(MetaRecord::decode).transpose()?;
                    match guard::resolve(record, now) {
                        Resolved::Live { value, .. } => Ok(Some(value)),
                        Resolved::Absent | Resolved::WrongType(_) => Ok(None),
                    }
                })
                .collect()
        })
    }

    pub fn set(&self, key: &[u8], value: Bytes, opts: SetOptions) -> Result<(), StringError> {
        let physical = self.physical_key(key);

        self.transact("set", |txn| {
            match (self.load(txn, key)?, opts.nx, opts.xx) {
                (Resolved::WrongType(_), _, _) => return Err(StringError::TypeMismatch),
                (Resolved::Live { .. }, true, _) => return Err(StringError::ConditionFailed),
                (Resolved::Absent, _, true) => return Err(StringError::ConditionFailed),
                _ => {}
            }

            let record = MetaRecord::string(value.clone(), opts.expire_at_ms);
            txn.put(physical.clone(), record.encode());
            Ok(())
        })
    }

    /// Sets every pair in one commit, or none of them if any key holds another type.
    ///
    /// When a key appears more than once its last value wins. MSET never sets a TTL, existing ones
    /// are cleared.
    pub fn mset(&self, pairs: Vec<(Bytes, Bytes)>) -> Result<(), StringError> {
        let mut positions: HashMap<Bytes, usize> = HashMap::with_capacity(pairs.len());
        let mut writes: Vec<(Bytes, Bytes)> = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let physical = self.physical_key(&key);
            match positions.get(&physical) {
                Some(&i) => writes[i].1 = value,
                None => {
                    positions.insert(physical.clone(), writes.len());
                    writes.push((physical, value));
                }
            }
        }

        let physical: Vec<Bytes> = writes.iter().map(|(key, _)| key.clone()).collect();

        self.transact("mset", |txn| {
            let mut found = txn.batch_get(&physical)?;
            let now = guard::now_ms();

            for key in &physical {
                let record = found.remove(key).map(MetaRecord::decode).transpose()?;
                if let Resolved::WrongType(_) = guard::resolve(record, now) {
                    return Err(StringError::TypeMismatch);
                }
            }

            for (key, value) in &writes {
                let record = MetaRecord::string(value.clone(), NO_EXPIRATION);
                txn.put(key.clone(), record.encode());
            }
            Ok(())
        })
    }

    /// Sets `value` with no TTL and returns the previous value.
    pub fn getset(&self, key: &[u8], value: Bytes) -> Result<Option<Bytes>, StringError> {
        let physical = self.physical_key(key);

        self.transact("getset", |txn| {
            let previous = match self.load(txn, key)? {
                Resolved::Absent => None,
                Resolved::Live { value, .. } => Some(value),
                Resolved::WrongType(_) => return Err(StringError::TypeMismatch),
            };

            let record = MetaRecord::string(value.clone(), NO_EXPIRATION);
            txn.put(physical.clone(), record.encode());
            Ok(previous)
        })
    }

    /// Adds `step` to the integer stored at `key`, a missing key counts as `0`. The TTL of the key
    /// is left untouched.
    pub fn incr(&self, key: &[u8], step: i64) -> Result<i64, StringError> {
        let physical = self.physical_key(key);

        self.transact("incr", |txn| {
            let (current, expire_at_ms) = match self.load(txn, key)? {
                Resolved::Absent => (0, NO_EXPIRATION),
                Resolved::Live {
                    value,
                    expire_at_ms,
                } => (
                    parse_integer(&value).ok_or(StringError::NotInteger)?,
                    expire_at_ms,
                ),
                Resolved::WrongType(_) => return Err(StringError::TypeMismatch),
            };

            let updated = current.checked_add(step).ok_or(StringError::Overflow)?;

            let record = MetaRecord::string(Bytes::from(updated.to_string()), expire_at_ms);
            txn.put(physical.clone(), record.encode());
            Ok(updated)
        })
    }

    pub fn strlen(&self, key: &[u8]) -> Result<usize, StringError> {
        self.read(|txn| match self.load(txn, key)? {
            Resolved::Absent => Ok(0),
            Resolved::Live { value, .. } => Ok(value.len()),
            Resolved::WrongType(_) => Err(StringError::TypeMismatch),
        })
    }

    fn physical_key(&self, key: &[u8]) -> Bytes {
        meta_key(&self.ctx.namespace, key)
    }

    fn load(&self, txn: &mut dyn Transaction, key: &[u8]) -> Result<Resolved, StringError> {
        let record = txn
            .get(&self.physical_key(key))?
            .map(MetaRecord::decode)
            .transpose()?;

        Ok(guard::resolve(record, guard::now_ms()))
    }

    /// Runs `f` in a transaction that is always rolled back.
    fn read<T>(
        &self,
        f: impl FnOnce(&mut dyn Transaction) -> Result<T, StringError>,
    ) -> Result<T, StringError> {
        let mut txn = self.ctx.backend.begin()?;
        let res = f(txn.as_mut());
        txn.rollback();
        res
    }

    /// Runs `f` in a transaction and commits it, retrying the whole unit on commit conflicts.
    ///
    /// Errors returned by `f` roll the transaction back and are never retried.
    fn transact<T>(
        &self,
        op: &'static str,
        mut f: impl FnMut(&mut dyn Transaction) -> Result<T, StringError>,
    ) -> Result<T, StringError> {
        let attempts = self.ctx.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let mut txn = self.ctx.backend.begin()?;

            let res = match f(txn.as_mut()) {
                Ok(res) => res,
                Err(err) => {
                    txn.rollback();
                    return Err(err);
                }
            };

            match txn.commit() {
                Ok(()) => return Ok(res),
                Err(err) if err.is_retryable() => {
                    debug!(op, attempt, "write conflict");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(op, attempts, "giving up after repeated write conflicts");
        Err(StringError::Conflict { attempts })
    }
}

/// Parses a signed 64 bit integer the way Redis does: an optional `-`, then digits with no leading
/// zero. `+`, whitespace, `-0` and out of range values are rejected.
pub(crate) fn parse_integer(value: &[u8]) -> Option<i64> {
    let digits = value.strip_prefix(b"-").unwrap_or(value);

    match digits {
        [] => return None,
        [b'0'] if digits.len() != value.len() => return None,
        [b'0', _, ..] => return None,
        _ => {}
    }

    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    str::from_utf8(value).ok()?.parse().ok()
}
