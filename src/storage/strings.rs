//! String Store
//!
//! A single `HashMap<Bytes, Bytes>` behind one reader/writer lock.
//!
//! ## Locking
//!
//! - `get` / `mget` take the shared lock, so readers run concurrently.
//! - `set` and `increment_or_init` take the exclusive lock. The increment
//!   holds it across the whole read-parse-write sequence, so two concurrent
//!   `INCR`s on the same key never lose an update.
//!
//! Values are cloned out as `Bytes` (a reference-count bump), so no caller
//! holds a reference into the map once the guard is dropped.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// Value stored by an increment or decrement of an absent key.
///
/// Both directions initialise to `1`; existing clients rely on `DECR` of a
/// missing key answering `"1"`.
const INITIAL_COUNTER: &str = "1";

/// Errors raised by read-modify-write operations on the string store.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The stored value is not a base-10 signed 64-bit integer
    #[error("value is not an integer or out of range")]
    NotAnInteger,

    /// Applying the delta would leave the `i64` range
    #[error("increment or decrement would overflow")]
    Overflow,
}

/// Thread-safe key → string map.
///
/// # Example
///
/// ```
/// use minikv::storage::StringStore;
/// use bytes::Bytes;
///
/// let store = StringStore::new();
/// store.set(Bytes::from("name"), Bytes::from("Ariz"));
/// assert_eq!(store.get(b"name"), Some(Bytes::from("Ariz")));
///
/// assert_eq!(store.increment_or_init(b"hits", 1), Ok(Bytes::from("1")));
/// assert_eq!(store.increment_or_init(b"hits", 1), Ok(Bytes::from("2")));
/// ```
#[derive(Debug, Default)]
pub struct StringStore {
    data: RwLock<HashMap<Bytes, Bytes>>,
}

impl StringStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, overwriting any previous value.
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.data.write().insert(key, value);
    }

    /// Returns the current value of `key`, or `None` if it was never written.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.data.read().get(key).cloned()
    }

    /// Looks up every key in order.
    ///
    /// Each key is resolved under its own short read lock, so a concurrent
    /// writer may be observed between two keys of the same call.
    pub fn mget<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<Option<Bytes>> {
        keys.iter().map(|key| self.get(key.as_ref())).collect()
    }

    /// Adds `delta` to the integer stored at `key` and returns the new value.
    ///
    /// An absent key is created with the value `"1"` whatever the sign of
    /// `delta`. A present value that does not parse as an `i64`, or an
    /// addition that overflows, fails without touching the stored value.
    pub fn increment_or_init(&self, key: &[u8], delta: i64) -> Result<Bytes, StorageError> {
        let mut data = self.data.write();

        let current = match data.get(key) {
            Some(value) => parse_integer(value)?,
            None => {
                let initial = Bytes::from_static(INITIAL_COUNTER.as_bytes());
                data.insert(Bytes::copy_from_slice(key), initial.clone());
                return Ok(initial);
            }
        };

        let updated = current.checked_add(delta).ok_or(StorageError::Overflow)?;
        let encoded = Bytes::from(updated.to_string());
        data.insert(Bytes::copy_from_slice(key), encoded.clone());

        Ok(encoded)
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if no key has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

fn parse_integer(value: &[u8]) -> Result<i64, StorageError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(StorageError::NotAnInteger)
}
