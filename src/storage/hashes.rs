//! Hash Store
//!
//! Maps a hash name to its own field → value map. The whole two-level
//! structure sits behind one reader/writer lock that is independent of the
//! string store's lock.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

type Fields = HashMap<Bytes, Bytes>;

/// Thread-safe hash-name → (field → value) map.
///
/// # Example
///
/// ```
/// use minikv::storage::HashStore;
/// use bytes::Bytes;
///
/// let store = HashStore::new();
/// store.set_field(Bytes::from("user:1"), Bytes::from("name"), Bytes::from("Ariz"));
///
/// assert_eq!(store.get_field(b"user:1", b"name"), Some(Bytes::from("Ariz")));
/// assert_eq!(store.get_field(b"user:1", b"email"), None);
/// assert!(store.get_all(b"user:2").is_none());
/// ```
#[derive(Debug, Default)]
pub struct HashStore {
    hashes: RwLock<HashMap<Bytes, Fields>>,
}

impl HashStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field` to `value` in `hash`, creating the hash on first use.
    pub fn set_field(&self, hash: Bytes, field: Bytes, value: Bytes) {
        self.hashes
            .write()
            .entry(hash)
            .or_default()
            .insert(field, value);
    }

    /// Returns the value of `field`, or `None` if the hash or field is absent.
    pub fn get_field(&self, hash: &[u8], field: &[u8]) -> Option<Bytes> {
        self.hashes.read().get(hash)?.get(field).cloned()
    }

    /// Returns every field/value pair of `hash` in unspecified order.
    ///
    /// `None` means the hash was never created, which callers distinguish
    /// from an existing hash.
    pub fn get_all(&self, hash: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        let hashes = self.hashes.read();
        let fields = hashes.get(hash)?;

        Some(
            fields
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        )
    }

    /// Returns the number of hashes created so far.
    pub fn len(&self) -> usize {
        self.hashes.read().len()
    }

    /// Returns true if no hash has been created yet.
    pub fn is_empty(&self) -> bool {
        self.hashes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn set(store: &HashStore, hash: &'static str, field: &'static str, value: &'static str) {
        store.set_field(Bytes::from(hash), Bytes::from(field), Bytes::from(value));
    }

    #[test]
    fn test_set_and_get_field() {
        let store = HashStore::new();
        set(&store, "h", "f", "v");

        assert_eq!(store.get_field(b"h", b"f"), Some(Bytes::from("v")));
        assert_eq!(store.get_field(b"h", b"missing"), None);
        assert_eq!(store.get_field(b"missing", b"f"), None);
    }

    #[test]
    fn test_overwrite_field() {
        let store = HashStore::new();
        set(&store, "h", "f", "old");
        set(&store, "h", "f", "new");

        assert_eq!(store.get_field(b"h", b"f"), Some(Bytes::from("new")));
        assert_eq!(store.get_all(b"h").map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_get_all_returns_exactly_the_fields() {
        let store = HashStore::new();
        set(&store, "user", "name", "Ariz");
        set(&store, "user", "lang", "rust");
        set(&store, "user", "city", "pune");
        set(&store, "other", "name", "x");

        let fields: HashSet<(Bytes, Bytes)> = store.get_all(b"user").unwrap().into_iter().collect();
        let expected: HashSet<(Bytes, Bytes)> = [("name", "Ariz"), ("lang", "rust"), ("city", "pune")]
            .into_iter()
            .map(|(f, v)| (Bytes::from(f), Bytes::from(v)))
            .collect();

        assert_eq!(fields, expected);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_all_unknown_hash() {
        let store = HashStore::new();
        assert!(store.get_all(b"nope").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_writers_on_distinct_fields() {
        let store = Arc::new(HashStore::new());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        store.set_field(
                            Bytes::from("shared"),
                            Bytes::from(format!("f-{}-{}", t, i)),
                            Bytes::from(i.to_string()),
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_all(b"shared").map(|f| f.len()), Some(400));
        assert_eq!(store.get_field(b"shared", b"f-3-99"), Some(Bytes::from("99")));
    }
}
