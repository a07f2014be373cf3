//! Sharded Tuple Store
//!
//! This module implements the shared mapping that holds every live tuple.
//! All three operations are check-and-act on a single key, so each one runs
//! entirely under the lock of the shard owning that key.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TupleStore                            │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - `put` and `get` hold the shard's write lock across the presence check
//!   and the mutation, so two racing callers can never both succeed.
//! - `read` holds the read lock; it sees a key either before or after a
//!   concurrent `get`, never in between.
//! - Nothing here waits for a key to appear. Absence is reported at once.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Number of shards for the tuple store.
const NUM_SHARDS: usize = 64;

/// A stored (key, value) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: String,
    pub value: String,
}

impl Tuple {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.key, self.value)
    }
}

/// The successful result of a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `put` inserted the tuple
    Added(Tuple),
    /// `get` removed the tuple and handed back its value
    Removed(Tuple),
    /// `read` found the tuple and left it in place
    Read(Tuple),
}

impl Outcome {
    pub fn tuple(&self) -> &Tuple {
        match self {
            Outcome::Added(t) | Outcome::Removed(t) | Outcome::Read(t) => t,
        }
    }

    /// The verb used on the wire for this outcome.
    pub fn verb(&self) -> &'static str {
        match self {
            Outcome::Added(_) => "added",
            Outcome::Removed(_) => "removed",
            Outcome::Read(_) => "read",
        }
    }
}

/// A precondition that did not hold for the requested key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} does not exist")]
    NotExists(String),
}

/// Result type for tuple store operations.
pub type StoreResult = Result<Outcome, StoreError>;

/// Aggregate sizes gathered by [`TupleStore::scan`].
///
/// Shards are visited one at a time, so a tuple added or removed during the
/// scan may or may not be counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreScan {
    /// Tuples seen
    pub tuples: u64,
    /// Sum of key lengths, in characters
    pub key_chars: u64,
    /// Sum of value lengths, in characters
    pub value_chars: u64,
}

#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<String, String>>,
}

impl Shard {
    // The map is never left half-updated by any operation, so a lock
    // poisoned by a panicking holder still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The tuple space's backing store.
///
/// Designed to be owned by one service object and shared across every
/// connection task behind an `Arc`.
///
/// # Example
///
/// ```
/// use tuplespace::storage::{Outcome, StoreError, Tuple, TupleStore};
///
/// let store = TupleStore::new();
///
/// assert_eq!(store.put("a", "1"), Ok(Outcome::Added(Tuple::new("a", "1"))));
/// assert_eq!(store.put("a", "2"), Err(StoreError::AlreadyExists("a".into())));
/// assert_eq!(store.read("a"), Ok(Outcome::Read(Tuple::new("a", "1"))));
/// assert_eq!(store.get("a"), Ok(Outcome::Removed(Tuple::new("a", "1"))));
/// assert_eq!(store.get("a"), Err(StoreError::NotExists("a".into())));
/// ```
pub struct TupleStore {
    shards: Vec<Shard>,

    /// Number of live tuples (approximate under concurrency)
    tuple_count: AtomicU64,
}

impl fmt::Debug for TupleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleStore")
            .field("shards", &self.shards.len())
            .field("tuple_count", &self.tuple_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for TupleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TupleStore {
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            tuple_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Inserts the tuple if `key` is absent.
    ///
    /// An existing tuple is never overwritten.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> StoreResult {
        let key = key.into();
        let value = value.into();

        let mut data = self.shard(&key).write();
        match data.entry(key) {
            Entry::Occupied(slot) => Err(StoreError::AlreadyExists(slot.key().clone())),
            Entry::Vacant(slot) => {
                let tuple = Tuple::new(slot.key().clone(), value.clone());
                slot.insert(value);
                self.tuple_count.fetch_add(1, Ordering::Relaxed);
                Ok(Outcome::Added(tuple))
            }
        }
    }

    /// Removes the tuple for `key` and returns it.
    pub fn get(&self, key: &str) -> StoreResult {
        let mut data = self.shard(key).write();
        match data.remove_entry(key) {
            Some((key, value)) => {
                self.tuple_count.fetch_sub(1, Ordering::Relaxed);
                Ok(Outcome::Removed(Tuple { key, value }))
            }
            None => Err(StoreError::NotExists(key.to_string())),
        }
    }

    /// Returns the tuple for `key` without removing it.
    pub fn read(&self, key: &str) -> StoreResult {
        let data = self.shard(key).read();
        match data.get(key) {
            Some(value) => Ok(Outcome::Read(Tuple::new(key, value.clone()))),
            None => Err(StoreError::NotExists(key.to_string())),
        }
    }

    /// Returns the approximate number of tuples.
    pub fn len(&self) -> u64 {
        self.tuple_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks every shard and sums tuple sizes.
    ///
    /// Only one shard's read lock is held at a time, so writers on other
    /// shards keep making progress while a scan runs.
    pub fn scan(&self) -> StoreScan {
        let mut scan = StoreScan::default();

        for shard in &self.shards {
            let data = shard.read();
            for (key, value) in data.iter() {
                scan.tuples += 1;
                scan.key_chars += key.chars().count() as u64;
                scan.value_chars += value.chars().count() as u64;
            }
        }

        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_put_then_duplicate_put() {
        let store = TupleStore::new();

        assert_eq!(
            store.put("k", "v1"),
            Ok(Outcome::Added(Tuple::new("k", "v1")))
        );
        assert_eq!(
            store.put("k", "v2"),
            Err(StoreError::AlreadyExists("k".to_string()))
        );

        // The first value survives the rejected put
        assert_eq!(store.read("k"), Ok(Outcome::Read(Tuple::new("k", "v1"))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_removes() {
        let store = TupleStore::new();
        store.put("k", "v").unwrap();

        assert_eq!(store.get("k"), Ok(Outcome::Removed(Tuple::new("k", "v"))));
        assert_eq!(store.get("k"), Err(StoreError::NotExists("k".to_string())));
        assert_eq!(store.read("k"), Err(StoreError::NotExists("k".to_string())));
        assert!(store.is_empty());
    }

    #[test]
    fn test_read_is_repeatable() {
        let store = TupleStore::new();
        store.put("k", "v").unwrap();

        for _ in 0..5 {
            assert_eq!(store.read("k"), Ok(Outcome::Read(Tuple::new("k", "v"))));
        }
        assert_eq!(store.len(), 1);

        store.get("k").unwrap();
        assert!(store.read("k").is_err());
    }

    #[test]
    fn test_key_can_be_reused_after_get() {
        let store = TupleStore::new();
        store.put("k", "old").unwrap();
        store.get("k").unwrap();

        assert_eq!(
            store.put("k", "new"),
            Ok(Outcome::Added(Tuple::new("k", "new")))
        );
    }

    #[test]
    fn test_empty_key_and_value() {
        let store = TupleStore::new();

        assert!(store.put("", "").is_ok());
        assert_eq!(store.read(""), Ok(Outcome::Read(Tuple::new("", ""))));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::AlreadyExists("a".into()).to_string(),
            "a already exists"
        );
        assert_eq!(
            StoreError::NotExists("a".into()).to_string(),
            "a does not exist"
        );
    }

    #[test]
    fn test_scan() {
        let store = TupleStore::new();
        assert_eq!(store.scan(), StoreScan::default());

        store.put("ab", "1234").unwrap();
        store.put("c", "56").unwrap();

        let scan = store.scan();
        assert_eq!(scan.tuples, 2);
        assert_eq!(scan.key_chars, 3);
        assert_eq!(scan.value_chars, 6);
    }

    #[test]
    fn test_racing_puts_single_winner() {
        const N: usize = 16;

        for round in 0..20 {
            let store = Arc::new(TupleStore::new());
            let barrier = Arc::new(Barrier::new(N));
            let key = format!("race-{}", round);

            let handles: Vec<_> = (0..N)
                .map(|i| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    let key = key.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        store.put(key, format!("v{}", i))
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let added = results
                .iter()
                .filter(|r| matches!(r, Ok(Outcome::Added(_))))
                .count();
            let rejected = results
                .iter()
                .filter(|r| matches!(r, Err(StoreError::AlreadyExists(_))))
                .count();

            assert_eq!(added, 1);
            assert_eq!(rejected, N - 1);
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn test_racing_gets_single_winner() {
        const N: usize = 16;

        for round in 0..20 {
            let store = Arc::new(TupleStore::new());
            let barrier = Arc::new(Barrier::new(N));
            let key = format!("race-{}", round);
            store.put(key.clone(), "prize").unwrap();

            let handles: Vec<_> = (0..N)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    let key = key.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        store.get(&key)
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let removed: Vec<_> = results
                .iter()
                .filter_map(|r| match r {
                    Ok(Outcome::Removed(t)) => Some(t.value.as_str()),
                    _ => None,
                })
                .collect();
            let missing = results
                .iter()
                .filter(|r| matches!(r, Err(StoreError::NotExists(_))))
                .count();

            assert_eq!(removed, vec!["prize"]);
            assert_eq!(missing, N - 1);
            assert!(store.is_empty());
        }
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        let store = Arc::new(TupleStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    store.put(key.clone(), "value").unwrap();
                    store.read(&key).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
        assert_eq!(store.scan().tuples, 1000);
    }
}
