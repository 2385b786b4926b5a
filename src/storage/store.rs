//! Key-Value Store with Lazy Expiry
//!
//! One `HashMap` guarded by one `Mutex`. Each entry carries its own optional
//! expiry instant, so a value and its deadline are always written together.
//!
//! ## Expiry
//!
//! There is no background sweeper. `get` checks the deadline under the same
//! lock that a concurrent `set` would take, and removes the entry if the
//! deadline has been reached. Keys that are never read again stay in memory.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// A stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub fn with_expiry(value: Bytes, expires_at: Instant) -> Self {
        Self {
            value,
            expires_at: Some(expires_at),
        }
    }

    /// An entry whose deadline is at or before `now` is expired.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Operation counters, updated with relaxed ordering.
#[derive(Debug, Default)]
pub struct StoreStats {
    pub gets: AtomicU64,
    pub sets: AtomicU64,
    /// Keys removed because a read found them expired
    pub expired: AtomicU64,
}

/// The shared key-value store.
///
/// Wrap it in an `Arc` and hand a clone to every connection.
///
/// # Example
///
/// ```
/// use mintkv::storage::Store;
/// use bytes::Bytes;
/// use std::time::{Duration, Instant};
///
/// let store = Store::new();
/// store.set(Bytes::from("name"), Bytes::from("Ariz"));
/// assert_eq!(store.get(b"name"), Some(Bytes::from("Ariz")));
///
/// store.set_with_expiry(Bytes::from("gone"), Bytes::from("x"), Instant::now());
/// assert_eq!(store.get(b"gone"), None);
/// assert!(!store.contains(b"gone"));
/// ```
#[derive(Debug, Default)]
pub struct Store {
    entries: Mutex<HashMap<Bytes, Entry>>,
    stats: StoreStats,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key` and drops any expiry the key had.
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.insert(key, Entry::new(value));
    }

    /// Stores `value` under `key`, expiring at `expires_at`.
    pub fn set_with_expiry(&self, key: Bytes, value: Bytes, expires_at: Instant) {
        self.insert(key, Entry::with_expiry(value, expires_at));
    }

    fn insert(&self, key: Bytes, entry: Entry) {
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().unwrap().insert(key, entry);
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired; an expired
    /// entry is removed before returning.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.stats.gets.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if !entry.is_expired_at(Instant::now()) {
            return Some(entry.value.clone());
        }

        entries.remove(key);
        self.stats.expired.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Returns true if an entry is physically present, expired or not.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Returns the recorded deadline for `key` without expiring it.
    pub fn expires_at(&self, key: &[u8]) -> Option<Instant> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .and_then(|entry| entry.expires_at)
    }

    /// Number of physically present entries, including not-yet-collected expired ones.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}
