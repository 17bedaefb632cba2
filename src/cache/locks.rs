//! Key Locks Module
//!
//! Per-key async mutual exclusion for get-or-set sections.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

// == Key Locks ==
/// A map of async mutexes, one per active key.
///
/// `acquire` serializes callers of the same key while callers of other keys
/// proceed independently. `release` prunes a key's mutex once no task holds
/// or awaits it, so the map grows with concurrency, not with the keyspace.
pub struct KeyLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Clone + Eq + Hash> KeyLocks<K> {
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Locks the mutex for `key`, inserting it on first use.
    ///
    /// The returned guard holds the key's critical section until dropped.
    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops the map entry for `key` if no other task still references it.
    ///
    /// Call after the guard returned by [`Self::acquire`] has been dropped.
    /// A waiting task keeps its own reference to the mutex, so a contended
    /// key is never pruned out from under it.
    pub async fn release(&self, key: &K) {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(key) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(key);
            }
        }
    }

    /// Number of keys currently tracked.
    pub async fn active_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}

impl<K: Clone + Eq + Hash> Default for KeyLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
