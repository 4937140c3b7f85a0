// --- File: crates/hms_booking/src/lock.rs ---
//! Keyed mutual exclusion.
//!
//! A [`LockTable`] hands out one async mutex per key. Callers holding
//! different keys never contend; callers holding the same key are
//! serialized in arrival order. Entries are dropped from the table as soon
//! as nobody holds or waits for them, so the table only grows with the
//! number of keys in use at the same time.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct LockTable<K>
where
    K: Eq + Hash + Clone,
{
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Waits for exclusive access to `key`. Access ends when the guard drops.
    pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = mutex.lock_owned().await;
        KeyGuard {
            table: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for LockTable<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one key of a [`LockTable`].
pub struct KeyGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    table: &'a LockTable<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        // Unlock first so the entry's only remaining owner is the table
        drop(self.guard.take());
        self.table
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
