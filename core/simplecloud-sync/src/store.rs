//! Copy-on-write backing store and per-identity locking.

use dashmap::DashMap;
use parking_lot::RwLock;
use simplecloud_types::CacheValue;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

struct Entry<V: CacheValue> {
    key: V::Key,
    value: Arc<V>,
}

impl<V: CacheValue> Clone for Entry<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: Arc::clone(&self.value),
        }
    }
}

/// Ordered storage for the values of one cache list.
///
/// Writers replace the whole entry vector; readers hold on to the vector they
/// saw. A [`Snapshot`] therefore never changes after it was taken.
pub struct CacheStore<V: CacheValue> {
    entries: RwLock<Arc<Vec<Entry<V>>>>,
}

impl<V: CacheValue> CacheStore<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Appends a value under `key`.
    ///
    /// Callers are expected to have checked that `key` is not cached yet.
    pub fn push(&self, key: V::Key, value: V) {
        let mut entries = self.entries.write();
        let mut next = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().cloned());
        next.push(Entry {
            key,
            value: Arc::new(value),
        });
        *entries = Arc::new(next);
    }

    /// Returns the value cached under `key`.
    pub fn get(&self, key: &V::Key) -> Option<Arc<V>> {
        self.entries
            .read()
            .iter()
            .find(|e| &e.key == key)
            .map(|e| Arc::clone(&e.value))
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current contents. Later writes are not visible in it.
    pub fn snapshot(&self) -> Snapshot<V> {
        let entries = Arc::clone(&*self.entries.read());
        Snapshot {
            values: entries.iter().map(|e| Arc::clone(&e.value)).collect(),
        }
    }

    /// Replaces the value under `key` at its current position. Returns false
    /// if nothing was cached under `key`.
    pub(crate) fn replace(&self, key: &V::Key, value: V) -> bool {
        let mut entries = self.entries.write();
        let Some(index) = entries.iter().position(|e| &e.key == key) else {
            return false;
        };
        let mut next: Vec<Entry<V>> = entries.iter().cloned().collect();
        next[index].value = Arc::new(value);
        *entries = Arc::new(next);
        true
    }

    /// Removes and returns the value under `key`.
    pub(crate) fn remove(&self, key: &V::Key) -> Option<Arc<V>> {
        let mut entries = self.entries.write();
        let index = entries.iter().position(|e| &e.key == key)?;
        let mut next: Vec<Entry<V>> = entries.iter().cloned().collect();
        let removed = next.remove(index);
        *entries = Arc::new(next);
        Some(removed.value)
    }
}

/// An immutable view of a cache list at one point in time.
#[derive(Debug)]
pub struct Snapshot<V> {
    values: Vec<Arc<V>>,
}

impl<V> Clone for Snapshot<V> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
        }
    }
}

impl<V> Snapshot<V> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.values.get(index).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.values.iter().map(Arc::as_ref)
    }
}

impl<V: Clone> Snapshot<V> {
    /// Clones the values out of the snapshot.
    pub fn to_vec(&self) -> Vec<V> {
        self.iter().cloned().collect()
    }
}

impl<'a, V> IntoIterator for &'a Snapshot<V> {
    type Item = &'a V;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, Arc<V>>, fn(&'a Arc<V>) -> &'a V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter().map(Arc::as_ref)
    }
}

/// One async mutex per identity that currently has an operation in flight.
///
/// Waiters are served in arrival order. Idle entries are dropped when the
/// last guard for a key is released.
pub(crate) struct IdentityLocks<K: Eq + Hash> {
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Clone + Eq + Hash> IdentityLocks<K> {
    pub(crate) fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Waits until no other operation holds `key`.
    pub(crate) async fn acquire(&self, key: K) -> IdentityGuard<K> {
        let lock = Arc::clone(
            &self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        let guard = lock.lock_owned().await;
        IdentityGuard {
            key,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of identities with an entry in the lock table.
    #[cfg(test)]
    pub(crate) fn active(&self) -> usize {
        self.locks.len()
    }
}

/// Held while an operation on one identity is in flight.
pub(crate) struct IdentityGuard<K: Eq + Hash> {
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash> IdentityGuard<K> {
    /// The identity this guard holds.
    pub(crate) fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for IdentityGuard<K> {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference when idle.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
