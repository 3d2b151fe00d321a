//! Per-type rules plugged into a [`CacheList`](crate::CacheList).

use crate::store::CacheStore;
use simplecloud_types::{CacheValue, CloudEvent};

/// Identity and event rules for one cached value type.
///
/// Implementations hold no state of their own: the list passes in the
/// incoming value and its current cached copy, and the executor only decides
/// what that difference means.
pub trait UpdateExecutor<V: CacheValue>: Send + Sync {
    /// Registry name of the list (e.g. `group-cache`).
    fn identification_name(&self) -> &str;

    /// Identity of `value` inside the list. Two values with the same key are
    /// the same object.
    fn identify(&self, value: &V) -> V::Key {
        value.cache_key()
    }

    /// Events for an update. `cached` is `None` when the value is new.
    ///
    /// Called once per update, before the store changes.
    fn determine_events(&self, update: &V, cached: Option<&V>) -> Vec<CloudEvent>;

    /// Events for a removal of `cached`.
    fn removal_events(&self, cached: &V) -> Vec<CloudEvent>;

    /// Inserts a value that was not cached before.
    fn add_new_value(&self, store: &CacheStore<V>, key: V::Key, value: V) {
        store.push(key, value);
    }
}
