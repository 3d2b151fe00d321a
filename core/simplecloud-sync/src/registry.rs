//! Registry of cache lists by name.

use crate::cache_list::ErasedCacheList;
use crate::error::{SyncError, SyncResult};
use crate::protocol::CacheUpdateMessage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// All cache lists of one node, keyed by their identification name.
#[derive(Default)]
pub struct CacheListManager {
    lists: RwLock<HashMap<String, Arc<dyn ErasedCacheList>>>,
}

impl CacheListManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `list` under its own name.
    ///
    /// Fails with [`SyncError::DuplicateList`] if the name is taken; the
    /// existing list stays registered.
    pub fn register_cache_list(&self, list: Arc<dyn ErasedCacheList>) -> SyncResult<()> {
        let name = list.name().to_string();
        let mut lists = self.lists.write();
        if lists.contains_key(&name) {
            return Err(SyncError::DuplicateList(name));
        }
        debug!("Registered cache list {} ({})", name, list.value_type());
        lists.insert(name, list);
        Ok(())
    }

    /// Removes and returns the list registered under `name`.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn ErasedCacheList>> {
        self.lists.write().remove(name)
    }

    pub fn get_cache_list_by_name(&self, name: &str) -> Option<Arc<dyn ErasedCacheList>> {
        self.lists.read().get(name).cloned()
    }

    /// Like [`get_cache_list_by_name`](Self::get_cache_list_by_name), but
    /// fails with [`SyncError::UnknownList`].
    pub fn require(&self, name: &str) -> SyncResult<Arc<dyn ErasedCacheList>> {
        self.get_cache_list_by_name(name)
            .ok_or_else(|| SyncError::UnknownList(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lists.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.lists.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.read().is_empty()
    }

    /// Encodes the contents of every list, lists in name order.
    pub fn snapshot_messages(&self) -> SyncResult<Vec<CacheUpdateMessage>> {
        let mut lists: Vec<_> = self.lists.read().values().cloned().collect();
        lists.sort_by(|a, b| a.name().cmp(b.name()));

        let mut messages = Vec::new();
        for list in lists {
            messages.extend(list.snapshot_messages()?);
        }
        Ok(messages)
    }
}

impl std::fmt::Debug for CacheListManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheListManager")
            .field("lists", &self.names())
            .finish()
    }
}
