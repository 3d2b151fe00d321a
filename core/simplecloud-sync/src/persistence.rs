//! Persistence hooks for lists the manager owns on disk.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use simplecloud_types::CacheValue;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Called by a manager after a change was applied to its list.
#[async_trait]
pub trait PersistenceHook<V: CacheValue>: Send + Sync {
    /// Stores the current state of `value`.
    async fn save(&self, value: &V) -> SyncResult<()>;

    /// Forgets `value`.
    async fn remove(&self, value: &V) -> SyncResult<()>;
}

/// Stores each value as `<key>.json` in one directory.
pub struct JsonDirectoryStore<V> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> V>,
}

impl<V: CacheValue> JsonDirectoryStore<V> {
    /// Opens (and creates, if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> SyncResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            _marker: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads every stored value. Files that fail to parse are skipped.
    pub async fn load_all(&self) -> SyncResult<Vec<V>> {
        let mut values = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<V>(&data) {
                Ok(value) => values.push(value),
                Err(e) => warn!("Skipping unreadable {}: {}", path.display(), e),
            }
        }
        debug!("Loaded {} value(s) from {}", values.len(), self.dir.display());
        Ok(values)
    }

    fn path_for(&self, value: &V) -> SyncResult<PathBuf> {
        let key = value.cache_key().to_string();
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SyncError::Persistence(format!("invalid file name: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl<V: CacheValue> PersistenceHook<V> for JsonDirectoryStore<V> {
    async fn save(&self, value: &V) -> SyncResult<()> {
        let path = self.path_for(value)?;
        let data = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| SyncError::Persistence(format!("{}: {e}", path.display())))
    }

    async fn remove(&self, value: &V) -> SyncResult<()> {
        let path = self.path_for(value)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Persistence(format!("{}: {e}", path.display()))),
        }
    }
}
