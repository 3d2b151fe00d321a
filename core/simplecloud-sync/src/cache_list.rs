//! The replicated cache list.

use crate::error::{SyncError, SyncResult};
use crate::events::{EventBus, EventEnvelope};
use crate::executor::UpdateExecutor;
use crate::protocol::{CacheUpdateMessage, SyncAction, SyncMessage};
use crate::store::{CacheStore, IdentityGuard, IdentityLocks, Snapshot};
use crate::transport::PeerBroadcaster;
use async_trait::async_trait;
use simplecloud_types::{CacheValue, CloudEvent, Updater};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Behaviour switches for one [`CacheList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheListConfig {
    /// Whether local changes are broadcast to peers.
    pub spread_updates: bool,
    /// Upper bound for one broadcast round.
    pub broadcast_timeout: Duration,
}

impl Default for CacheListConfig {
    fn default() -> Self {
        Self {
            spread_updates: true,
            broadcast_timeout: Duration::from_secs(5),
        }
    }
}

/// A named, replicated list of values of one type.
///
/// At most one operation per identity runs at a time; operations on
/// different identities run concurrently. The lock for an identity is held
/// across store mutation, event publication and the broadcast, so changes to
/// one object leave this node in the order they were made.
pub struct CacheList<V: CacheValue> {
    executor: Arc<dyn UpdateExecutor<V>>,
    store: CacheStore<V>,
    locks: IdentityLocks<V::Key>,
    events: EventBus,
    broadcaster: Arc<dyn PeerBroadcaster>,
    config: CacheListConfig,
}

impl<V: CacheValue> CacheList<V> {
    pub fn new(
        executor: Arc<dyn UpdateExecutor<V>>,
        events: EventBus,
        broadcaster: Arc<dyn PeerBroadcaster>,
        config: CacheListConfig,
    ) -> Self {
        Self {
            executor,
            store: CacheStore::new(),
            locks: IdentityLocks::new(),
            events,
            broadcaster,
            config,
        }
    }

    /// Registry name of this list.
    pub fn name(&self) -> &str {
        self.executor.identification_name()
    }

    /// Whether local changes are broadcast to peers.
    pub fn shall_spread_updates(&self) -> bool {
        self.config.spread_updates
    }

    /// Inserts or replaces `value`.
    ///
    /// With `from_packet == false` the new value is broadcast to all peers
    /// after it was applied, if this list spreads updates. A failed broadcast
    /// is reported as an error but the local change stays applied.
    ///
    /// A value that cannot be encoded is rejected before anything changes.
    pub async fn update(&self, value: V, from_packet: bool) -> SyncResult<()> {
        let guard = self.lock_identity(&value).await;
        self.update_locked(&guard, value, from_packet).await
    }

    /// Waits until no other operation on the identity of `value` is in
    /// flight and holds it until the guard is dropped.
    pub(crate) async fn lock_identity(&self, value: &V) -> IdentityGuard<V::Key> {
        self.locks.acquire(self.executor.identify(value)).await
    }

    /// [`update`](Self::update) for a caller that already holds the identity.
    pub(crate) async fn update_locked(
        &self,
        guard: &IdentityGuard<V::Key>,
        value: V,
        from_packet: bool,
    ) -> SyncResult<()> {
        self.apply_update(guard.key().clone(), value, from_packet, false)
            .await
    }

    /// Merges `updater` against its baseline and applies the result as a
    /// local update.
    pub async fn apply<U>(&self, updater: &U) -> SyncResult<()>
    where
        U: Updater<Value = V> + ?Sized,
    {
        self.update(updater.merge(), false).await
    }

    /// Removes the object identified by `value`.
    ///
    /// The cached copy is first brought to the state of `value`, so removal
    /// listeners and peers see the final state. Deleting an object that is
    /// not cached does nothing.
    ///
    /// Events of that final update carry the caller's `from_packet`, so a
    /// local delete publishes its final-state event with `from_packet ==
    /// false` before the removal event.
    pub async fn delete(&self, value: V, from_packet: bool) -> SyncResult<()> {
        let guard = self.lock_identity(&value).await;
        self.delete_locked(&guard, value, from_packet).await
    }

    /// [`delete`](Self::delete) for a caller that already holds the identity.
    pub(crate) async fn delete_locked(
        &self,
        guard: &IdentityGuard<V::Key>,
        value: V,
        from_packet: bool,
    ) -> SyncResult<()> {
        let key = guard.key().clone();

        if self.store.get(&key).is_none() {
            debug!("Delete of uncached {} {} ignored", self.name(), key);
            return Ok(());
        }

        // Encode both packets first so a bad value never half-applies.
        let outbound = if self.config.spread_updates && !from_packet {
            Some((
                self.encode(&value, SyncAction::Update)?,
                self.encode(&value, SyncAction::Delete)?,
            ))
        } else {
            None
        };

        self.apply_update(key.clone(), value, from_packet, true)
            .await?;

        let events = match self.store.remove(&key) {
            Some(removed) => self.executor.removal_events(&removed),
            None => Vec::new(),
        };
        debug!("Removed {} from {}", key, self.name());
        self.publish(events, from_packet);

        if let Some((final_state, removal)) = outbound {
            self.broadcast(final_state).await?;
            self.broadcast(removal).await?;
        }
        Ok(())
    }

    /// Returns the current contents. The snapshot is unaffected by later
    /// changes.
    pub fn get_all_cached_objects(&self) -> Snapshot<V> {
        self.store.snapshot()
    }

    /// Returns the cached object with the same identity as `value`.
    pub fn get_cached_object_by_update_value(&self, value: &V) -> Option<Arc<V>> {
        self.store.get(&self.executor.identify(value))
    }

    /// Returns the object cached under `key`.
    pub fn get(&self, key: &V::Key) -> Option<Arc<V>> {
        self.store.get(key)
    }

    /// Returns the first cached object matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&V) -> bool) -> Option<V> {
        self.store.snapshot().iter().find(|v| predicate(v)).cloned()
    }

    /// Returns all cached objects matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&V) -> bool) -> Vec<V> {
        self.store
            .snapshot()
            .iter()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Encodes every cached object as an `UPDATE` packet, in list order.
    pub fn snapshot_messages(&self) -> SyncResult<Vec<CacheUpdateMessage>> {
        self.store
            .snapshot()
            .iter()
            .map(|v| self.encode(v, SyncAction::Update))
            .collect()
    }

    /// Body of an update. The identity lock for `key` must be held.
    async fn apply_update(
        &self,
        key: V::Key,
        value: V,
        from_packet: bool,
        from_delete: bool,
    ) -> SyncResult<()> {
        let outbound = if self.config.spread_updates && !from_packet && !from_delete {
            Some(self.encode(&value, SyncAction::Update)?)
        } else {
            None
        };

        let cached = self.store.get(&key);
        let events = self
            .executor
            .determine_events(&value, cached.as_deref());

        if cached.is_some() {
            self.store.replace(&key, value);
            trace!("Replaced {} in {}", key, self.name());
        } else {
            self.executor.add_new_value(&self.store, key.clone(), value);
            trace!("Added {} to {}", key, self.name());
        }

        self.publish(events, from_packet);

        if let Some(message) = outbound {
            self.broadcast(message).await?;
        }
        Ok(())
    }

    fn encode(&self, value: &V, action: SyncAction) -> SyncResult<CacheUpdateMessage> {
        CacheUpdateMessage::encode(self.name(), value, action)
    }

    fn publish(&self, events: Vec<CloudEvent>, from_packet: bool) {
        for event in events {
            self.events.publish(EventEnvelope {
                list_name: self.name().to_string(),
                from_packet,
                event,
            });
        }
    }

    async fn broadcast(&self, message: CacheUpdateMessage) -> SyncResult<()> {
        let action = message.action;
        let sent = tokio::time::timeout(
            self.config.broadcast_timeout,
            self.broadcaster
                .send_to_all_peers(&SyncMessage::CacheUpdate(message)),
        )
        .await;

        match sent {
            Ok(Ok(report)) => {
                trace!(
                    "Broadcast {:?} for {} reached {}/{} peer(s)",
                    action,
                    self.name(),
                    report.delivered,
                    report.total
                );
                report.into_result()
            }
            Ok(Err(e)) => {
                warn!("Broadcast {:?} for {} failed: {}", action, self.name(), e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Broadcast {:?} for {} timed out after {:?}",
                    action,
                    self.name(),
                    self.config.broadcast_timeout
                );
                Err(SyncError::Timeout)
            }
        }
    }
}

/// A component that owns a [`CacheList`] and may add behaviour around its
/// mutations, such as persistence or guards.
///
/// Received packets are dispatched through this trait, so overrides apply to
/// remote changes as well.
#[async_trait]
pub trait ManagedCacheList: Send + Sync + 'static {
    type Value: CacheValue;

    /// The wrapped list.
    fn list(&self) -> &CacheList<Self::Value>;

    async fn update(&self, value: Self::Value, from_packet: bool) -> SyncResult<()> {
        self.list().update(value, from_packet).await
    }

    async fn delete(&self, value: Self::Value, from_packet: bool) -> SyncResult<()> {
        self.list().delete(value, from_packet).await
    }
}

#[async_trait]
impl<V: CacheValue> ManagedCacheList for CacheList<V> {
    type Value = V;

    fn list(&self) -> &CacheList<V> {
        self
    }
}

/// Type-erased view of a managed cache list, as stored in the registry.
#[async_trait]
pub trait ErasedCacheList: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Wire discriminator of the values this list holds.
    fn value_type(&self) -> &'static str;

    fn len(&self) -> usize;

    fn shall_spread_updates(&self) -> bool;

    /// Applies a decoded value received from a peer.
    ///
    /// `value` must be a boxed `Self::Value` as produced by the
    /// [`ValueTypeRegistry`](crate::ValueTypeRegistry).
    async fn apply_remote(&self, action: SyncAction, value: Box<dyn Any + Send>) -> SyncResult<()>;

    /// Encodes every cached object as an `UPDATE` packet.
    fn snapshot_messages(&self) -> SyncResult<Vec<CacheUpdateMessage>>;
}

#[async_trait]
impl<T: ManagedCacheList> ErasedCacheList for T {
    fn name(&self) -> &str {
        self.list().name()
    }

    fn value_type(&self) -> &'static str {
        T::Value::TYPE_NAME
    }

    fn len(&self) -> usize {
        self.list().len()
    }

    fn shall_spread_updates(&self) -> bool {
        self.list().shall_spread_updates()
    }

    async fn apply_remote(&self, action: SyncAction, value: Box<dyn Any + Send>) -> SyncResult<()> {
        let value = value
            .downcast::<T::Value>()
            .map_err(|_| SyncError::TypeMismatch {
                list: self.list().name().to_string(),
                expected: T::Value::TYPE_NAME,
                got: "another type".to_string(),
            })?;
        match action {
            SyncAction::Update => ManagedCacheList::update(self, *value, true).await,
            SyncAction::Delete => ManagedCacheList::delete(self, *value, true).await,
        }
    }

    fn snapshot_messages(&self) -> SyncResult<Vec<CacheUpdateMessage>> {
        self.list().snapshot_messages()
    }
}
