use super::applied_locally;
use super::service::CloudServiceManager;
use crate::cache_list::{CacheList, CacheListConfig, ManagedCacheList};
use crate::error::{SyncError, SyncResult};
use crate::events::EventBus;
use crate::executor::UpdateExecutor;
use crate::persistence::PersistenceHook;
use crate::transport::PeerBroadcaster;
use async_trait::async_trait;
use simplecloud_types::{CloudEvent, NameKey, ServiceGroup, ServiceGroupType};
use std::sync::Arc;
use tracing::warn;

pub const GROUP_CACHE: &str = "group-cache";

#[derive(Debug, Default)]
pub struct ServiceGroupExecutor;

impl UpdateExecutor<ServiceGroup> for ServiceGroupExecutor {
    fn identification_name(&self) -> &str {
        GROUP_CACHE
    }

    fn determine_events(&self, update: &ServiceGroup, cached: Option<&ServiceGroup>) -> Vec<CloudEvent> {
        let group = update.clone();
        match cached {
            None => vec![CloudEvent::GroupCreated { group }],
            Some(_) => vec![CloudEvent::GroupUpdated { group }],
        }
    }

    fn removal_events(&self, cached: &ServiceGroup) -> Vec<CloudEvent> {
        vec![CloudEvent::GroupDeleted {
            group: cached.clone(),
        }]
    }
}

/// Service groups.
///
/// A group cannot be deleted while services of it are registered. On the
/// manager every change is also written to the configured store.
pub struct ServiceGroupManager {
    list: CacheList<ServiceGroup>,
    services: Arc<CloudServiceManager>,
    store: Option<Arc<dyn PersistenceHook<ServiceGroup>>>,
}

impl ServiceGroupManager {
    pub fn new(
        events: EventBus,
        broadcaster: Arc<dyn PeerBroadcaster>,
        config: CacheListConfig,
        services: Arc<CloudServiceManager>,
    ) -> Self {
        Self {
            list: CacheList::new(Arc::new(ServiceGroupExecutor), events, broadcaster, config),
            services,
            store: None,
        }
    }

    /// Persists every applied change through `store`.
    pub fn with_store(mut self, store: Arc<dyn PersistenceHook<ServiceGroup>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<ServiceGroup>> {
        self.list.get(&NameKey::new(name))
    }

    pub fn groups_of_type(&self, group_type: ServiceGroupType) -> Vec<ServiceGroup> {
        self.list.filter(|g| g.group_type == group_type)
    }
}

#[async_trait]
impl ManagedCacheList for ServiceGroupManager {
    type Value = ServiceGroup;

    fn list(&self) -> &CacheList<ServiceGroup> {
        &self.list
    }

    async fn update(&self, value: ServiceGroup, from_packet: bool) -> SyncResult<()> {
        let guard = self.list.lock_identity(&value).await;
        let result = self.list.update_locked(&guard, value.clone(), from_packet).await;
        if let Some(store) = self.store.as_ref().filter(|_| applied_locally(&result)) {
            store.save(&value).await?;
        }
        result
    }

    /// Refuses while services of the group are registered. The check runs
    /// under the group's identity lock but not under the service list's, so
    /// a service registered at the same moment may still slip through.
    async fn delete(&self, value: ServiceGroup, from_packet: bool) -> SyncResult<()> {
        let guard = self.list.lock_identity(&value).await;
        let services = self.services.services_of_group(&value.name).len();
        if services > 0 {
            warn!("Refusing to delete group {} with {} service(s)", value.name, services);
            return Err(SyncError::GroupInUse {
                group: value.name,
                services,
            });
        }

        let result = self.list.delete_locked(&guard, value.clone(), from_packet).await;
        if let Some(store) = self.store.as_ref().filter(|_| applied_locally(&result)) {
            store.remove(&value).await?;
        }
        result
    }
}
