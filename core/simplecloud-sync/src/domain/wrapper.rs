use crate::cache_list::{CacheList, CacheListConfig, ManagedCacheList};
use crate::events::EventBus;
use crate::executor::UpdateExecutor;
use crate::transport::PeerBroadcaster;
use simplecloud_types::{CloudEvent, NameKey, Wrapper};
use std::sync::Arc;

pub const WRAPPER_CACHE: &str = "wrapper-cache";

#[derive(Debug, Default)]
pub struct WrapperExecutor;

impl UpdateExecutor<Wrapper> for WrapperExecutor {
    fn identification_name(&self) -> &str {
        WRAPPER_CACHE
    }

    fn determine_events(&self, update: &Wrapper, cached: Option<&Wrapper>) -> Vec<CloudEvent> {
        let wrapper = update.clone();
        match cached {
            None => vec![CloudEvent::WrapperRegistered { wrapper }],
            Some(_) => vec![CloudEvent::WrapperUpdated { wrapper }],
        }
    }

    fn removal_events(&self, cached: &Wrapper) -> Vec<CloudEvent> {
        vec![CloudEvent::WrapperUnregistered {
            wrapper: cached.clone(),
        }]
    }
}

/// Wrappers known to the cloud.
pub struct WrapperManager {
    list: CacheList<Wrapper>,
}

impl WrapperManager {
    pub fn new(
        events: EventBus,
        broadcaster: Arc<dyn PeerBroadcaster>,
        config: CacheListConfig,
    ) -> Self {
        Self {
            list: CacheList::new(Arc::new(WrapperExecutor), events, broadcaster, config),
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<Wrapper>> {
        self.list.get(&NameKey::new(name))
    }

    /// Wrappers that completed their login.
    pub fn authenticated_wrappers(&self) -> Vec<Wrapper> {
        self.list.filter(|w| w.authenticated)
    }
}

impl ManagedCacheList for WrapperManager {
    type Value = Wrapper;

    fn list(&self) -> &CacheList<Wrapper> {
        &self.list
    }
}
