use crate::cache_list::{CacheList, CacheListConfig, ManagedCacheList};
use crate::events::EventBus;
use crate::executor::UpdateExecutor;
use crate::transport::PeerBroadcaster;
use simplecloud_types::{CloudEvent, CloudService, NameKey};
use std::sync::Arc;

pub const SERVICE_CACHE: &str = "service-cache";

/// Event rules for services: state changes and the plugin connecting back
/// get their own events next to `ServiceUpdated`.
#[derive(Debug, Default)]
pub struct CloudServiceExecutor;

impl UpdateExecutor<CloudService> for CloudServiceExecutor {
    fn identification_name(&self) -> &str {
        SERVICE_CACHE
    }

    fn determine_events(&self, update: &CloudService, cached: Option<&CloudService>) -> Vec<CloudEvent> {
        let Some(cached) = cached else {
            return vec![CloudEvent::ServiceRegistered {
                service: update.clone(),
            }];
        };

        let mut events = vec![CloudEvent::ServiceUpdated {
            service: update.clone(),
        }];
        if cached.state != update.state {
            events.push(CloudEvent::ServiceStateChanged {
                service: update.clone(),
                from: cached.state,
                to: update.state,
            });
        }
        if !cached.authenticated && update.authenticated {
            events.push(CloudEvent::ServiceConnected {
                service: update.clone(),
            });
        }
        events
    }

    fn removal_events(&self, cached: &CloudService) -> Vec<CloudEvent> {
        vec![CloudEvent::ServiceUnregistered {
            service: cached.clone(),
        }]
    }
}

/// Registered services of all groups.
pub struct CloudServiceManager {
    list: CacheList<CloudService>,
}

impl CloudServiceManager {
    pub fn new(
        events: EventBus,
        broadcaster: Arc<dyn PeerBroadcaster>,
        config: CacheListConfig,
    ) -> Self {
        Self {
            list: CacheList::new(Arc::new(CloudServiceExecutor), events, broadcaster, config),
        }
    }

    /// Looks up a service by its full name (e.g. `Lobby-1`).
    pub fn get_by_name(&self, name: &str) -> Option<Arc<CloudService>> {
        self.list.get(&NameKey::new(name))
    }

    pub fn services_of_group(&self, group: &str) -> Vec<CloudService> {
        self.list.filter(|s| s.group_name.eq_ignore_ascii_case(group))
    }

    pub fn services_on_wrapper(&self, wrapper: &str) -> Vec<CloudService> {
        self.list.filter(|s| {
            s.wrapper_name
                .as_deref()
                .is_some_and(|w| w.eq_ignore_ascii_case(wrapper))
        })
    }
}

impl ManagedCacheList for CloudServiceManager {
    type Value = CloudService;

    fn list(&self) -> &CacheList<CloudService> {
        &self.list
    }
}
