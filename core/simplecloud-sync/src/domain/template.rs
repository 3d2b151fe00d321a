use super::applied_locally;
use crate::cache_list::{CacheList, CacheListConfig, ManagedCacheList};
use crate::error::SyncResult;
use crate::events::EventBus;
use crate::executor::UpdateExecutor;
use crate::persistence::PersistenceHook;
use crate::transport::PeerBroadcaster;
use async_trait::async_trait;
use simplecloud_types::{CloudEvent, NameKey, Template};
use std::sync::Arc;

pub const TEMPLATE_CACHE: &str = "template-cache";

#[derive(Debug, Default)]
pub struct TemplateExecutor;

impl UpdateExecutor<Template> for TemplateExecutor {
    fn identification_name(&self) -> &str {
        TEMPLATE_CACHE
    }

    fn determine_events(&self, update: &Template, cached: Option<&Template>) -> Vec<CloudEvent> {
        let template = update.clone();
        match cached {
            None => vec![CloudEvent::TemplateCreated { template }],
            Some(_) => vec![CloudEvent::TemplateUpdated { template }],
        }
    }

    fn removal_events(&self, cached: &Template) -> Vec<CloudEvent> {
        vec![CloudEvent::TemplateDeleted {
            template: cached.clone(),
        }]
    }
}

/// Templates services are assembled from.
pub struct TemplateManager {
    list: CacheList<Template>,
    store: Option<Arc<dyn PersistenceHook<Template>>>,
}

impl TemplateManager {
    pub fn new(
        events: EventBus,
        broadcaster: Arc<dyn PeerBroadcaster>,
        config: CacheListConfig,
    ) -> Self {
        Self {
            list: CacheList::new(Arc::new(TemplateExecutor), events, broadcaster, config),
            store: None,
        }
    }

    /// Persists every applied change through `store`.
    pub fn with_store(mut self, store: Arc<dyn PersistenceHook<Template>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<Template>> {
        self.list.get(&NameKey::new(name))
    }

    /// Deletes the template called `name` and spreads the removal. Does
    /// nothing if no such template exists.
    pub async fn delete_template(&self, name: &str) -> SyncResult<()> {
        match self.get_by_name(name) {
            Some(template) => ManagedCacheList::delete(self, Template::clone(&template), false).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ManagedCacheList for TemplateManager {
    type Value = Template;

    fn list(&self) -> &CacheList<Template> {
        &self.list
    }

    async fn update(&self, value: Template, from_packet: bool) -> SyncResult<()> {
        let guard = self.list.lock_identity(&value).await;
        let result = self.list.update_locked(&guard, value.clone(), from_packet).await;
        if let Some(store) = self.store.as_ref().filter(|_| applied_locally(&result)) {
            store.save(&value).await?;
        }
        result
    }

    async fn delete(&self, value: Template, from_packet: bool) -> SyncResult<()> {
        let guard = self.list.lock_identity(&value).await;
        let result = self.list.delete_locked(&guard, value.clone(), from_packet).await;
        if let Some(store) = self.store.as_ref().filter(|_| applied_locally(&result)) {
            store.remove(&value).await?;
        }
        result
    }
}
